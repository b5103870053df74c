use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, parse_toml};
use crate::model::thresholds::Scale;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleValues {
    #[serde(default)]
    pub linear: Option<f64>,
    #[serde(default)]
    pub log: Option<f64>,
}

impl ScaleValues {
    fn get(&self, scale: Scale) -> Option<f64> {
        match scale {
            Scale::Linear => self.linear,
            Scale::Log => self.log,
        }
    }
}

/// `pathogen -> channel -> scale -> threshold`, with a `"default"` channel
/// fallback per pathogen. This is the only sanctioned fallthrough in the
/// configuration layer.
#[derive(Debug, Clone, Default)]
pub struct FixedThresholds {
    table: BTreeMap<String, BTreeMap<String, ScaleValues>>,
}

pub const DEFAULT_CHANNEL: &str = "default";

impl FixedThresholds {
    pub fn lookup(&self, pathogen: &str, channel: &str, scale: Scale) -> Option<f64> {
        let channels = self.table.get(pathogen)?;
        if let Some(v) = channels.get(channel).and_then(|sv| sv.get(scale)) {
            return Some(v);
        }
        channels.get(DEFAULT_CHANNEL).and_then(|sv| sv.get(scale))
    }

    pub fn pathogens(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(|k| k.as_str())
    }

    #[cfg(test)]
    pub fn insert(&mut self, pathogen: &str, channel: &str, values: ScaleValues) {
        self.table
            .entry(pathogen.to_string())
            .or_default()
            .insert(channel.to_string(), values);
    }
}

pub fn load_table(path: &Path) -> Result<FixedThresholds, ConfigError> {
    let table: BTreeMap<String, BTreeMap<String, ScaleValues>> = parse_toml(path)?;
    Ok(FixedThresholds { table })
}

#[cfg(test)]
#[path = "../../tests/src_inline/config/fixed.rs"]
mod tests;
