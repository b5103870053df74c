use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, parse_toml};

/// Hard floor below which predictions are never honored, regardless of the
/// configured `min_training_examples`.
pub const PREDICTION_TRAINING_FLOOR: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlChannelRule {
    pub pathogen: String,
    pub channel: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default)]
    pub training_locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlSettings {
    #[serde(default = "default_true")]
    pub global_enabled: bool,
    #[serde(default = "default_min_training")]
    pub min_training_examples: usize,
    #[serde(default = "default_true")]
    pub auto_training_enabled: bool,
    #[serde(default = "default_true")]
    pub reset_protection_enabled: bool,
    #[serde(default, rename = "rule")]
    pub rules: Vec<MlChannelRule>,
}

impl Default for MlSettings {
    fn default() -> Self {
        Self {
            global_enabled: true,
            min_training_examples: 10,
            auto_training_enabled: true,
            reset_protection_enabled: true,
            rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveMl {
    pub enabled: bool,
    pub min_confidence: f64,
    pub training_locked: bool,
}

impl MlSettings {
    /// Resolve the effective policy for one (pathogen, channel). A channel
    /// without an explicit rule inherits the global switch with the default
    /// confidence floor; `global_enabled = false` disables everything.
    pub fn effective(&self, pathogen: &str, channel: &str) -> EffectiveMl {
        let rule = self
            .rules
            .iter()
            .find(|r| r.pathogen == pathogen && r.channel == channel);
        let (enabled, min_confidence, training_locked) = match rule {
            Some(r) => (r.enabled, r.min_confidence, r.training_locked),
            None => (true, default_min_confidence(), false),
        };
        EffectiveMl {
            enabled: self.global_enabled && enabled,
            min_confidence,
            training_locked,
        }
    }

    /// Minimum sample count before predictions are honored.
    pub fn prediction_gate(&self) -> usize {
        self.min_training_examples.max(PREDICTION_TRAINING_FLOOR)
    }
}

fn default_true() -> bool {
    true
}

fn default_min_confidence() -> f64 {
    0.7
}

fn default_min_training() -> usize {
    10
}

pub fn load_settings(path: &Path) -> Result<MlSettings, ConfigError> {
    if !path.exists() {
        return Ok(MlSettings::default());
    }
    parse_toml(path)
}

#[cfg(test)]
#[path = "../../tests/src_inline/config/ml.rs"]
mod tests;
