use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, parse_toml};

/// Known concentration point for one control level. `cq` is optional: when
/// absent the run's own control wells anchor the standard curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub concentration: f64,
    #[serde(default)]
    pub cq: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlLevels {
    #[serde(default)]
    pub h: Option<ControlPoint>,
    #[serde(default)]
    pub m: Option<ControlPoint>,
    #[serde(default)]
    pub l: Option<ControlPoint>,
}

impl ControlLevels {
    pub fn by_role_letter(&self, letter: char) -> Option<ControlPoint> {
        match letter {
            'H' => self.h,
            'M' => self.m,
            'L' => self.l,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfile {
    pub target: String,
    #[serde(default)]
    pub expected_range: Option<f64>,
    #[serde(default)]
    pub controls: ControlLevels,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathogenProfile {
    pub test_code: String,
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelProfile>,
}

impl PathogenProfile {
    pub fn channel(&self, channel: &str) -> Option<&ChannelProfile> {
        self.channels.get(channel)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathogenLibrary {
    pub by_code: BTreeMap<String, PathogenProfile>,
}

impl PathogenLibrary {
    pub fn get(&self, test_code: &str) -> Option<&PathogenProfile> {
        self.by_code.get(test_code)
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

#[derive(Deserialize)]
struct LibraryFile {
    #[serde(default)]
    pathogen: Vec<PathogenProfile>,
}

pub fn load_library(path: &Path) -> Result<PathogenLibrary, ConfigError> {
    let parsed: LibraryFile = parse_toml(path)?;
    if parsed.pathogen.is_empty() {
        return Err(ConfigError::EmptyLibrary(
            path.to_string_lossy().to_string(),
        ));
    }

    let mut by_code = BTreeMap::new();
    for profile in parsed.pathogen {
        if profile.test_code.is_empty() {
            return Err(ConfigError::InvalidProfile {
                code: "<missing>".to_string(),
                reason: "empty test_code".to_string(),
            });
        }
        for (channel, ch) in &profile.channels {
            for (letter, point) in [('H', ch.controls.h), ('M', ch.controls.m), ('L', ch.controls.l)]
            {
                if let Some(p) = point
                    && p.concentration <= 0.0
                {
                    return Err(ConfigError::InvalidProfile {
                        code: profile.test_code.clone(),
                        reason: format!(
                            "channel {channel} control {letter} has non-positive concentration"
                        ),
                    });
                }
            }
        }
        by_code.insert(profile.test_code.clone(), profile);
    }

    Ok(PathogenLibrary { by_code })
}

#[cfg(test)]
#[path = "../../tests/src_inline/config/pathogens.rs"]
mod tests;
