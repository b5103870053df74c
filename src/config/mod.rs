pub mod fixed;
pub mod ml;
pub mod pathogens;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::fixed::FixedThresholds;
use crate::config::ml::MlSettings;
use crate::config::pathogens::PathogenLibrary;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error in {file}: {source}")]
    Toml {
        file: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("no pathogens defined in {0}")]
    EmptyLibrary(String),
    #[error("pathogen {code}: {reason}")]
    InvalidProfile { code: String, reason: String },
}

/// Configuration blobs the engine resolves test codes against: the pathogen
/// library, the fixed-threshold table, and the ML enablement settings.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub pathogens: PathogenLibrary,
    pub fixed: FixedThresholds,
    pub ml: MlSettings,
}

impl EngineConfig {
    pub fn load_from_dir(dir: &Path) -> Result<EngineConfig, ConfigError> {
        let pathogens = pathogens::load_library(&dir.join("pathogens.toml"))?;
        let fixed = fixed::load_table(&dir.join("fixed_thresholds.toml"))?;
        let ml = ml::load_settings(&dir.join("ml.toml"))?;
        Ok(EngineConfig {
            pathogens,
            fixed,
            ml,
        })
    }
}

pub(crate) fn parse_toml<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text).map_err(|source| ConfigError::Toml {
        file: path.to_string_lossy().to_string(),
        source,
    })
}

pub fn default_config_dir() -> PathBuf {
    let relative = Path::new("assets").join("config");
    if relative.is_dir() {
        return relative;
    }

    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join("config");
    if manifest.is_dir() {
        return manifest;
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let sibling = dir.join("assets").join("config");
        if sibling.is_dir() {
            return sibling;
        }
        let parent = dir.join("..").join("assets").join("config");
        if parent.is_dir() {
            return parent;
        }
    }

    relative
}
