pub mod roles;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("missing required file: {0}")]
    MissingFile(String),
    #[error("run input parse error: {0}")]
    Parse(String),
    #[error("well {well}/{channel}: {reason}")]
    MalformedWell {
        well: String,
        channel: String,
        reason: String,
    },
    #[error("unknown strategy id: {0}")]
    UnknownStrategy(String),
    #[error("unknown scale: {0}")]
    UnknownScale(String),
    #[error("run has no wells")]
    EmptyRun,
    #[error("unsupported gzip input without feature enabled: {0}")]
    GzipNotEnabled(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl InputError {
    /// Stable identifier surfaced to callers.
    pub fn code(&self) -> &'static str {
        match self {
            InputError::Io(_) | InputError::MissingFile(_) | InputError::GzipNotEnabled(_) => {
                "INTERNAL"
            }
            _ => "INPUT_MALFORMED",
        }
    }
}

/// One well/channel trace as exported by the ingestion layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellInput {
    pub well_id: String,
    pub channel: String,
    pub cycles: Vec<u32>,
    pub rfu: Vec<f64>,
    pub sample_name: String,
    pub test_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySelection {
    pub strategy_id: String,
    pub scale: String,
    #[serde(default)]
    pub manual_overrides: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInput {
    pub run_id: String,
    pub wells: Vec<WellInput>,
    pub strategy_selection: StrategySelection,
}

pub fn open_reader(path: &Path) -> Result<Box<dyn io::BufRead>, InputError> {
    let file = std::fs::File::open(path)?;
    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        #[cfg(feature = "gz")]
        {
            let decoder = flate2::read::GzDecoder::new(file);
            return Ok(Box::new(io::BufReader::new(decoder)));
        }
        #[cfg(not(feature = "gz"))]
        {
            return Err(InputError::GzipNotEnabled(path.to_path_buf()));
        }
    }
    Ok(Box::new(io::BufReader::new(file)))
}

pub fn read_run_input(path: &Path) -> Result<RunInput, InputError> {
    if !path.is_file() {
        return Err(InputError::MissingFile(path.to_string_lossy().to_string()));
    }
    let reader = open_reader(path)?;
    serde_json::from_reader(reader).map_err(|e| InputError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/mod.rs"]
mod tests;
