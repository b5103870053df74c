pub mod forest;
pub mod registry;
pub mod training;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MlError {
    #[error("ml disabled for {pathogen}/{channel}")]
    Disabled { pathogen: String, channel: String },
    #[error("insufficient training data: {count} examples, need {needed}")]
    InsufficientTraining { count: usize, needed: usize },
    #[error("no model trained for {0}")]
    ModelMissing(String),
    #[error("training failed: {0}")]
    Train(String),
    #[error("model store corrupt: {0}")]
    Corrupt(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MlError {
    pub fn code(&self) -> &'static str {
        match self {
            MlError::Disabled { .. } => "ML_DISABLED",
            MlError::InsufficientTraining { .. } | MlError::ModelMissing(_) => {
                "ML_INSUFFICIENT_TRAINING"
            }
            _ => "INTERNAL",
        }
    }
}
