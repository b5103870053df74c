use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Linear,
    Log,
}

impl Scale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Linear => "linear",
            Scale::Log => "log",
        }
    }

    pub fn from_str(s: &str) -> Option<Scale> {
        match s {
            "linear" => Some(Scale::Linear),
            "log" => Some(Scale::Log),
            _ => None,
        }
    }
}

/// Closed set of threshold-selection policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    LinearStddev,
    LinearExpPhase,
    LinearFixed,
    LogFixed,
    Manual,
    Auto,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::LinearStddev => "linear_stddev",
            Strategy::LinearExpPhase => "linear_exp_phase",
            Strategy::LinearFixed => "linear_fixed",
            Strategy::LogFixed => "log_fixed",
            Strategy::Manual => "manual",
            Strategy::Auto => "auto",
        }
    }

    pub fn from_str(s: &str) -> Option<Strategy> {
        match s {
            "linear_stddev" => Some(Strategy::LinearStddev),
            "linear_exp_phase" => Some(Strategy::LinearExpPhase),
            "linear_fixed" => Some(Strategy::LinearFixed),
            "log_fixed" => Some(Strategy::LogFixed),
            "manual" => Some(Strategy::Manual),
            "auto" => Some(Strategy::Auto),
            _ => None,
        }
    }

    /// Fixed strategies resolve against the pathogen fixed-threshold table
    /// and fail with THRESHOLD_NO_FIXED when no entry exists.
    pub fn is_fixed(&self) -> bool {
        matches!(self, Strategy::LinearFixed | Strategy::LogFixed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    Computed { fallback: bool },
    FixedLookup,
    Manual,
}

impl ThresholdSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdSource::Computed { fallback: false } => "computed",
            ThresholdSource::Computed { fallback: true } => "computed_fallback",
            ThresholdSource::FixedLookup => "fixed_lookup",
            ThresholdSource::Manual => "manual",
        }
    }
}

/// One stored threshold per (channel, scale) per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelThreshold {
    pub channel: String,
    pub scale: Scale,
    pub value: f64,
    pub strategy: Strategy,
    pub source: ThresholdSource,
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/thresholds.rs"]
mod tests;
