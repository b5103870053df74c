use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::config::EngineConfig;
use crate::input::roles::detect_role;
use crate::input::{InputError, RunInput};
use crate::model::thresholds::{Scale, Strategy};
use crate::model::trace::{SampleMeta, Trace, plate_order_key};

#[derive(Debug, Error)]
pub enum Stage1Error {
    #[error("input error: {0}")]
    Input(#[from] InputError),
    #[error("run has no wells")]
    EmptyRun,
    #[error("duplicate well entry: {well}/{channel}")]
    DuplicateWell { well: String, channel: String },
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
    #[error("fixed strategy {strategy} requested but test code {test_code} is not in the pathogen library")]
    MissingProfile {
        strategy: &'static str,
        test_code: String,
    },
}

impl Stage1Error {
    pub fn code(&self) -> &'static str {
        match self {
            Stage1Error::Input(e) => e.code(),
            Stage1Error::MissingProfile { .. } => "THRESHOLD_NO_FIXED",
            _ => "INPUT_MALFORMED",
        }
    }
}

/// Validated, deterministically ordered view of one run. Traces and meta
/// are parallel vectors, sorted by plate coordinate then channel.
#[derive(Debug, Clone)]
pub struct RunCtx {
    pub run_id: String,
    pub traces: Vec<Trace>,
    pub meta: Vec<SampleMeta>,
    pub strategy: Strategy,
    pub scale: Scale,
    pub manual_overrides: BTreeMap<String, f64>,
    pub channels: Vec<String>,
    pub test_codes: Vec<String>,
    pub n_wells: usize,
}

impl RunCtx {
    /// Indices of wells on the given channel, in run order.
    pub fn channel_wells(&self, channel: &str) -> Vec<usize> {
        self.meta
            .iter()
            .enumerate()
            .filter(|(_, m)| m.channel == channel)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn find_well(&self, well_id: &str, channel: &str) -> Option<usize> {
        self.meta
            .iter()
            .position(|m| m.well_id == well_id && m.channel == channel)
    }

    /// Deterministic pathogen assignment for a channel: the alphabetically
    /// first test code among its wells.
    pub fn channel_test_code(&self, channel: &str) -> Option<&str> {
        self.meta
            .iter()
            .filter(|m| m.channel == channel)
            .map(|m| m.test_code.as_str())
            .min()
    }
}

pub fn run_stage1_load(input: RunInput, config: &EngineConfig) -> Result<RunCtx, Stage1Error> {
    if input.wells.is_empty() {
        return Err(Stage1Error::EmptyRun);
    }

    let strategy = Strategy::from_str(&input.strategy_selection.strategy_id)
        .ok_or_else(|| Stage1Error::UnknownStrategy(input.strategy_selection.strategy_id.clone()))?;
    let scale = Scale::from_str(&input.strategy_selection.scale)
        .ok_or_else(|| Stage1Error::UnknownScale(input.strategy_selection.scale.clone()))?;
    // Fixed strategies pin their own scale regardless of the selection.
    let scale = match strategy {
        Strategy::LinearFixed => Scale::Linear,
        Strategy::LogFixed => Scale::Log,
        _ => scale,
    };

    let mut entries: Vec<(Trace, SampleMeta)> = Vec::with_capacity(input.wells.len());
    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();

    for well in input.wells {
        let key = (well.well_id.clone(), well.channel.clone());
        if !seen.insert(key) {
            return Err(Stage1Error::DuplicateWell {
                well: well.well_id,
                channel: well.channel,
            });
        }
        validate_well(&well)?;

        let role = detect_role(&well.sample_name);
        let meta = SampleMeta {
            well_id: well.well_id.clone(),
            channel: well.channel.clone(),
            sample_name: well.sample_name,
            test_code: well.test_code,
            role,
        };
        let trace = Trace {
            well_id: well.well_id,
            channel: well.channel,
            cycles: well.cycles,
            rfu: well.rfu,
        };
        entries.push((trace, meta));
    }

    entries.sort_by(|a, b| {
        let ka = (plate_order_key(&a.0.well_id), a.0.channel.clone());
        let kb = (plate_order_key(&b.0.well_id), b.0.channel.clone());
        ka.cmp(&kb)
    });

    let channels: Vec<String> = entries
        .iter()
        .map(|(t, _)| t.channel.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let test_codes: Vec<String> = entries
        .iter()
        .map(|(_, m)| m.test_code.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    // A fixed strategy without a resolvable profile is fatal for the run.
    if strategy.is_fixed() {
        for code in &test_codes {
            if config.pathogens.get(code).is_none() {
                return Err(Stage1Error::MissingProfile {
                    strategy: strategy.as_str(),
                    test_code: code.clone(),
                });
            }
        }
    }

    let (traces, meta): (Vec<Trace>, Vec<SampleMeta>) = entries.into_iter().unzip();
    let n_wells = traces.len();

    Ok(RunCtx {
        run_id: input.run_id,
        traces,
        meta,
        strategy,
        scale,
        manual_overrides: input
            .strategy_selection
            .manual_overrides
            .unwrap_or_default(),
        channels,
        test_codes,
        n_wells,
    })
}

fn validate_well(well: &crate::input::WellInput) -> Result<(), Stage1Error> {
    let malformed = |reason: &str| Stage1Error::MalformedWell {
        well: well.well_id.clone(),
        channel: well.channel.clone(),
        reason: reason.to_string(),
    };

    if well.well_id.is_empty() {
        return Err(malformed("empty well_id"));
    }
    if well.channel.is_empty() {
        return Err(malformed("empty channel"));
    }
    if well.test_code.is_empty() {
        return Err(malformed("empty test_code"));
    }
    if well.cycles.is_empty() {
        return Err(malformed("empty cycles"));
    }
    if well.cycles.len() != well.rfu.len() {
        return Err(malformed("cycles and rfu length mismatch"));
    }
    if well.cycles.windows(2).any(|w| w[1] <= w[0]) {
        return Err(malformed("cycles not strictly increasing"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_load.rs"]
mod tests;
