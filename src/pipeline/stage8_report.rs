use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::classes::{Classification, Summary3, WellClass};
use crate::model::fit::FitResult;
use crate::model::thresholds::ChannelThreshold;
use crate::pipeline::stage1_load::RunCtx;
use crate::pipeline::stage2_fit::FitContext;
use crate::pipeline::stage3_anomalies::AnomalyContext;
use crate::pipeline::stage4_thresholds::ThresholdContext;
use crate::pipeline::stage5_quant::QuantContext;
use crate::pipeline::stage6_features::FeaturesContext;
use crate::pipeline::stage7_classify::ClassifyContext;

pub const SCHEMA_VERSION: u32 = 1;

/// Flattened classification block in the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOut {
    pub class_7: String,
    pub summary_3: String,
    pub method: String,
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    pub reason: String,
}

impl ClassificationOut {
    pub fn from_classification(c: &Classification) -> Self {
        Self {
            class_7: c.class().as_str().to_string(),
            summary_3: c.summary().as_str().to_string(),
            method: c.method_str().to_string(),
            confidence: c.confidence(),
            model_version: c.model_version().map(|v| v.to_string()),
            reason: c.reason().to_string(),
        }
    }

    /// Rebuild the sum type from the wire form; used when a stored run is
    /// reloaded so expert labels survive the round trip.
    pub fn to_classification(&self) -> Option<Classification> {
        let class = WellClass::from_str(&self.class_7)?;
        let summary = match self.summary_3.as_str() {
            "POS" => Summary3::Pos,
            "NEG" => Summary3::Neg,
            "REDO" => Summary3::Redo,
            _ => return None,
        };
        Some(match self.method.as_str() {
            "expert" => Classification::Expert {
                class,
                summary,
                reason: self.reason.clone(),
            },
            "ml" => Classification::Ml {
                class,
                summary,
                confidence: self.confidence.unwrap_or(0.0),
                model_version: self.model_version.clone().unwrap_or_default(),
                reason: self.reason.clone(),
            },
            _ => Classification::Rule {
                class,
                summary,
                score: 0.0,
                reason: self.reason.clone(),
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellResult {
    pub well_id: String,
    pub channel: String,
    pub sample_name: String,
    pub role: String,
    pub test_code: String,
    pub fit: FitResult,
    pub anomalies: Vec<String>,
    pub features_30: Vec<f64>,
    pub threshold: Option<ChannelThreshold>,
    pub cqj: Option<f64>,
    pub calcj: Option<f64>,
    pub classification: ClassificationOut,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub schema_version: u32,
    pub run_id: String,
    pub strategy: String,
    pub scale: String,
    pub thresholds: Vec<ChannelThreshold>,
    pub channel_errors: BTreeMap<String, String>,
    pub wells: Vec<WellResult>,
}

impl RunResult {
    pub fn class_counts(&self) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for class in WellClass::ordered() {
            counts.insert(class.as_str().to_string(), 0);
        }
        for well in &self.wells {
            *counts
                .entry(well.classification.class_7.clone())
                .or_insert(0) += 1;
        }
        counts
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run_stage8_report(
    ctx: &RunCtx,
    fits: &FitContext,
    anomalies: &AnomalyContext,
    thresholds: &ThresholdContext,
    quants: &QuantContext,
    features: &FeaturesContext,
    classify: &ClassifyContext,
) -> RunResult {
    let mut wells = Vec::with_capacity(ctx.n_wells);
    for idx in 0..ctx.n_wells {
        let meta = &ctx.meta[idx];
        wells.push(WellResult {
            well_id: meta.well_id.clone(),
            channel: meta.channel.clone(),
            sample_name: meta.sample_name.clone(),
            role: meta.role.as_str().to_string(),
            test_code: meta.test_code.clone(),
            fit: fits.fits[idx].clone(),
            anomalies: anomalies.flags[idx]
                .names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            features_30: features.features[idx].to_array().to_vec(),
            threshold: thresholds.active(&meta.channel, ctx.scale).cloned(),
            cqj: quants.quants[idx].cqj,
            calcj: quants.quants[idx].calcj,
            classification: ClassificationOut::from_classification(
                &classify.classifications[idx],
            ),
            error: fits.errors[idx].map(|s| s.to_string()),
        });
    }

    let threshold_records: Vec<ChannelThreshold> =
        thresholds.thresholds.values().cloned().collect();

    let mut channel_errors = BTreeMap::new();
    for (channel, code) in &quants.channel_errors {
        channel_errors.insert(channel.clone(), code.to_string());
    }

    RunResult {
        schema_version: SCHEMA_VERSION,
        run_id: ctx.run_id.clone(),
        strategy: ctx.strategy.as_str().to_string(),
        scale: ctx.scale.as_str().to_string(),
        thresholds: threshold_records,
        channel_errors,
        wells,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage8_report.rs"]
mod tests;
