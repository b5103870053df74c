use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::EngineConfig;
use crate::fit::stats;
use crate::model::thresholds::{ChannelThreshold, Scale, Strategy, ThresholdSource};
use crate::pipeline::stage1_load::RunCtx;
use crate::pipeline::stage2_fit::FitContext;

pub const LOG_FLOOR: f64 = 1e-3;

#[derive(Debug, Error)]
pub enum Stage4Error {
    #[error("channel {channel}: no fixed threshold for pathogen {pathogen} on scale {scale}")]
    NoFixed {
        channel: String,
        pathogen: String,
        scale: &'static str,
    },
}

impl Stage4Error {
    pub fn code(&self) -> &'static str {
        "THRESHOLD_NO_FIXED"
    }
}

/// Per-run threshold table: one record per (channel, scale). Channels whose
/// fixed lookup failed carry an error instead; the run itself continues.
#[derive(Debug, Clone, Default)]
pub struct ThresholdContext {
    pub thresholds: BTreeMap<(String, Scale), ChannelThreshold>,
    pub channel_errors: BTreeMap<String, &'static str>,
}

impl ThresholdContext {
    pub fn active(&self, channel: &str, scale: Scale) -> Option<&ChannelThreshold> {
        self.thresholds.get(&(channel.to_string(), scale))
    }
}

pub fn run_stage4_thresholds(
    ctx: &RunCtx,
    fits: &FitContext,
    config: &EngineConfig,
) -> ThresholdContext {
    let mut out = ThresholdContext::default();

    for channel in &ctx.channels {
        match compute_channel(ctx, fits, config, channel) {
            Ok(records) => {
                for record in records {
                    out.thresholds
                        .insert((record.channel.clone(), record.scale), record);
                }
            }
            Err(e) => {
                tracing::warn!(
                    channel = channel.as_str(),
                    code = e.code(),
                    "threshold unresolved: {e}"
                );
                out.channel_errors.insert(channel.clone(), e.code());
            }
        }
    }

    out
}

fn compute_channel(
    ctx: &RunCtx,
    fits: &FitContext,
    config: &EngineConfig,
    channel: &str,
) -> Result<Vec<ChannelThreshold>, Stage4Error> {
    let record = |scale: Scale, value: f64, source: ThresholdSource| ChannelThreshold {
        channel: channel.to_string(),
        scale,
        value,
        strategy: ctx.strategy,
        source,
    };

    match ctx.strategy {
        Strategy::Manual => {
            // A caller-provided value binds only the scale it was given for;
            // channels without an override fall back to the computed value.
            match ctx.manual_overrides.get(channel) {
                Some(v) => Ok(vec![record(ctx.scale, *v, ThresholdSource::Manual)]),
                None => {
                    let (value, _) = exp_phase_value(ctx, fits, channel);
                    Ok(vec![
                        record(
                            Scale::Linear,
                            value,
                            ThresholdSource::Computed { fallback: true },
                        ),
                        record(
                            Scale::Log,
                            value.max(LOG_FLOOR).log10(),
                            ThresholdSource::Computed { fallback: true },
                        ),
                    ])
                }
            }
        }
        Strategy::LinearFixed | Strategy::LogFixed => {
            let pathogen = ctx.channel_test_code(channel).unwrap_or_default().to_string();
            let scale = if ctx.strategy == Strategy::LinearFixed {
                Scale::Linear
            } else {
                Scale::Log
            };
            let value = config
                .fixed
                .lookup(&pathogen, channel, scale)
                .ok_or_else(|| Stage4Error::NoFixed {
                    channel: channel.to_string(),
                    pathogen: pathogen.clone(),
                    scale: scale.as_str(),
                })?;
            Ok(vec![record(scale, value, ThresholdSource::FixedLookup)])
        }
        Strategy::LinearStddev => {
            let (value, fallback) = stddev_value(ctx, channel);
            Ok(vec![
                record(
                    Scale::Linear,
                    value,
                    ThresholdSource::Computed { fallback },
                ),
                record(
                    Scale::Log,
                    value.max(LOG_FLOOR).log10(),
                    ThresholdSource::Computed { fallback },
                ),
            ])
        }
        Strategy::LinearExpPhase | Strategy::Auto => {
            let (value, fallback) = exp_phase_value(ctx, fits, channel);
            Ok(vec![
                record(
                    Scale::Linear,
                    value,
                    ThresholdSource::Computed { fallback },
                ),
                record(
                    Scale::Log,
                    value.max(LOG_FLOOR).log10(),
                    ThresholdSource::Computed { fallback },
                ),
            ])
        }
    }
}

/// Pooled baseline mean + 10x pooled baseline std across control wells of
/// the channel; all wells (fallback) when the run carries no controls.
fn stddev_value(ctx: &RunCtx, channel: &str) -> (f64, bool) {
    let wells = ctx.channel_wells(channel);
    let controls: Vec<usize> = wells
        .iter()
        .copied()
        .filter(|i| ctx.meta[*i].role.is_control())
        .collect();

    let (pool, fallback) = if controls.is_empty() {
        (wells, true)
    } else {
        (controls, false)
    };

    let mut baseline_samples = Vec::new();
    for idx in pool {
        let rfu = &ctx.traces[idx].rfu;
        for v in rfu.iter().take(5) {
            if v.is_finite() {
                baseline_samples.push(*v);
            }
        }
    }

    let mean = stats::mean(&baseline_samples);
    let std = stats::std(&baseline_samples);
    let value = if mean.is_finite() && std.is_finite() {
        (mean + 10.0 * std).max(1.0)
    } else {
        1.0
    };
    (value, fallback)
}

/// Median of the per-well `B + L/2` (clamped to [B+0.1L, B+0.9L]) over the
/// channel's good S-curve wells; all fitted wells when none pass the gate.
fn exp_phase_value(ctx: &RunCtx, fits: &FitContext, channel: &str) -> (f64, bool) {
    let wells = ctx.channel_wells(channel);
    let good: Vec<f64> = wells
        .iter()
        .copied()
        .filter(|i| fits.fitted(*i) && fits.fits[*i].is_good_scurve)
        .map(|i| well_exp_phase(&fits.fits[i]))
        .collect();

    if !good.is_empty() {
        return (stats::median(&good).max(1.0), false);
    }

    let any: Vec<f64> = wells
        .iter()
        .copied()
        .filter(|i| fits.fitted(*i) && fits.fits[*i].l > 0.0)
        .map(|i| well_exp_phase(&fits.fits[i]))
        .collect();

    if any.is_empty() {
        (1.0, true)
    } else {
        (stats::median(&any).max(1.0), true)
    }
}

fn well_exp_phase(fit: &crate::model::fit::FitResult) -> f64 {
    let raw = fit.b + fit.l / 2.0;
    let lo = fit.b + 0.1 * fit.l;
    let hi = fit.b + 0.9 * fit.l;
    raw.clamp(lo, hi)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_thresholds.rs"]
mod tests;
