use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::config::pathogens::ControlLevels;
use crate::fit::stats;
use crate::model::thresholds::Scale;
use crate::model::trace::ControlRole;
use crate::pipeline::stage1_load::RunCtx;
use crate::pipeline::stage4_thresholds::{LOG_FLOOR, ThresholdContext};

/// Per-well quantification. Absent cqj propagates to absent calcj for
/// sample wells; control wells carry the configured concentration instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quantification {
    pub cqj: Option<f64>,
    pub calcj: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct QuantContext {
    pub quants: Vec<Quantification>,
    /// Channel-level reasons CalcJ is unavailable: NO_STD_CURVE or
    /// STD_CURVE_INVALID (plus THRESHOLD_NO_FIXED inherited from stage4).
    pub channel_errors: BTreeMap<String, &'static str>,
}

pub fn run_stage5_quant(
    ctx: &RunCtx,
    thresholds: &ThresholdContext,
    config: &EngineConfig,
) -> QuantContext {
    let mut quants = vec![Quantification::default(); ctx.n_wells];
    let mut channel_errors: BTreeMap<String, &'static str> = BTreeMap::new();

    for channel in &ctx.channels {
        if let Some(code) = thresholds.channel_errors.get(channel) {
            channel_errors.insert(channel.clone(), code);
            continue;
        }
        let Some(threshold) = thresholds.active(channel, ctx.scale) else {
            // Strategy stored only the other scale; nothing to cross.
            channel_errors.insert(channel.clone(), "THRESHOLD_NO_FIXED");
            continue;
        };

        let wells = ctx.channel_wells(channel);
        for idx in &wells {
            quants[*idx].cqj = cqj_crossing(
                &ctx.traces[*idx].cycles,
                &ctx.traces[*idx].rfu,
                threshold.value,
                ctx.scale,
            );
        }

        apply_calcj(ctx, config, channel, &wells, &mut quants, &mut channel_errors);
    }

    QuantContext {
        quants,
        channel_errors,
    }
}

/// First upward crossing of the threshold, linearly interpolated. Log scale
/// applies the scan on log10(max(rfu, 1e-3)). No crossing means absent —
/// never a synthesized sentinel.
pub fn cqj_crossing(cycles: &[u32], rfu: &[f64], threshold: f64, scale: Scale) -> Option<f64> {
    let values: Vec<f64> = match scale {
        Scale::Linear => rfu.to_vec(),
        Scale::Log => rfu
            .iter()
            .map(|v| {
                if v.is_finite() {
                    v.max(LOG_FLOOR).log10()
                } else {
                    f64::NAN
                }
            })
            .collect(),
    };

    for i in 1..values.len() {
        let prev = values[i - 1];
        let cur = values[i];
        if !prev.is_finite() || !cur.is_finite() {
            continue;
        }
        if cur >= threshold && prev < threshold {
            let x0 = cycles[i - 1] as f64;
            let x1 = cycles[i] as f64;
            let frac = (threshold - prev) / (cur - prev);
            return Some(x0 + frac * (x1 - x0));
        }
    }
    None
}

/// Replicate consensus: median, drop members further than 2x MAD, then
/// average the survivors. Stabilizes the standard curve anchors.
pub fn consensus(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    let med = stats::median(&finite);
    let mad = stats::mad(&finite);
    let survivors: Vec<f64> = if mad > 0.0 {
        finite
            .iter()
            .copied()
            .filter(|v| (v - med).abs() <= 2.0 * mad)
            .collect()
    } else {
        finite
    };
    if survivors.is_empty() {
        Some(med)
    } else {
        Some(stats::mean(&survivors))
    }
}

struct StdCurve {
    slope: f64,
    intercept: f64,
}

impl StdCurve {
    fn concentration(&self, cqj: f64) -> f64 {
        10f64.powf(self.intercept + self.slope * cqj)
    }
}

fn apply_calcj(
    ctx: &RunCtx,
    config: &EngineConfig,
    channel: &str,
    wells: &[usize],
    quants: &mut [Quantification],
    channel_errors: &mut BTreeMap<String, &'static str>,
) {
    let profile_controls = ctx
        .channel_test_code(channel)
        .and_then(|code| config.pathogens.get(code))
        .and_then(|p| p.channel(channel))
        .map(|c| c.controls.clone());

    // Controls always receive the configured concentration, regardless of
    // thresholds and regardless of whether a standard curve exists.
    if let Some(controls) = &profile_controls {
        for idx in wells {
            if let Some(letter) = role_letter(ctx.meta[*idx].role)
                && let Some(point) = controls.by_role_letter(letter)
            {
                quants[*idx].calcj = Some(point.concentration);
            }
        }
    }

    let curve = match build_std_curve(ctx, channel, wells, quants, profile_controls.as_ref()) {
        Ok(curve) => curve,
        Err(code) => {
            channel_errors.insert(channel.to_string(), code);
            return;
        }
    };

    for idx in wells {
        if ctx.meta[*idx].role != ControlRole::Unknown {
            continue;
        }
        quants[*idx].calcj = quants[*idx].cqj.map(|cqj| curve.concentration(cqj));
    }
}

fn build_std_curve(
    ctx: &RunCtx,
    channel: &str,
    wells: &[usize],
    quants: &[Quantification],
    controls: Option<&ControlLevels>,
) -> Result<StdCurve, &'static str> {
    let Some(controls) = controls else {
        return Err("NO_STD_CURVE");
    };

    let mut points: Vec<(f64, f64)> = Vec::new();
    let mut have = [false; 3];
    for (slot, role, letter) in [
        (0usize, ControlRole::ControlH, 'H'),
        (1, ControlRole::ControlM, 'M'),
        (2, ControlRole::ControlL, 'L'),
    ] {
        let level_wells: Vec<usize> = wells
            .iter()
            .copied()
            .filter(|i| ctx.meta[*i].role == role && ctx.meta[*i].channel == channel)
            .collect();
        if level_wells.is_empty() {
            continue;
        }
        let Some(point) = controls.by_role_letter(letter) else {
            continue;
        };

        let cqjs: Vec<f64> = level_wells.iter().filter_map(|i| quants[*i].cqj).collect();
        let anchor = consensus(&cqjs).or(point.cq);
        if let Some(cqj) = anchor {
            points.push((cqj, point.concentration.log10()));
            have[slot] = true;
        }
    }

    // H and L anchors are mandatory; M upgrades the fit to three points.
    if !(have[0] && have[2]) {
        return Err("NO_STD_CURVE");
    }

    let xs: Vec<f64> = points.iter().map(|(cqj, _)| *cqj).collect();
    let ys: Vec<f64> = points.iter().map(|(_, lc)| *lc).collect();
    let Some((slope, intercept)) = stats::ols(&xs, &ys) else {
        return Err("STD_CURVE_INVALID");
    };
    if slope >= 0.0 {
        return Err("STD_CURVE_INVALID");
    }

    Ok(StdCurve { slope, intercept })
}

fn role_letter(role: ControlRole) -> Option<char> {
    match role {
        ControlRole::ControlH => Some('H'),
        ControlRole::ControlM => Some('M'),
        ControlRole::ControlL => Some('L'),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_quant.rs"]
mod tests;
