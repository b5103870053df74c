use crate::config::EngineConfig;
use crate::fit::stats;
use crate::model::features::{FeatureVector, ShapeClass};
use crate::model::fit::FitResult;
use crate::model::trace::Trace;
use crate::model::weights::AnomalyConfig;
use crate::pipeline::stage1_load::RunCtx;
use crate::pipeline::stage2_fit::FitContext;
use crate::pipeline::stage5_quant::QuantContext;

#[derive(Debug, Clone)]
pub struct FeaturesContext {
    pub features: Vec<FeatureVector>,
}

pub fn run_stage6_features(
    ctx: &RunCtx,
    fits: &FitContext,
    quants: &QuantContext,
    config: &EngineConfig,
) -> FeaturesContext {
    let mut features = Vec::with_capacity(ctx.n_wells);
    for idx in 0..ctx.n_wells {
        let meta = &ctx.meta[idx];
        let expected_range = config
            .pathogens
            .get(&meta.test_code)
            .and_then(|p| p.channel(&meta.channel))
            .and_then(|c| c.expected_range)
            .unwrap_or(AnomalyConfig::default().default_expected_range);
        features.push(extract(
            &ctx.traces[idx],
            &fits.fits[idx],
            &quants.quants[idx],
            expected_range,
        ));
    }
    FeaturesContext { features }
}

/// Build the 30-feature view of one well. Absent cqj/calcj encode as 0.0;
/// the run result keeps null for reporting.
pub fn extract(
    trace: &Trace,
    fit: &FitResult,
    quant: &crate::pipeline::stage5_quant::Quantification,
    expected_range: f64,
) -> FeatureVector {
    let finite: Vec<f64> = trace.rfu.iter().copied().filter(|v| v.is_finite()).collect();
    let range = stats::range(&finite);
    let deltas = stats::diff(&finite);

    let min_rfu = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max_rfu = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (min_rfu, max_rfu) = if finite.is_empty() {
        (0.0, 0.0)
    } else {
        (min_rfu, max_rfu)
    };

    let baseline_window = &finite[..finite.len().min(5)];
    let plateau_window = &finite[finite.len().saturating_sub(5)..];
    let baseline_mean = if baseline_window.is_empty() {
        0.0
    } else {
        stats::mean(baseline_window)
    };
    let baseline_std = if baseline_window.is_empty() {
        0.0
    } else {
        stats::std(baseline_window)
    };
    let plateau_std = if plateau_window.is_empty() {
        0.0
    } else {
        stats::std(plateau_window)
    };

    let delta_std = if deltas.is_empty() {
        0.0
    } else {
        stats::std(&deltas)
    };

    let trend_consistency = if deltas.is_empty() {
        0.0
    } else {
        deltas.iter().filter(|d| **d >= 0.0).count() as f64 / deltas.len() as f64
    };

    let spike_count = if delta_std > 0.0 {
        deltas.iter().filter(|d| d.abs() > 3.0 * delta_std).count() as f64
    } else {
        0.0
    };

    let oscillation_score = if deltas.len() > 1 {
        let sign_changes = deltas
            .windows(2)
            .filter(|w| w[0].signum() != w[1].signum() && w[0] != 0.0 && w[1] != 0.0)
            .count() as f64;
        sign_changes / (deltas.len() - 1) as f64
    } else {
        0.0
    };

    let dropout_count = trace.rfu.iter().filter(|v| !v.is_finite()).count() as f64;

    let cmin = trace.cycles.first().copied().unwrap_or(0) as f64;
    let cmax = trace.cycles.last().copied().unwrap_or(0) as f64;

    // Midpoint centering as a [0, 1] symmetry proxy.
    let curve_symmetry = if cmax > cmin && fit.l > 0.0 {
        let f = ((fit.x0 - cmin) / (cmax - cmin)).clamp(0.0, 1.0);
        1.0 - 2.0 * (f - 0.5).abs()
    } else {
        0.0
    };

    FeatureVector {
        amplitude: fit.l,
        r2: fit.r2,
        steepness: fit.k,
        snr: fit.snr,
        midpoint: fit.x0,
        baseline: fit.b,
        cq_value: fit.model_cq().unwrap_or(0.0),
        cqj: quant.cqj.unwrap_or(0.0),
        calcj: quant.calcj.unwrap_or(0.0),
        rmse: fit.rmse,
        min_rfu,
        max_rfu,
        mean_rfu: if finite.is_empty() {
            0.0
        } else {
            stats::mean(&finite)
        },
        std_rfu: if finite.is_empty() {
            0.0
        } else {
            stats::std(&finite)
        },
        min_cycle: cmin,
        max_cycle: cmax,
        dynamic_range: range,
        efficiency: fit.efficiency,
        shape_class: shape_class(trace, fit, range, &finite),
        baseline_stability: (1.0 - baseline_std / (0.15 * range).max(1.0)).clamp(0.0, 1.0),
        exp_phase_sharpness: (fit.k / 2.0).clamp(0.0, 1.0),
        plateau_quality: (1.0 - plateau_std / (0.1 * range).max(1.0)).clamp(0.0, 1.0),
        curve_symmetry,
        noise_level: if range > 0.0 {
            (delta_std / (0.30 * range)).clamp(0.0, 1.0)
        } else {
            0.0
        },
        trend_consistency,
        spike_count,
        oscillation_score,
        dropout_count,
        relative_amplitude: (fit.l / expected_range.max(1.0)).clamp(0.0, 2.0),
        background_separation: if range > 0.0 {
            ((fit.plateau_level - baseline_mean) / range).clamp(0.0, 1.0)
        } else {
            0.0
        },
    }
}

fn shape_class(trace: &Trace, fit: &FitResult, range: f64, finite: &[f64]) -> ShapeClass {
    if range < 50.0 {
        return ShapeClass::Flat;
    }
    if fit.is_good_scurve || (fit.r2 > 0.85 && fit.k > 0.05 && fit.l > 0.0) {
        return ShapeClass::SCurve;
    }

    // Straight-line fit quality on the raw trace.
    let xs: Vec<f64> = trace
        .cycles
        .iter()
        .zip(trace.rfu.iter())
        .filter(|(_, v)| v.is_finite())
        .map(|(c, _)| *c as f64)
        .collect();
    if let Some((slope, intercept)) = stats::ols(&xs, finite) {
        let sst: f64 = {
            let m = stats::mean(finite);
            finite.iter().map(|y| (y - m) * (y - m)).sum()
        };
        let sse: f64 = xs
            .iter()
            .zip(finite.iter())
            .map(|(x, y)| {
                let r = y - (intercept + slope * x);
                r * r
            })
            .sum();
        if sst > 0.0 && 1.0 - sse / sst > 0.95 {
            return ShapeClass::Linear;
        }
    }

    // Accelerating monotone growth without a plateau reads as exponential.
    let deltas = stats::diff(finite);
    if deltas.len() >= 6 {
        let third = deltas.len() / 3;
        let early = stats::mean(&deltas[..third]);
        let late = stats::mean(&deltas[deltas.len() - third..]);
        let up_frac = deltas.iter().filter(|d| **d >= 0.0).count() as f64 / deltas.len() as f64;
        if late > 2.0 * early.max(0.0) && late > 0.0 && up_frac >= 0.8 {
            return ShapeClass::Exponential;
        }
    }

    ShapeClass::Irregular
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_features.rs"]
mod tests;
