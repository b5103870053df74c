use crate::config::EngineConfig;
use crate::fit::stats;
use crate::model::anomalies::AnomalyFlags;
use crate::model::fit::FitResult;
use crate::model::trace::Trace;
use crate::model::weights::AnomalyConfig;
use crate::pipeline::stage1_load::RunCtx;
use crate::pipeline::stage2_fit::FitContext;

#[derive(Debug, Clone)]
pub struct AnomalyContext {
    pub flags: Vec<AnomalyFlags>,
}

pub fn run_stage3_anomalies(
    ctx: &RunCtx,
    fits: &FitContext,
    config: &EngineConfig,
) -> AnomalyContext {
    let cfg = AnomalyConfig::default();
    let mut flags = Vec::with_capacity(ctx.n_wells);

    for (idx, trace) in ctx.traces.iter().enumerate() {
        let meta = &ctx.meta[idx];
        let expected_range = config
            .pathogens
            .get(&meta.test_code)
            .and_then(|p| p.channel(&meta.channel))
            .and_then(|c| c.expected_range)
            .unwrap_or(cfg.default_expected_range);
        flags.push(detect(trace, &fits.fits[idx], expected_range, &cfg));
    }

    AnomalyContext { flags }
}

/// Evaluate the closed anomaly set for one trace. Flags accumulate
/// independently; the empty set means the trace is clean.
pub fn detect(
    trace: &Trace,
    fit: &FitResult,
    expected_range: f64,
    cfg: &AnomalyConfig,
) -> AnomalyFlags {
    let mut flags = AnomalyFlags::empty();

    if trace.len() < 5 {
        flags.set(AnomalyFlags::INSUFFICIENT_DATA);
    }
    if trace.valid_points() < 5 {
        flags.set(AnomalyFlags::INSUFFICIENT_VALID_DATA);
    }

    let range = stats::range(&trace.rfu);

    if range < cfg.low_amp_abs || range < cfg.low_amp_expected_frac * expected_range {
        flags.set(AnomalyFlags::LOW_AMPLITUDE);
    }

    // Baseline window is cycles 6..10: the first 5 cycles are excluded.
    if trace.len() >= 10 {
        let baseline_std = stats::std(&trace.rfu[5..10]);
        if baseline_std > cfg.baseline_std_abs || baseline_std > cfg.baseline_std_frac * range {
            flags.set(AnomalyFlags::UNSTABLE_BASELINE);
        }
    }

    let finite: Vec<f64> = trace.rfu.iter().copied().filter(|v| v.is_finite()).collect();
    if !finite.is_empty() {
        let neg_frac =
            finite.iter().filter(|v| **v < 0.0).count() as f64 / finite.len() as f64;
        if neg_frac > cfg.negative_frac && neg_frac < cfg.uniform_offset_frac {
            flags.set(AnomalyFlags::NEGATIVE_RFU_VALUES);
        }
    }

    let deltas = stats::diff(&finite);
    if !deltas.is_empty() && stats::std(&deltas) > cfg.high_noise_frac * range && range > 0.0 {
        flags.set(AnomalyFlags::HIGH_NOISE);
    }

    if early_plateau(trace, fit, cfg) {
        flags.set(AnomalyFlags::EARLY_PLATEAU);
    }
    if negative_amplification(trace, fit, cfg) {
        flags.set(AnomalyFlags::NEGATIVE_AMPLIFICATION);
    }

    flags
}

/// Growth stops before the fitted midpoint: a sustained flat stretch at
/// plateau height begins at a cycle below x0. The height requirement keeps
/// the (equally flat) baseline from matching.
fn early_plateau(trace: &Trace, fit: &FitResult, cfg: &AnomalyConfig) -> bool {
    if fit.l <= 0.0 || fit.k <= 0.0 {
        return false;
    }

    let mut xs = Vec::with_capacity(trace.len());
    let mut ys = Vec::with_capacity(trace.len());
    for (c, v) in trace.cycles.iter().zip(trace.rfu.iter()) {
        if v.is_finite() {
            xs.push(*c as f64);
            ys.push(*v);
        }
    }
    let range = stats::range(&ys);
    if ys.len() < cfg.early_plateau_run + 1 || range < cfg.low_amp_abs {
        return false;
    }
    let lo = ys.iter().copied().fold(f64::INFINITY, f64::min);
    let plateau_floor = lo + 0.6 * range;

    let eps = cfg.early_plateau_eps * (fit.l * fit.k / 4.0).max(1.0);
    let deltas = stats::diff(&ys);
    let mut run = 0usize;
    for (i, d) in deltas.iter().enumerate() {
        if d.abs() < eps && ys[i] >= plateau_floor {
            run += 1;
            if run >= cfg.early_plateau_run {
                let flat_start = i + 1 - run;
                return xs[flat_start] < fit.x0;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Strictly decreasing trend inside the expected exponential window.
fn negative_amplification(trace: &Trace, fit: &FitResult, cfg: &AnomalyConfig) -> bool {
    let (lo, hi) = if fit.k > 0.0 && fit.l > 0.0 {
        (fit.x0 - 2.0 / fit.k, fit.x0 + 2.0 / fit.k)
    } else {
        let first = trace.cycles[0] as f64;
        let last = trace.cycles[trace.len() - 1] as f64;
        let third = (last - first) / 3.0;
        (first + third, last - third)
    };

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (c, v) in trace.cycles.iter().zip(trace.rfu.iter()) {
        let x = *c as f64;
        if x >= lo && x <= hi && v.is_finite() {
            xs.push(x);
            ys.push(*v);
        }
    }
    if ys.len() < 3 {
        return false;
    }

    let Some((slope, _)) = stats::ols(&xs, &ys) else {
        return false;
    };
    if slope >= 0.0 {
        return false;
    }

    let deltas = stats::diff(&ys);
    let decreasing = deltas.iter().filter(|d| **d < 0.0).count() as f64;
    decreasing / deltas.len() as f64 >= cfg.decreasing_frac
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_anomalies.rs"]
mod tests;
