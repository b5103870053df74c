use thiserror::Error;

use crate::fit::{lm, stats};
use crate::model::fit::{FitResult, RejectionSet};
use crate::model::weights::FitGates;

pub const MIN_VALID_POINTS: usize = 5;

#[derive(Debug, Error)]
pub enum FitError {
    #[error("insufficient data: {valid} valid points, need {MIN_VALID_POINTS}")]
    InsufficientData { valid: usize },
}

impl FitError {
    pub fn code(&self) -> &'static str {
        match self {
            FitError::InsufficientData { .. } => "FIT_INSUFFICIENT_DATA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Params {
    pub l: f64,
    pub k: f64,
    pub x0: f64,
    pub b: f64,
}

/// `f(x) = b + l / (1 + exp(-k * (x - x0)))`
pub fn sigmoid(x: f64, p: &Params) -> f64 {
    let t = (-p.k * (x - p.x0)).clamp(-500.0, 500.0);
    p.b + p.l / (1.0 + t.exp())
}

#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub k_min: f64,
    pub k_max: f64,
    pub x0_min: f64,
    pub x0_max: f64,
}

impl Bounds {
    pub fn for_cycles(x0_min: f64, x0_max: f64) -> Self {
        Self {
            k_min: 0.01,
            k_max: 5.0,
            x0_min,
            x0_max,
        }
    }

    /// `l >= 0`, `k` and `x0` boxed, `b` unbounded.
    pub fn clamp(&self, p: Params) -> Params {
        Params {
            l: p.l.max(0.0),
            k: p.k.clamp(self.k_min, self.k_max),
            x0: p.x0.clamp(self.x0_min, self.x0_max),
            b: p.b,
        }
    }
}

/// Baseline mean over the first 5 points, plateau over the last 5, midpoint
/// seeded at the largest absolute first difference (smallest cycle wins a
/// tie, so the guess is stable).
pub fn initial_guess(xs: &[f64], ys: &[f64]) -> Params {
    let head = &ys[..ys.len().min(5)];
    let tail = &ys[ys.len().saturating_sub(5)..];
    let b0 = stats::mean(head);
    let p0 = stats::mean(tail);
    let l0 = (p0 - b0).max(1.0);

    let deltas = stats::diff(ys);
    let mut best_idx = 0usize;
    let mut best = f64::NEG_INFINITY;
    for (i, d) in deltas.iter().enumerate() {
        let a = d.abs();
        if a.is_finite() && a > best {
            best = a;
            best_idx = i;
        }
    }
    let x00 = if deltas.is_empty() { xs[0] } else { xs[best_idx] };

    Params {
        l: l0,
        k: 0.3,
        x0: x00,
        b: if b0.is_finite() { b0 } else { 0.0 },
    }
}

/// Fit one trace. Non-finite rfu points are dropped before fitting; fewer
/// than 5 surviving points is an error, everything else yields a FitResult
/// (possibly `is_good_scurve = false` with the reasons recorded).
pub fn fit_trace(cycles: &[u32], rfu: &[f64], gates: &FitGates) -> Result<FitResult, FitError> {
    let mut xs = Vec::with_capacity(cycles.len());
    let mut ys = Vec::with_capacity(rfu.len());
    for (c, v) in cycles.iter().zip(rfu.iter()) {
        if v.is_finite() {
            xs.push(*c as f64);
            ys.push(*v);
        }
    }
    if xs.len() < MIN_VALID_POINTS {
        return Err(FitError::InsufficientData { valid: xs.len() });
    }

    let dynamic_range = stats::range(&ys);
    let bounds = Bounds::for_cycles(xs[0], xs[xs.len() - 1]);
    let init = initial_guess(&xs, &ys);

    let Some(outcome) = lm::fit(&xs, &ys, init, &bounds) else {
        let mut reasons = RejectionSet::empty();
        reasons.set(RejectionSet::FIT_FAILED);
        return Ok(FitResult::failed(dynamic_range, reasons));
    };

    let p = outcome.params;
    let n = xs.len() as f64;

    let y_mean = stats::mean(&ys);
    let sst: f64 = ys.iter().map(|y| (y - y_mean) * (y - y_mean)).sum();
    let r2 = if sst > 0.0 {
        1.0 - outcome.sse / sst
    } else {
        0.0
    };
    let rmse = (outcome.sse / n).sqrt();

    let baseline_std = stats::std(&ys[..ys.len().min(5)]);
    let noise = if p.b < 0.0 { p.b.abs() } else { baseline_std };
    let snr = p.l / noise.max(1.0);

    let plateau_level = stats::mean(&ys[ys.len().saturating_sub(5)..]);
    let exp_growth_rate = p.l * p.k / 4.0;
    let efficiency = (p.k.exp() - 1.0).clamp(0.0, 1.5);

    let mut reasons = RejectionSet::empty();
    if !outcome.converged {
        reasons.set(RejectionSet::FIT_FAILED);
    }

    let r2_min = if xs.len() <= gates.short_trace_len {
        gates.r2_min_short
    } else {
        gates.r2_min
    };
    if r2 <= r2_min {
        reasons.set(RejectionSet::LOW_R2);
    }
    if p.k <= gates.k_min {
        reasons.set(RejectionSet::SHALLOW_CURVE);
    }
    if p.l <= gates.amp_abs_floor.max(gates.amp_range_frac * dynamic_range) {
        reasons.set(RejectionSet::AMPLITUDE_BELOW_RANGE);
    }
    if let Some(cross) = midline_cross_cycle(&xs, &ys, &p)
        && cross < gates.midline_cross_min
    {
        reasons.set(RejectionSet::EARLY_MIDLINE_CROSS);
    }
    if p.l < gates.amp_min {
        reasons.set(RejectionSet::LOW_AMPLITUDE);
    }
    if plateau_level < gates.plateau_min {
        reasons.set(RejectionSet::LOW_PLATEAU);
    }
    if snr < gates.snr_min {
        reasons.set(RejectionSet::LOW_SNR);
    }
    if exp_growth_rate < gates.growth_min {
        reasons.set(RejectionSet::SLOW_GROWTH);
    }

    Ok(FitResult {
        l: p.l,
        k: p.k,
        x0: p.x0,
        b: p.b,
        r2,
        rmse,
        snr,
        plateau_level,
        exp_growth_rate,
        dynamic_range,
        efficiency,
        is_good_scurve: reasons.is_empty(),
        rejection_reasons: reasons,
    })
}

/// First cycle at which the observed trace reaches the fitted midline.
fn midline_cross_cycle(xs: &[f64], ys: &[f64], p: &Params) -> Option<f64> {
    let midline = p.b + p.l / 2.0;
    ys.iter()
        .position(|y| *y >= midline)
        .map(|i| xs[i])
}

#[cfg(test)]
#[path = "../../tests/src_inline/fit/sigmoid.rs"]
mod tests;
