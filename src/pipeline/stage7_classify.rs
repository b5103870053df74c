use crate::model::anomalies::AnomalyFlags;
use crate::model::classes::{Classification, Summary3, WellClass};
use crate::model::fit::FitResult;
use crate::model::weights::{ClassBands, RuleWeights};
use crate::pipeline::stage1_load::RunCtx;
use crate::pipeline::stage2_fit::FitContext;
use crate::pipeline::stage3_anomalies::AnomalyContext;

#[derive(Debug, Clone)]
pub struct ClassifyContext {
    pub classifications: Vec<Classification>,
}

pub fn run_stage7_classify(
    ctx: &RunCtx,
    fits: &FitContext,
    anomalies: &AnomalyContext,
) -> ClassifyContext {
    let weights = RuleWeights::default();
    let bands = ClassBands::default();

    let mut classifications = Vec::with_capacity(ctx.n_wells);
    for idx in 0..ctx.n_wells {
        if !fits.fitted(idx) {
            classifications.push(Classification::Rule {
                class: WellClass::Negative,
                summary: Summary3::Neg,
                score: 0.0,
                reason: "fit_failed".to_string(),
            });
            continue;
        }
        classifications.push(classify_well(
            &fits.fits[idx],
            anomalies.flags[idx],
            &weights,
            &bands,
        ));
    }

    ClassifyContext { classifications }
}

struct ScoreSheet {
    positive: f64,
    negative: f64,
    strong_bias: bool,
    suspicious_bias: bool,
    suspicious_reason: &'static str,
    impossible_cq: bool,
}

fn score_well(fit: &FitResult, flags: AnomalyFlags, w: &RuleWeights) -> ScoreSheet {
    let mut s = ScoreSheet {
        positive: 0.0,
        negative: 0.0,
        strong_bias: false,
        suspicious_bias: false,
        suspicious_reason: "",
        impossible_cq: false,
    };

    // Criteria are cumulative: a well passing both r2 cuts collects both.
    if fit.r2 > w.r2_excellent_cut {
        s.positive += w.r2_excellent;
    }
    if fit.r2 > w.r2_good_cut {
        s.positive += w.r2_good;
    }
    if fit.k > w.k_steep_cut {
        s.positive += w.k_steep;
    }
    if fit.snr > w.snr_high_cut {
        s.positive += w.snr_high;
    }
    if fit.snr > w.snr_mid_cut {
        s.positive += w.snr_mid;
    }
    if fit.snr < w.snr_poor_cut {
        s.negative += w.snr_poor;
    }
    if fit.l > w.amp_strong_cut {
        s.positive += w.amp_strong;
        s.strong_bias = true;
    }
    if fit.l < w.amp_low_cut {
        s.negative += w.amp_low;
    }
    if fit.x0 < w.midpoint_min || fit.x0 > w.midpoint_max {
        s.negative += w.impossible_cq;
        s.impossible_cq = true;
    }
    if flags.contains(AnomalyFlags::EARLY_PLATEAU)
        || flags.contains(AnomalyFlags::NEGATIVE_AMPLIFICATION)
    {
        s.negative += w.shape_anomaly;
    }
    if flags.contains(AnomalyFlags::HIGH_NOISE) {
        s.suspicious_bias = true;
        s.suspicious_reason = "High-noise trace";
    }
    if fit.k > w.artifact_k_cut && fit.snr < w.artifact_snr_cut {
        s.suspicious_bias = true;
        s.suspicious_reason = "Steep low-SNR artifact";
    }

    s
}

/// Weighted multi-criteria reduction to one of the seven classes, plus the
/// strict POS/NEG/REDO operational summary. Precedence: the SUSPICIOUS
/// bias, then forced REDO, then the score bands; override protection keeps
/// excellent-shape curves out of NEGATIVE.
pub fn classify_well(
    fit: &FitResult,
    flags: AnomalyFlags,
    w: &RuleWeights,
    bands: &ClassBands,
) -> Classification {
    let sheet = score_well(fit, flags, w);
    let net = sheet.positive - sheet.negative;
    let summary = strict_summary(fit, flags, bands);

    let forced_redo = (fit.l >= bands.redo_amp_min && fit.l <= bands.redo_amp_max)
        || (fit.is_good_scurve && fit.l > bands.summary_pos_amp && !flags.is_clean());

    let (class, reason) = if sheet.suspicious_bias {
        (WellClass::Suspicious, sheet.suspicious_reason.to_string())
    } else if forced_redo {
        (WellClass::Redo, "Amplitude in retest window".to_string())
    } else {
        let banded = if net >= bands.strong {
            WellClass::StrongPositive
        } else if net >= bands.positive {
            if sheet.strong_bias {
                WellClass::StrongPositive
            } else {
                WellClass::Positive
            }
        } else if net >= bands.weak {
            WellClass::WeakPositive
        } else if net >= bands.indeterminate {
            WellClass::Indeterminate
        } else {
            WellClass::Negative
        };

        // Override protection: excellent shape cannot be NEGATIVE.
        if banded == WellClass::Negative
            && fit.r2 >= w.r2_excellent_cut
            && fit.k >= w.k_steep_cut
        {
            (
                WellClass::WeakPositive,
                "Excellent shape at low amplitude".to_string(),
            )
        } else if banded == WellClass::Negative {
            if sheet.impossible_cq {
                (WellClass::Negative, "impossible Cq".to_string())
            } else {
                (WellClass::Negative, "Does not meet criteria".to_string())
            }
        } else {
            (banded, format!("Score {net:.0}"))
        }
    };

    Classification::Rule {
        class,
        summary,
        score: net,
        reason,
    }
}

/// Strict 3-class operational view, independent of the scored class.
pub fn strict_summary(fit: &FitResult, flags: AnomalyFlags, bands: &ClassBands) -> Summary3 {
    let cq_absent = fit.model_cq().is_none();
    if fit.l < bands.summary_neg_amp || !fit.is_good_scurve || cq_absent {
        return Summary3::Neg;
    }
    if fit.is_good_scurve && fit.l > bands.summary_pos_amp && flags.is_clean() {
        return Summary3::Pos;
    }
    Summary3::Redo
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage7_classify.rs"]
mod tests;
