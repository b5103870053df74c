/// Tunables for the weighted rule classifier. The table is cumulative: a
/// well with r2 = 0.996 collects both the `r2_excellent` and `r2_good`
/// rows.
#[derive(Debug, Clone, Copy)]
pub struct RuleWeights {
    pub r2_excellent_cut: f64,
    pub r2_excellent: f64,
    pub r2_good_cut: f64,
    pub r2_good: f64,
    pub k_steep_cut: f64,
    pub k_steep: f64,
    pub snr_high_cut: f64,
    pub snr_high: f64,
    pub snr_mid_cut: f64,
    pub snr_mid: f64,
    pub snr_poor_cut: f64,
    pub snr_poor: f64,
    pub amp_strong_cut: f64,
    pub amp_strong: f64,
    pub amp_low_cut: f64,
    pub amp_low: f64,
    pub midpoint_min: f64,
    pub midpoint_max: f64,
    pub impossible_cq: f64,
    pub shape_anomaly: f64,
    pub artifact_k_cut: f64,
    pub artifact_snr_cut: f64,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            r2_excellent_cut: 0.95,
            r2_excellent: 20.0,
            r2_good_cut: 0.85,
            r2_good: 10.0,
            k_steep_cut: 0.4,
            k_steep: 15.0,
            snr_high_cut: 15.0,
            snr_high: 15.0,
            snr_mid_cut: 8.0,
            snr_mid: 10.0,
            snr_poor_cut: 2.0,
            snr_poor: 15.0,
            amp_strong_cut: 1000.0,
            amp_strong: 15.0,
            amp_low_cut: 100.0,
            amp_low: 20.0,
            midpoint_min: 5.0,
            midpoint_max: 50.0,
            impossible_cq: 25.0,
            shape_anomaly: 20.0,
            artifact_k_cut: 1.0,
            artifact_snr_cut: 5.0,
        }
    }
}

/// Banded cuts applied to the net score, plus the REDO forcing window and
/// the strict 3-class summary cutoffs.
#[derive(Debug, Clone, Copy)]
pub struct ClassBands {
    pub strong: f64,
    pub positive: f64,
    pub weak: f64,
    pub indeterminate: f64,
    pub redo_amp_min: f64,
    pub redo_amp_max: f64,
    pub summary_neg_amp: f64,
    pub summary_pos_amp: f64,
}

impl Default for ClassBands {
    fn default() -> Self {
        Self {
            strong: 80.0,
            positive: 50.0,
            weak: 25.0,
            indeterminate: 10.0,
            redo_amp_min: 400.0,
            redo_amp_max: 500.0,
            summary_neg_amp: 400.0,
            summary_pos_amp: 500.0,
        }
    }
}

/// Good-S-curve gate limits (§ curve fitter contract).
#[derive(Debug, Clone, Copy)]
pub struct FitGates {
    pub r2_min: f64,
    pub r2_min_short: f64,
    pub short_trace_len: usize,
    pub k_min: f64,
    pub amp_abs_floor: f64,
    pub amp_range_frac: f64,
    pub amp_min: f64,
    pub midline_cross_min: f64,
    pub plateau_min: f64,
    pub snr_min: f64,
    pub growth_min: f64,
}

impl Default for FitGates {
    fn default() -> Self {
        Self {
            r2_min: 0.9,
            r2_min_short: 0.85,
            short_trace_len: 20,
            k_min: 0.05,
            amp_abs_floor: 50.0,
            amp_range_frac: 0.3,
            amp_min: 100.0,
            midline_cross_min: 5.0,
            plateau_min: 50.0,
            snr_min: 3.0,
            growth_min: 5.0,
        }
    }
}

/// Anomaly detector tunables. `early_plateau_eps` is the fraction of the
/// fitted maximum slope under which the curve counts as flat.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyConfig {
    pub low_amp_abs: f64,
    pub low_amp_expected_frac: f64,
    pub default_expected_range: f64,
    pub early_plateau_eps: f64,
    pub early_plateau_run: usize,
    pub baseline_std_abs: f64,
    pub baseline_std_frac: f64,
    pub negative_frac: f64,
    pub uniform_offset_frac: f64,
    pub high_noise_frac: f64,
    pub decreasing_frac: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            low_amp_abs: 50.0,
            low_amp_expected_frac: 0.10,
            default_expected_range: 1000.0,
            early_plateau_eps: 0.05,
            early_plateau_run: 3,
            baseline_std_abs: 50.0,
            baseline_std_frac: 0.15,
            negative_frac: 0.10,
            uniform_offset_frac: 0.90,
            high_noise_frac: 0.30,
            decreasing_frac: 0.70,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/weights.rs"]
mod tests;
