use serde::{Deserialize, Serialize};

/// Fixed feature order consumed by every classifier. The order is part of
/// the wire contract: never reorder, never insert in the middle.
pub const FEATURE_NAMES: [&str; 30] = [
    "amplitude",
    "r2",
    "steepness",
    "snr",
    "midpoint",
    "baseline",
    "cq_value",
    "cqj",
    "calcj",
    "rmse",
    "min_rfu",
    "max_rfu",
    "mean_rfu",
    "std_rfu",
    "min_cycle",
    "max_cycle",
    "dynamic_range",
    "efficiency",
    "shape_class",
    "baseline_stability",
    "exp_phase_sharpness",
    "plateau_quality",
    "curve_symmetry",
    "noise_level",
    "trend_consistency",
    "spike_count",
    "oscillation_score",
    "dropout_count",
    "relative_amplitude",
    "background_separation",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeClass {
    Flat,
    Linear,
    SCurve,
    Exponential,
    Irregular,
}

impl ShapeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeClass::Flat => "flat",
            ShapeClass::Linear => "linear",
            ShapeClass::SCurve => "s-curve",
            ShapeClass::Exponential => "exponential",
            ShapeClass::Irregular => "irregular",
        }
    }

    pub fn encoded(&self) -> f64 {
        match self {
            ShapeClass::Flat => 0.0,
            ShapeClass::Linear => 1.0,
            ShapeClass::SCurve => 2.0,
            ShapeClass::Exponential => 3.0,
            ShapeClass::Irregular => 4.0,
        }
    }
}

/// The 30-feature view of one (well, channel). 18 numerical features from
/// the fit and quantification, 12 visual/pattern features from the raw
/// trace. Absent cqj/calcj encode as 0.0 here; the run result keeps null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub amplitude: f64,
    pub r2: f64,
    pub steepness: f64,
    pub snr: f64,
    pub midpoint: f64,
    pub baseline: f64,
    pub cq_value: f64,
    pub cqj: f64,
    pub calcj: f64,
    pub rmse: f64,
    pub min_rfu: f64,
    pub max_rfu: f64,
    pub mean_rfu: f64,
    pub std_rfu: f64,
    pub min_cycle: f64,
    pub max_cycle: f64,
    pub dynamic_range: f64,
    pub efficiency: f64,
    pub shape_class: ShapeClass,
    pub baseline_stability: f64,
    pub exp_phase_sharpness: f64,
    pub plateau_quality: f64,
    pub curve_symmetry: f64,
    pub noise_level: f64,
    pub trend_consistency: f64,
    pub spike_count: f64,
    pub oscillation_score: f64,
    pub dropout_count: f64,
    pub relative_amplitude: f64,
    pub background_separation: f64,
}

impl FeatureVector {
    /// Flatten into the contract order of `FEATURE_NAMES`.
    pub fn to_array(&self) -> [f64; 30] {
        [
            self.amplitude,
            self.r2,
            self.steepness,
            self.snr,
            self.midpoint,
            self.baseline,
            self.cq_value,
            self.cqj,
            self.calcj,
            self.rmse,
            self.min_rfu,
            self.max_rfu,
            self.mean_rfu,
            self.std_rfu,
            self.min_cycle,
            self.max_cycle,
            self.dynamic_range,
            self.efficiency,
            self.shape_class.encoded(),
            self.baseline_stability,
            self.exp_phase_sharpness,
            self.plateau_quality,
            self.curve_symmetry,
            self.noise_level,
            self.trend_consistency,
            self.spike_count,
            self.oscillation_score,
            self.dropout_count,
            self.relative_amplitude,
            self.background_separation,
        ]
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/features.rs"]
mod tests;
