use serde::{Deserialize, Serialize};

/// Reasons a fitted trace failed the good-S-curve gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RejectionSet {
    bits: u16,
}

impl RejectionSet {
    pub const FIT_FAILED: u16 = 0b0_0000_0001;
    pub const LOW_R2: u16 = 0b0_0000_0010;
    pub const SHALLOW_CURVE: u16 = 0b0_0000_0100;
    pub const AMPLITUDE_BELOW_RANGE: u16 = 0b0_0000_1000;
    pub const EARLY_MIDLINE_CROSS: u16 = 0b0_0001_0000;
    pub const LOW_AMPLITUDE: u16 = 0b0_0010_0000;
    pub const LOW_PLATEAU: u16 = 0b0_0100_0000;
    pub const LOW_SNR: u16 = 0b0_1000_0000;
    pub const SLOW_GROWTH: u16 = 0b1_0000_0000;

    const NAMED: [(&'static str, u16); 9] = [
        ("FIT_FAILED", Self::FIT_FAILED),
        ("LOW_R2", Self::LOW_R2),
        ("SHALLOW_CURVE", Self::SHALLOW_CURVE),
        ("AMPLITUDE_BELOW_RANGE", Self::AMPLITUDE_BELOW_RANGE),
        ("EARLY_MIDLINE_CROSS", Self::EARLY_MIDLINE_CROSS),
        ("LOW_AMPLITUDE", Self::LOW_AMPLITUDE),
        ("LOW_PLATEAU", Self::LOW_PLATEAU),
        ("LOW_SNR", Self::LOW_SNR),
        ("SLOW_GROWTH", Self::SLOW_GROWTH),
    ];

    pub fn empty() -> Self {
        Self { bits: 0 }
    }

    pub fn set(&mut self, bit: u16) {
        self.bits |= bit;
    }

    pub fn contains(&self, bit: u16) -> bool {
        self.bits & bit != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(_, bit)| self.contains(*bit))
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn to_csv(&self) -> String {
        if self.bits == 0 {
            return ".".to_string();
        }
        self.names().join(",")
    }
}

/// Output of the per-trace sigmoid fit:
/// `f(x) = b + l / (1 + exp(-k * (x - x0)))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub l: f64,
    pub k: f64,
    pub x0: f64,
    pub b: f64,
    pub r2: f64,
    pub rmse: f64,
    pub snr: f64,
    pub plateau_level: f64,
    pub exp_growth_rate: f64,
    pub dynamic_range: f64,
    pub efficiency: f64,
    pub is_good_scurve: bool,
    pub rejection_reasons: RejectionSet,
}

impl FitResult {
    /// A placeholder for traces the solver could not fit at all. Parameters
    /// are zeroed so downstream metrics stay finite.
    pub fn failed(dynamic_range: f64, reasons: RejectionSet) -> Self {
        Self {
            l: 0.0,
            k: 0.0,
            x0: 0.0,
            b: 0.0,
            r2: 0.0,
            rmse: 0.0,
            snr: 0.0,
            plateau_level: 0.0,
            exp_growth_rate: 0.0,
            dynamic_range,
            efficiency: 0.0,
            is_good_scurve: false,
            rejection_reasons: reasons,
        }
    }

    /// Cycle at which the fitted model crosses its own midline `b + l/2`.
    pub fn model_cq(&self) -> Option<f64> {
        if self.is_good_scurve { Some(self.x0) } else { None }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/fit.rs"]
mod tests;
