use serde::{Deserialize, Serialize};

/// Closed set of per-trace anomalies. The empty set means "clean".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnomalyFlags {
    bits: u16,
}

impl AnomalyFlags {
    pub const LOW_AMPLITUDE: u16 = 0b0000_0001;
    pub const EARLY_PLATEAU: u16 = 0b0000_0010;
    pub const UNSTABLE_BASELINE: u16 = 0b0000_0100;
    pub const NEGATIVE_AMPLIFICATION: u16 = 0b0000_1000;
    pub const NEGATIVE_RFU_VALUES: u16 = 0b0001_0000;
    pub const HIGH_NOISE: u16 = 0b0010_0000;
    pub const INSUFFICIENT_DATA: u16 = 0b0100_0000;
    pub const INSUFFICIENT_VALID_DATA: u16 = 0b1000_0000;

    const NAMED: [(&'static str, u16); 8] = [
        ("LOW_AMPLITUDE", Self::LOW_AMPLITUDE),
        ("EARLY_PLATEAU", Self::EARLY_PLATEAU),
        ("UNSTABLE_BASELINE", Self::UNSTABLE_BASELINE),
        ("NEGATIVE_AMPLIFICATION", Self::NEGATIVE_AMPLIFICATION),
        ("NEGATIVE_RFU_VALUES", Self::NEGATIVE_RFU_VALUES),
        ("HIGH_NOISE", Self::HIGH_NOISE),
        ("INSUFFICIENT_DATA", Self::INSUFFICIENT_DATA),
        ("INSUFFICIENT_VALID_DATA", Self::INSUFFICIENT_VALID_DATA),
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

    pub fn is_clean(&self) -> bool {
        self.bits == 0
    }

    pub fn count(&self) -> u32 {
        self.bits.count_ones()
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

#[cfg(test)]
#[path = "../../tests/src_inline/model/anomalies.rs"]
mod tests;
