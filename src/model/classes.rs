use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WellClass {
    StrongPositive,
    Positive,
    WeakPositive,
    Indeterminate,
    Suspicious,
    Redo,
    Negative,
}

impl WellClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            WellClass::StrongPositive => "STRONG_POSITIVE",
            WellClass::Positive => "POSITIVE",
            WellClass::WeakPositive => "WEAK_POSITIVE",
            WellClass::Indeterminate => "INDETERMINATE",
            WellClass::Suspicious => "SUSPICIOUS",
            WellClass::Redo => "REDO",
            WellClass::Negative => "NEGATIVE",
        }
    }

    pub fn ordered() -> &'static [WellClass] {
        &[
            WellClass::StrongPositive,
            WellClass::Positive,
            WellClass::WeakPositive,
            WellClass::Indeterminate,
            WellClass::Suspicious,
            WellClass::Redo,
            WellClass::Negative,
        ]
    }

    pub fn from_str(s: &str) -> Option<WellClass> {
        WellClass::ordered()
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
    }

    /// Stable index used as the class label in training matrices.
    pub fn label(&self) -> i32 {
        WellClass::ordered()
            .iter()
            .position(|c| c == self)
            .unwrap_or(6) as i32
    }

    pub fn from_label(label: i32) -> WellClass {
        WellClass::ordered()
            .get(label.max(0) as usize)
            .copied()
            .unwrap_or(WellClass::Negative)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Summary3 {
    Pos,
    Neg,
    Redo,
}

impl Summary3 {
    pub fn as_str(&self) -> &'static str {
        match self {
            Summary3::Pos => "POS",
            Summary3::Neg => "NEG",
            Summary3::Redo => "REDO",
        }
    }
}

/// One classification per (well, channel). Expert labels take precedence over
/// ML predictions, which take precedence over the rule scorer; the precedence
/// is enforced by `reduce`, never by callers mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Classification {
    Rule {
        class: WellClass,
        summary: Summary3,
        score: f64,
        reason: String,
    },
    Ml {
        class: WellClass,
        summary: Summary3,
        confidence: f64,
        model_version: String,
        reason: String,
    },
    Expert {
        class: WellClass,
        summary: Summary3,
        reason: String,
    },
}

impl Classification {
    pub fn class(&self) -> WellClass {
        match self {
            Classification::Rule { class, .. }
            | Classification::Ml { class, .. }
            | Classification::Expert { class, .. } => *class,
        }
    }

    pub fn summary(&self) -> Summary3 {
        match self {
            Classification::Rule { summary, .. }
            | Classification::Ml { summary, .. }
            | Classification::Expert { summary, .. } => *summary,
        }
    }

    pub fn method_str(&self) -> &'static str {
        match self {
            Classification::Rule { .. } => "rule",
            Classification::Ml { .. } => "ml",
            Classification::Expert { .. } => "expert",
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            Classification::Ml { confidence, .. } => Some(*confidence),
            _ => None,
        }
    }

    pub fn model_version(&self) -> Option<&str> {
        match self {
            Classification::Ml { model_version, .. } => Some(model_version.as_str()),
            _ => None,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Classification::Rule { reason, .. }
            | Classification::Ml { reason, .. }
            | Classification::Expert { reason, .. } => reason.as_str(),
        }
    }

    pub fn is_expert(&self) -> bool {
        matches!(self, Classification::Expert { .. })
    }

    /// Replace `current` with `candidate` only when precedence allows it.
    /// An expert label is never displaced; ML displaces rule output.
    pub fn reduce(current: Classification, candidate: Classification) -> Classification {
        match (&current, &candidate) {
            (Classification::Expert { .. }, _) => current,
            (_, Classification::Expert { .. }) => candidate,
            (Classification::Ml { .. }, Classification::Rule { .. }) => current,
            _ => candidate,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/classes.rs"]
mod tests;
