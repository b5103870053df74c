use serde::{Deserialize, Serialize};

/// Well role derived from `sample_name` at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ControlRole {
    Unknown,
    ControlH,
    ControlM,
    ControlL,
    Ntc,
}

impl ControlRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlRole::Unknown => "UNKNOWN",
            ControlRole::ControlH => "CONTROL_H",
            ControlRole::ControlM => "CONTROL_M",
            ControlRole::ControlL => "CONTROL_L",
            ControlRole::Ntc => "NTC",
        }
    }

    pub fn is_control(&self) -> bool {
        !matches!(self, ControlRole::Unknown)
    }

    pub fn is_concentration_control(&self) -> bool {
        matches!(
            self,
            ControlRole::ControlH | ControlRole::ControlM | ControlRole::ControlL
        )
    }
}

/// One fluorescence trace. Immutable after stage1 validation: cycles are
/// strictly increasing and rfu has the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub well_id: String,
    pub channel: String,
    pub cycles: Vec<u32>,
    pub rfu: Vec<f64>,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn valid_points(&self) -> usize {
        self.rfu.iter().filter(|v| v.is_finite()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMeta {
    pub well_id: String,
    pub channel: String,
    pub sample_name: String,
    pub test_code: String,
    pub role: ControlRole,
}

/// Deterministic plate ordering: row letters, then column number, then
/// channel. `A2` sorts before `A10`, single-letter rows before the
/// double-letter rows of high-density plates; unparseable ids sort after
/// parseable ones by raw string.
pub fn plate_order_key(well_id: &str) -> (bool, usize, String, u32) {
    let row: String = well_id.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let col_str: String = well_id.chars().skip(row.len()).collect();
    match col_str.parse::<u32>() {
        Ok(col) if !row.is_empty() => (false, row.len(), row.to_ascii_uppercase(), col),
        _ => (true, 0, well_id.to_string(), 0),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/trace.rs"]
mod tests;
