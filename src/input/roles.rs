use std::sync::OnceLock;

use regex::Regex;

use crate::model::trace::ControlRole;

fn suffix_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([HML])-?\d*$").expect("hardcoded pattern compiles"))
}

fn role_from_letter(letter: &str) -> ControlRole {
    match letter {
        "H" => ControlRole::ControlH,
        "M" => ControlRole::ControlM,
        "L" => ControlRole::ControlL,
        _ => ControlRole::Unknown,
    }
}

/// Derive the well role from its sample name. Patterns are tried in order
/// and the first match wins:
/// 1. trailing `H`/`M`/`L` with an optional numeric replicate (`...H-2`)
/// 2. the literal substring `NTC`
/// 3. an embedded `H-` / `M-` / `L-` marker
pub fn detect_role(sample_name: &str) -> ControlRole {
    let name = sample_name.trim();
    if let Some(caps) = suffix_pattern().captures(name) {
        return role_from_letter(&caps[1]);
    }
    if name.contains("NTC") {
        return ControlRole::Ntc;
    }
    for (marker, role) in [
        ("H-", ControlRole::ControlH),
        ("M-", ControlRole::ControlM),
        ("L-", ControlRole::ControlL),
    ] {
        if name.contains(marker) {
            return role;
        }
    }
    ControlRole::Unknown
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/roles.rs"]
mod tests;
