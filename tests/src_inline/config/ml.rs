
use super::*;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().expect("tempdir");
    let settings = load_settings(&dir.path().join("ml.toml")).expect("load");
    assert!(settings.global_enabled);
    assert_eq!(settings.min_training_examples, 10);
    assert!(settings.rules.is_empty());
}

#[test]
fn prediction_gate_has_a_hard_floor() {
    let mut settings = MlSettings::default();
    settings.min_training_examples = 5;
    assert_eq!(settings.prediction_gate(), PREDICTION_TRAINING_FLOOR);
    settings.min_training_examples = 35;
    assert_eq!(settings.prediction_gate(), 35);
}

#[test]
fn per_channel_rule_overrides() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ml.toml");
    std::fs::write(
        &path,
        r#"
global_enabled = true

[[rule]]
pathogen = "NGON"
channel = "FAM"
enabled = false
min_confidence = 0.9
"#,
    )
    .expect("write");

    let settings = load_settings(&path).expect("load");
    let ngon = settings.effective("NGON", "FAM");
    assert!(!ngon.enabled);
    assert_eq!(ngon.min_confidence, 0.9);

    let other = settings.effective("FLUA", "FAM");
    assert!(other.enabled);
    assert_eq!(other.min_confidence, 0.7);
}

#[test]
fn global_switch_disables_everything() {
    let mut settings = MlSettings::default();
    settings.global_enabled = false;
    assert!(!settings.effective("NGON", "FAM").enabled);
}
