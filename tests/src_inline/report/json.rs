
use super::*;
use crate::model::classes::{Classification, Summary3, WellClass};
use crate::model::fit::{FitResult, RejectionSet};
use crate::model::thresholds::{ChannelThreshold, Scale, Strategy, ThresholdSource};
use crate::pipeline::stage8_report::{ClassificationOut, WellResult};
use tempfile::tempdir;

fn sample_result() -> RunResult {
    let fit = FitResult {
        l: 1200.0,
        k: 0.45,
        x0: 22.0,
        b: 50.0,
        r2: 0.996,
        rmse: 2.0,
        snr: 18.0,
        plateau_level: 1250.0,
        exp_growth_rate: 135.0,
        dynamic_range: 1200.0,
        efficiency: 0.57,
        is_good_scurve: true,
        rejection_reasons: RejectionSet::empty(),
    };
    let classification = Classification::Rule {
        class: WellClass::StrongPositive,
        summary: Summary3::Pos,
        score: 85.0,
        reason: "Score 85".to_string(),
    };
    RunResult {
        schema_version: crate::pipeline::stage8_report::SCHEMA_VERSION,
        run_id: "r1".to_string(),
        strategy: "linear_exp_phase".to_string(),
        scale: "linear".to_string(),
        thresholds: vec![ChannelThreshold {
            channel: "FAM".to_string(),
            scale: Scale::Linear,
            value: 650.0,
            strategy: Strategy::LinearExpPhase,
            source: ThresholdSource::Computed { fallback: false },
        }],
        channel_errors: Default::default(),
        wells: vec![WellResult {
            well_id: "A1".to_string(),
            channel: "FAM".to_string(),
            sample_name: "Patient-1".to_string(),
            role: "UNKNOWN".to_string(),
            test_code: "FLUA".to_string(),
            fit,
            anomalies: Vec::new(),
            features_30: vec![0.0; 30],
            threshold: None,
            cqj: Some(21.9),
            calcj: None,
            classification: ClassificationOut::from_classification(&classification),
            error: None,
        }],
    }
}

#[test]
fn artifact_round_trips() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("run.json");
    let result = sample_result();

    write_run(&path, &result).expect("write");
    let reloaded = read_run(&path).expect("read");
    assert_eq!(reloaded, result);
}

#[test]
fn tampered_artifact_fails_checksum() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("run.json");
    write_run(&path, &sample_result()).expect("write");

    let text = std::fs::read_to_string(&path).expect("read");
    let tampered = text.replace("\"cqj\": 21.9", "\"cqj\": 5.0");
    assert_ne!(text, tampered);
    std::fs::write(&path, tampered).expect("write");

    assert!(matches!(
        read_run(&path),
        Err(ArtifactError::ChecksumMismatch { .. })
    ));
}

#[test]
fn wells_csv_has_header_and_rows() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("wells.csv");
    write_wells_csv(&path, &sample_result()).expect("write");

    let text = std::fs::read_to_string(&path).expect("read");
    let mut lines = text.lines();
    let header = lines.next().expect("header");
    assert!(header.starts_with("well_id,channel,sample_name"));
    let row = lines.next().expect("row");
    assert!(row.contains("STRONG_POSITIVE"));
    assert!(row.contains("N/A"), "absent calcj serializes as N/A");
}
