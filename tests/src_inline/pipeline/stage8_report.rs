
use super::*;
use crate::config::EngineConfig;
use crate::fit::sigmoid::{Params, sigmoid};
use crate::input::{RunInput, StrategySelection, WellInput};
use crate::pipeline::stage1_load::run_stage1_load;
use crate::pipeline::stage2_fit::run_stage2_fit;
use crate::pipeline::stage3_anomalies::run_stage3_anomalies;
use crate::pipeline::stage4_thresholds::run_stage4_thresholds;
use crate::pipeline::stage5_quant::run_stage5_quant;
use crate::pipeline::stage6_features::run_stage6_features;
use crate::pipeline::stage7_classify::run_stage7_classify;

fn sigmoid_rfu(l: f64, k: f64, x0: f64, b: f64, n: u32) -> Vec<f64> {
    let p = Params { l, k, x0, b };
    (1..=n).map(|c| sigmoid(c as f64, &p)).collect()
}

fn build_result() -> RunResult {
    let config = EngineConfig::default();
    let ctx = run_stage1_load(
        RunInput {
            run_id: "r9".to_string(),
            wells: vec![
                WellInput {
                    well_id: "A1".to_string(),
                    channel: "FAM".to_string(),
                    cycles: (1..=40).collect(),
                    rfu: sigmoid_rfu(1200.0, 0.45, 22.0, 50.0, 40),
                    sample_name: "Patient-1".to_string(),
                    test_code: "FLUA".to_string(),
                },
                WellInput {
                    well_id: "A2".to_string(),
                    channel: "FAM".to_string(),
                    cycles: (1..=40).collect(),
                    rfu: vec![10.0; 40],
                    sample_name: "Patient-2".to_string(),
                    test_code: "FLUA".to_string(),
                },
            ],
            strategy_selection: StrategySelection {
                strategy_id: "linear_exp_phase".to_string(),
                scale: "linear".to_string(),
                manual_overrides: None,
            },
        },
        &config,
    )
    .expect("load");
    let fits = run_stage2_fit(&ctx);
    let anomalies = run_stage3_anomalies(&ctx, &fits, &config);
    let thresholds = run_stage4_thresholds(&ctx, &fits, &config);
    let quants = run_stage5_quant(&ctx, &thresholds, &config);
    let features = run_stage6_features(&ctx, &fits, &quants, &config);
    let classify = run_stage7_classify(&ctx, &fits, &anomalies);
    run_stage8_report(&ctx, &fits, &anomalies, &thresholds, &quants, &features, &classify)
}

#[test]
fn result_carries_contract_fields() {
    let result = build_result();
    assert_eq!(result.schema_version, SCHEMA_VERSION);
    assert_eq!(result.run_id, "r9");
    assert_eq!(result.wells.len(), 2);

    let well = &result.wells[0];
    assert_eq!(well.well_id, "A1");
    assert_eq!(well.features_30.len(), 30);
    assert!(well.threshold.is_some());
    assert!(well.cqj.is_some());
    assert_eq!(well.classification.method, "rule");
    assert_eq!(well.classification.confidence, None);
}

#[test]
fn serialization_is_deterministic() {
    let a = serde_json::to_string(&build_result()).expect("json");
    let b = serde_json::to_string(&build_result()).expect("json");
    assert_eq!(a, b);
}

#[test]
fn classification_out_round_trips_expert() {
    let out = ClassificationOut {
        class_7: "INDETERMINATE".to_string(),
        summary_3: "REDO".to_string(),
        method: "expert".to_string(),
        confidence: None,
        model_version: None,
        reason: "Expert review".to_string(),
    };
    let c = out.to_classification().expect("classification");
    assert!(c.is_expert());
    assert_eq!(c.class(), WellClass::Indeterminate);

    let back = ClassificationOut::from_classification(&c);
    assert_eq!(back, out);
}

#[test]
fn class_counts_cover_all_seven() {
    let result = build_result();
    let counts = result.class_counts();
    assert_eq!(counts.len(), 7);
    let total: usize = counts.values().sum();
    assert_eq!(total, result.wells.len());
}
