
use super::*;
use crate::config::EngineConfig;
use crate::fit::sigmoid::{Params, sigmoid};
use crate::input::{RunInput, StrategySelection, WellInput};
use crate::pipeline::stage1_load::run_stage1_load;

fn sigmoid_rfu(l: f64, k: f64, x0: f64, b: f64, n: u32) -> Vec<f64> {
    let p = Params { l, k, x0, b };
    (1..=n).map(|c| sigmoid(c as f64, &p)).collect()
}

fn ctx_with(wells: Vec<WellInput>) -> RunCtx {
    run_stage1_load(
        RunInput {
            run_id: "r1".to_string(),
            wells,
            strategy_selection: StrategySelection {
                strategy_id: "linear_exp_phase".to_string(),
                scale: "linear".to_string(),
                manual_overrides: None,
            },
        },
        &EngineConfig::default(),
    )
    .expect("load")
}

#[test]
fn fits_all_wells_in_order() {
    let ctx = ctx_with(vec![
        WellInput {
            well_id: "A1".to_string(),
            channel: "FAM".to_string(),
            cycles: (1..=40).collect(),
            rfu: sigmoid_rfu(1200.0, 0.45, 22.0, 50.0, 40),
            sample_name: "s1".to_string(),
            test_code: "FLUA".to_string(),
        },
        WellInput {
            well_id: "A2".to_string(),
            channel: "FAM".to_string(),
            cycles: (1..=40).collect(),
            rfu: sigmoid_rfu(20.0, 0.02, 25.0, 100.0, 40),
            sample_name: "s2".to_string(),
            test_code: "FLUA".to_string(),
        },
    ]);

    let fits = run_stage2_fit(&ctx);
    assert_eq!(fits.fits.len(), 2);
    assert!(fits.fitted(0) && fits.fitted(1));
    assert!(fits.fits[0].is_good_scurve);
    assert!(!fits.fits[1].is_good_scurve);
}

#[test]
fn short_traces_carry_error_codes() {
    let ctx = ctx_with(vec![WellInput {
        well_id: "A1".to_string(),
        channel: "FAM".to_string(),
        cycles: vec![1, 2, 3],
        rfu: vec![1.0, 2.0, 3.0],
        sample_name: "s".to_string(),
        test_code: "FLUA".to_string(),
    }]);

    let fits = run_stage2_fit(&ctx);
    assert!(!fits.fitted(0));
    assert_eq!(fits.errors[0], Some("FIT_INSUFFICIENT_DATA"));
    assert!(!fits.fits[0].is_good_scurve);
}
