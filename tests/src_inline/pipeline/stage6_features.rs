
use super::*;
use crate::fit::sigmoid::{Params, fit_trace, sigmoid};
use crate::model::weights::FitGates;
use crate::pipeline::stage5_quant::Quantification;

fn synth_trace(l: f64, k: f64, x0: f64, b: f64, n: u32) -> Trace {
    let p = Params { l, k, x0, b };
    let cycles: Vec<u32> = (1..=n).collect();
    let rfu: Vec<f64> = cycles.iter().map(|c| sigmoid(*c as f64, &p)).collect();
    Trace {
        well_id: "A1".to_string(),
        channel: "FAM".to_string(),
        cycles,
        rfu,
    }
}

#[test]
fn good_sigmoid_features() {
    let trace = synth_trace(1200.0, 0.45, 22.0, 50.0, 40);
    let fit = fit_trace(&trace.cycles, &trace.rfu, &FitGates::default()).expect("fit");
    let quant = Quantification {
        cqj: Some(21.8),
        calcj: Some(27500.0),
    };

    let features = extract(&trace, &fit, &quant, 3000.0);
    assert_eq!(features.shape_class, ShapeClass::SCurve);
    assert_eq!(features.cqj, 21.8);
    assert_eq!(features.calcj, 27500.0);
    assert!(features.baseline_stability > 0.9);
    assert!(features.plateau_quality > 0.8);
    assert!(features.trend_consistency > 0.95);
    assert!(features.noise_level < 0.2);
    assert_eq!(features.dropout_count, 0.0);
    assert!(features.background_separation > 0.9);
    assert_eq!(features.min_cycle, 1.0);
    assert_eq!(features.max_cycle, 40.0);
}

#[test]
fn absent_quant_encodes_as_zero() {
    let trace = synth_trace(1200.0, 0.45, 22.0, 50.0, 40);
    let fit = fit_trace(&trace.cycles, &trace.rfu, &FitGates::default()).expect("fit");
    let features = extract(&trace, &fit, &Quantification::default(), 3000.0);
    assert_eq!(features.cqj, 0.0);
    assert_eq!(features.calcj, 0.0);
}

#[test]
fn flat_trace_classified_flat() {
    let trace = synth_trace(5.0, 0.02, 25.0, 100.0, 40);
    let fit = fit_trace(&trace.cycles, &trace.rfu, &FitGates::default()).expect("fit");
    let features = extract(&trace, &fit, &Quantification::default(), 3000.0);
    assert_eq!(features.shape_class, ShapeClass::Flat);
}

#[test]
fn straight_line_classified_linear() {
    let cycles: Vec<u32> = (1..=40).collect();
    let rfu: Vec<f64> = cycles.iter().map(|c| 10.0 + 5.0 * *c as f64).collect();
    let trace = Trace {
        well_id: "A1".to_string(),
        channel: "FAM".to_string(),
        cycles,
        rfu,
    };
    let fit = fit_trace(&trace.cycles, &trace.rfu, &FitGates::default()).expect("fit");
    let features = extract(&trace, &fit, &Quantification::default(), 3000.0);
    assert!(
        features.shape_class == ShapeClass::Linear
            || features.shape_class == ShapeClass::SCurve
    );
}

#[test]
fn dropouts_counted() {
    let mut trace = synth_trace(1200.0, 0.45, 22.0, 50.0, 40);
    trace.rfu[10] = f64::NAN;
    trace.rfu[11] = f64::NAN;
    let fit = fit_trace(&trace.cycles, &trace.rfu, &FitGates::default()).expect("fit");
    let features = extract(&trace, &fit, &Quantification::default(), 3000.0);
    assert_eq!(features.dropout_count, 2.0);
}

#[test]
fn spiky_trace_scores_noise() {
    let mut trace = synth_trace(1000.0, 0.5, 22.0, 50.0, 40);
    for (i, v) in trace.rfu.iter_mut().enumerate() {
        if i % 2 == 0 {
            *v += 180.0;
        }
    }
    let fit = fit_trace(&trace.cycles, &trace.rfu, &FitGates::default()).expect("fit");
    let features = extract(&trace, &fit, &Quantification::default(), 3000.0);
    assert!(features.oscillation_score > 0.5);
    assert!(features.noise_level > 0.3);
}
