
use super::*;

fn sample_vector() -> FeatureVector {
    FeatureVector {
        amplitude: 1200.0,
        r2: 0.996,
        steepness: 0.45,
        snr: 18.0,
        midpoint: 22.0,
        baseline: 50.0,
        cq_value: 22.0,
        cqj: 21.8,
        calcj: 27500.0,
        rmse: 3.1,
        min_rfu: 48.0,
        max_rfu: 1260.0,
        mean_rfu: 610.0,
        std_rfu: 520.0,
        min_cycle: 1.0,
        max_cycle: 40.0,
        dynamic_range: 1212.0,
        efficiency: 0.57,
        shape_class: ShapeClass::SCurve,
        baseline_stability: 0.98,
        exp_phase_sharpness: 0.22,
        plateau_quality: 0.95,
        curve_symmetry: 0.92,
        noise_level: 0.02,
        trend_consistency: 0.97,
        spike_count: 0.0,
        oscillation_score: 0.05,
        dropout_count: 0.0,
        relative_amplitude: 0.4,
        background_separation: 0.96,
    }
}

#[test]
fn thirty_names_in_contract_order() {
    assert_eq!(FEATURE_NAMES.len(), 30);
    assert_eq!(FEATURE_NAMES[0], "amplitude");
    assert_eq!(FEATURE_NAMES[6], "cq_value");
    assert_eq!(FEATURE_NAMES[7], "cqj");
    assert_eq!(FEATURE_NAMES[8], "calcj");
    assert_eq!(FEATURE_NAMES[17], "efficiency");
    assert_eq!(FEATURE_NAMES[18], "shape_class");
    assert_eq!(FEATURE_NAMES[29], "background_separation");
}

#[test]
fn array_matches_field_order() {
    let v = sample_vector();
    let arr = v.to_array();
    assert_eq!(arr.len(), 30);
    assert_eq!(arr[0], v.amplitude);
    assert_eq!(arr[4], v.midpoint);
    assert_eq!(arr[7], v.cqj);
    assert_eq!(arr[18], ShapeClass::SCurve.encoded());
    assert_eq!(arr[29], v.background_separation);
}

#[test]
fn shape_class_encoding_is_fixed() {
    assert_eq!(ShapeClass::Flat.encoded(), 0.0);
    assert_eq!(ShapeClass::Linear.encoded(), 1.0);
    assert_eq!(ShapeClass::SCurve.encoded(), 2.0);
    assert_eq!(ShapeClass::Exponential.encoded(), 3.0);
    assert_eq!(ShapeClass::Irregular.encoded(), 4.0);
    assert_eq!(ShapeClass::SCurve.as_str(), "s-curve");
}
