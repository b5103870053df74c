
use super::*;

#[test]
fn default_bands_match_contract() {
    let bands = ClassBands::default();
    assert_eq!(bands.strong, 80.0);
    assert_eq!(bands.positive, 50.0);
    assert_eq!(bands.weak, 25.0);
    assert_eq!(bands.indeterminate, 10.0);
    assert_eq!(bands.redo_amp_min, 400.0);
    assert_eq!(bands.redo_amp_max, 500.0);
}

#[test]
fn default_weights_match_contract() {
    let w = RuleWeights::default();
    assert_eq!(w.r2_excellent, 20.0);
    assert_eq!(w.r2_good, 10.0);
    assert_eq!(w.k_steep, 15.0);
    assert_eq!(w.snr_high, 15.0);
    assert_eq!(w.snr_mid, 10.0);
    assert_eq!(w.snr_poor, 15.0);
    assert_eq!(w.amp_strong, 15.0);
    assert_eq!(w.amp_low, 20.0);
    assert_eq!(w.impossible_cq, 25.0);
    assert_eq!(w.shape_anomaly, 20.0);
}

#[test]
fn fit_gates_match_contract() {
    let g = FitGates::default();
    assert_eq!(g.r2_min, 0.9);
    assert_eq!(g.r2_min_short, 0.85);
    assert_eq!(g.k_min, 0.05);
    assert_eq!(g.amp_min, 100.0);
    assert_eq!(g.snr_min, 3.0);
    assert_eq!(g.growth_min, 5.0);
}
