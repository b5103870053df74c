
use super::*;
use crate::fit::sigmoid::{Params, sigmoid};
use crate::model::fit::RejectionSet;

fn trace(rfu: Vec<f64>) -> Trace {
    let cycles: Vec<u32> = (1..=rfu.len() as u32).collect();
    Trace {
        well_id: "A1".to_string(),
        channel: "FAM".to_string(),
        cycles,
        rfu,
    }
}

fn good_fit(l: f64, k: f64, x0: f64, b: f64) -> FitResult {
    FitResult {
        l,
        k,
        x0,
        b,
        r2: 0.99,
        rmse: 1.0,
        snr: 20.0,
        plateau_level: b + l,
        exp_growth_rate: l * k / 4.0,
        dynamic_range: l,
        efficiency: 0.5,
        is_good_scurve: true,
        rejection_reasons: RejectionSet::empty(),
    }
}

fn sigmoid_rfu(l: f64, k: f64, x0: f64, b: f64, n: u32) -> Vec<f64> {
    let p = Params { l, k, x0, b };
    (1..=n).map(|c| sigmoid(c as f64, &p)).collect()
}

#[test]
fn clean_sigmoid_has_no_flags() {
    let t = trace(sigmoid_rfu(1200.0, 0.45, 22.0, 50.0, 40));
    let flags = detect(&t, &good_fit(1200.0, 0.45, 22.0, 50.0), 3000.0, &AnomalyConfig::default());
    assert!(flags.is_clean(), "flags: {}", flags.to_csv());
}

#[test]
fn low_amplitude_by_absolute_and_expected_range() {
    let t = trace(vec![10.0; 40]);
    let flags = detect(&t, &good_fit(0.0, 0.0, 0.0, 10.0), 3000.0, &AnomalyConfig::default());
    assert!(flags.contains(AnomalyFlags::LOW_AMPLITUDE));

    // 120 RFU range clears the absolute floor but not 10% of a 3000 RFU
    // expected range.
    let mut rfu = sigmoid_rfu(120.0, 0.5, 20.0, 10.0, 40);
    rfu[0] = 10.0;
    let flags = detect(
        &trace(rfu),
        &good_fit(120.0, 0.5, 20.0, 10.0),
        3000.0,
        &AnomalyConfig::default(),
    );
    assert!(flags.contains(AnomalyFlags::LOW_AMPLITUDE));
}

#[test]
fn unstable_baseline_in_cycles_6_to_10() {
    let mut rfu = sigmoid_rfu(1000.0, 0.5, 25.0, 50.0, 40);
    rfu[5] += 200.0;
    rfu[7] -= 200.0;
    rfu[9] += 200.0;
    let flags = detect(
        &trace(rfu),
        &good_fit(1000.0, 0.5, 25.0, 50.0),
        3000.0,
        &AnomalyConfig::default(),
    );
    assert!(flags.contains(AnomalyFlags::UNSTABLE_BASELINE));
}

#[test]
fn negative_rfu_fraction_but_not_uniform_offset() {
    let mut rfu = vec![100.0; 40];
    for v in rfu.iter_mut().take(8) {
        *v = -20.0;
    }
    let flags = detect(
        &trace(rfu),
        &good_fit(100.0, 0.5, 20.0, 0.0),
        1000.0,
        &AnomalyConfig::default(),
    );
    assert!(flags.contains(AnomalyFlags::NEGATIVE_RFU_VALUES));

    // A uniformly shifted trace is baseline subtraction, not an anomaly.
    let rfu = vec![-20.0; 40];
    let flags = detect(
        &trace(rfu),
        &good_fit(0.0, 0.0, 0.0, -20.0),
        1000.0,
        &AnomalyConfig::default(),
    );
    assert!(!flags.contains(AnomalyFlags::NEGATIVE_RFU_VALUES));
}

#[test]
fn high_noise_flagged() {
    let mut rfu = Vec::with_capacity(40);
    for i in 0..40 {
        rfu.push(if i % 2 == 0 { 0.0 } else { 100.0 });
    }
    let flags = detect(
        &trace(rfu),
        &good_fit(100.0, 0.5, 20.0, 0.0),
        1000.0,
        &AnomalyConfig::default(),
    );
    assert!(flags.contains(AnomalyFlags::HIGH_NOISE));
}

#[test]
fn early_plateau_before_midpoint() {
    // Rises quickly, then flat from cycle 12 onward, while the fitted
    // midpoint claims 25.
    let mut rfu = Vec::with_capacity(40);
    for c in 1..=40u32 {
        let v = if c <= 8 {
            50.0
        } else if c <= 12 {
            50.0 + (c as f64 - 8.0) * 150.0
        } else {
            650.0
        };
        rfu.push(v);
    }
    let flags = detect(
        &trace(rfu),
        &good_fit(1200.0, 0.5, 25.0, 50.0),
        3000.0,
        &AnomalyConfig::default(),
    );
    assert!(flags.contains(AnomalyFlags::EARLY_PLATEAU));
}

#[test]
fn negative_amplification_in_exponential_window() {
    let mut rfu = Vec::with_capacity(40);
    for c in 1..=40u32 {
        rfu.push(1000.0 - 12.0 * c as f64);
    }
    let flags = detect(
        &trace(rfu),
        &good_fit(500.0, 0.5, 20.0, 100.0),
        3000.0,
        &AnomalyConfig::default(),
    );
    assert!(flags.contains(AnomalyFlags::NEGATIVE_AMPLIFICATION));
}

#[test]
fn insufficient_data_flags() {
    let t = trace(vec![1.0, 2.0, 3.0]);
    let flags = detect(
        &t,
        &good_fit(0.0, 0.0, 0.0, 0.0),
        1000.0,
        &AnomalyConfig::default(),
    );
    assert!(flags.contains(AnomalyFlags::INSUFFICIENT_DATA));
    assert!(flags.contains(AnomalyFlags::INSUFFICIENT_VALID_DATA));

    let t = trace(vec![1.0, f64::NAN, f64::NAN, 4.0, 5.0, 6.0]);
    let flags = detect(
        &t,
        &good_fit(0.0, 0.0, 0.0, 0.0),
        1000.0,
        &AnomalyConfig::default(),
    );
    assert!(!flags.contains(AnomalyFlags::INSUFFICIENT_DATA));
    assert!(flags.contains(AnomalyFlags::INSUFFICIENT_VALID_DATA));
}
