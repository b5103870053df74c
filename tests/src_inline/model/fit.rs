
use super::*;

#[test]
fn rejection_set_csv() {
    let mut reasons = RejectionSet::empty();
    assert_eq!(reasons.to_csv(), ".");
    reasons.set(RejectionSet::LOW_R2);
    reasons.set(RejectionSet::LOW_SNR);
    assert_eq!(reasons.to_csv(), "LOW_R2,LOW_SNR");
    assert!(!reasons.is_empty());
}

#[test]
fn failed_fit_is_not_good() {
    let mut reasons = RejectionSet::empty();
    reasons.set(RejectionSet::FIT_FAILED);
    let fit = FitResult::failed(123.0, reasons);
    assert!(!fit.is_good_scurve);
    assert_eq!(fit.dynamic_range, 123.0);
    assert_eq!(fit.model_cq(), None);
}

#[test]
fn model_cq_is_midpoint_for_good_curves() {
    let fit = FitResult {
        l: 1000.0,
        k: 0.5,
        x0: 21.5,
        b: 50.0,
        r2: 0.99,
        rmse: 2.0,
        snr: 20.0,
        plateau_level: 1050.0,
        exp_growth_rate: 125.0,
        dynamic_range: 1000.0,
        efficiency: 0.65,
        is_good_scurve: true,
        rejection_reasons: RejectionSet::empty(),
    };
    assert_eq!(fit.model_cq(), Some(21.5));
}
