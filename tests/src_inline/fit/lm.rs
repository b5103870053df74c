
use super::*;

fn synth(params: &Params, n: usize) -> (Vec<f64>, Vec<f64>) {
    let xs: Vec<f64> = (1..=n).map(|c| c as f64).collect();
    let ys: Vec<f64> = xs.iter().map(|x| sigmoid(*x, params)).collect();
    (xs, ys)
}

#[test]
fn recovers_clean_sigmoid() {
    let truth = Params {
        l: 1200.0,
        k: 0.45,
        x0: 22.0,
        b: 50.0,
    };
    let (xs, ys) = synth(&truth, 40);
    let bounds = Bounds::for_cycles(1.0, 40.0);
    let init = Params {
        l: 900.0,
        k: 0.3,
        x0: 18.0,
        b: 0.0,
    };

    let outcome = fit(&xs, &ys, init, &bounds).expect("fit");
    assert!(outcome.converged);
    assert!((outcome.params.l - truth.l).abs() < 1.0);
    assert!((outcome.params.k - truth.k).abs() < 0.01);
    assert!((outcome.params.x0 - truth.x0).abs() < 0.1);
    assert!((outcome.params.b - truth.b).abs() < 1.0);
}

#[test]
fn respects_parameter_bounds() {
    let truth = Params {
        l: 800.0,
        k: 0.6,
        x0: 20.0,
        b: 10.0,
    };
    let (xs, ys) = synth(&truth, 40);
    let bounds = Bounds::for_cycles(1.0, 40.0);
    let init = Params {
        l: 500.0,
        k: 4.9,
        x0: 39.0,
        b: 0.0,
    };

    let outcome = fit(&xs, &ys, init, &bounds).expect("fit");
    assert!(outcome.params.l >= 0.0);
    assert!(outcome.params.k >= bounds.k_min && outcome.params.k <= bounds.k_max);
    assert!(outcome.params.x0 >= bounds.x0_min && outcome.params.x0 <= bounds.x0_max);
}

#[test]
fn tolerates_noise() {
    let truth = Params {
        l: 1000.0,
        k: 0.5,
        x0: 24.0,
        b: 40.0,
    };
    let (xs, mut ys) = synth(&truth, 45);
    for (i, y) in ys.iter_mut().enumerate() {
        // Deterministic +-6 RFU ripple.
        *y += if i % 2 == 0 { 6.0 } else { -6.0 };
    }
    let init = Params {
        l: 700.0,
        k: 0.3,
        x0: 20.0,
        b: 0.0,
    };
    let outcome = fit(&xs, &ys, init, &Bounds::for_cycles(1.0, 45.0)).expect("fit");
    assert!((outcome.params.x0 - truth.x0).abs() < 0.5);
    assert!((outcome.params.l - truth.l).abs() < 30.0);
}
