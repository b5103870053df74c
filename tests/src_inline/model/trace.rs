
use super::*;

#[test]
fn plate_order_numeric_columns() {
    assert!(plate_order_key("A2") < plate_order_key("A10"));
    assert!(plate_order_key("A12") < plate_order_key("B1"));
    assert!(plate_order_key("H12") < plate_order_key("AA1"));
}

#[test]
fn plate_order_unparseable_sorts_last() {
    assert!(plate_order_key("A1") < plate_order_key("well-x"));
}

#[test]
fn control_role_predicates() {
    assert!(ControlRole::ControlH.is_control());
    assert!(ControlRole::Ntc.is_control());
    assert!(!ControlRole::Unknown.is_control());
    assert!(ControlRole::ControlL.is_concentration_control());
    assert!(!ControlRole::Ntc.is_concentration_control());
}

#[test]
fn trace_valid_points_skips_nan() {
    let trace = Trace {
        well_id: "A1".to_string(),
        channel: "FAM".to_string(),
        cycles: vec![1, 2, 3, 4],
        rfu: vec![1.0, f64::NAN, 3.0, 4.0],
    };
    assert_eq!(trace.len(), 4);
    assert_eq!(trace.valid_points(), 3);
}
