
use super::*;
use crate::model::thresholds::Scale;
use tempfile::tempdir;

const TABLE: &str = r#"
[FLUA.FAM]
linear = 265.0
log = 2.42

[FLUA.default]
linear = 250.0
"#;

#[test]
fn direct_lookup_wins_over_default() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("fixed_thresholds.toml");
    std::fs::write(&path, TABLE).expect("write");

    let table = load_table(&path).expect("load");
    assert_eq!(table.lookup("FLUA", "FAM", Scale::Linear), Some(265.0));
    assert_eq!(table.lookup("FLUA", "FAM", Scale::Log), Some(2.42));
}

#[test]
fn default_channel_fallthrough() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("fixed_thresholds.toml");
    std::fs::write(&path, TABLE).expect("write");

    let table = load_table(&path).expect("load");
    assert_eq!(table.lookup("FLUA", "HEX", Scale::Linear), Some(250.0));
    // The default carries no log value, so the log lookup stays unresolved.
    assert_eq!(table.lookup("FLUA", "HEX", Scale::Log), None);
    assert_eq!(table.lookup("NGON", "FAM", Scale::Linear), None);
}
