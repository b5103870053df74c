
use super::*;
use tempfile::tempdir;

const LIBRARY: &str = r#"
[[pathogen]]
test_code = "FLUA"

[pathogen.channels.FAM]
target = "Influenza A"
expected_range = 3000.0

[pathogen.channels.FAM.controls]
h = { concentration = 2e7 }
m = { concentration = 2e5 }
l = { concentration = 2e3 }
"#;

#[test]
fn loads_profiles_and_controls() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("pathogens.toml");
    std::fs::write(&path, LIBRARY).expect("write");

    let library = load_library(&path).expect("load");
    let profile = library.get("FLUA").expect("FLUA");
    let channel = profile.channel("FAM").expect("FAM");
    assert_eq!(channel.target, "Influenza A");
    assert_eq!(channel.expected_range, Some(3000.0));
    assert_eq!(
        channel.controls.by_role_letter('H').map(|p| p.concentration),
        Some(2e7)
    );
    assert_eq!(
        channel.controls.by_role_letter('L').map(|p| p.concentration),
        Some(2e3)
    );
    assert_eq!(channel.controls.by_role_letter('X'), None);
}

#[test]
fn empty_library_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("pathogens.toml");
    std::fs::write(&path, "# nothing\n").expect("write");
    assert!(matches!(
        load_library(&path),
        Err(ConfigError::EmptyLibrary(_))
    ));
}

#[test]
fn non_positive_concentration_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("pathogens.toml");
    std::fs::write(
        &path,
        r#"
[[pathogen]]
test_code = "BAD"

[pathogen.channels.FAM]
target = "x"

[pathogen.channels.FAM.controls]
h = { concentration = 0.0 }
"#,
    )
    .expect("write");
    assert!(matches!(
        load_library(&path),
        Err(ConfigError::InvalidProfile { .. })
    ));
}
