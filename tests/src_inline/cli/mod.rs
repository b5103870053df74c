
use super::*;
use clap::Parser;

#[test]
fn analyze_parses_with_default_state() {
    let cli = Cli::parse_from([
        "ampliqc", "analyze", "--input", "run.json", "--out", "out",
    ]);
    assert!(matches!(cli.command, Command::Analyze(_)));
}

#[test]
fn thresholds_accepts_manual_overrides() {
    let cli = Cli::parse_from([
        "ampliqc",
        "thresholds",
        "--strategy",
        "manual",
        "--manual",
        "FAM=432.0",
        "--manual",
        "HEX=210.5",
        "--out",
        "out",
    ]);
    assert!(matches!(cli.command, Command::Thresholds(_)));
}

#[test]
fn feedback_requires_well_channel_label() {
    let cli = Cli::parse_from([
        "ampliqc",
        "feedback",
        "--well",
        "A1",
        "--channel",
        "HEX",
        "--label",
        "INDETERMINATE",
        "--out",
        "out",
    ]);
    assert!(matches!(cli.command, Command::Feedback(_)));
}

#[test]
fn models_and_reset_parse() {
    let cli = Cli::parse_from(["ampliqc", "models", "--test-code", "NGON"]);
    assert!(matches!(cli.command, Command::Models(_)));

    let cli = Cli::parse_from(["ampliqc", "reset"]);
    assert!(matches!(cli.command, Command::Reset(_)));
}
