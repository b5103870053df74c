use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::cli::session::{load_config, load_session, restore_engine, save_session};
use crate::cli::{log_class_counts, write_artifacts};
use crate::model::thresholds::{Scale, Strategy};

#[derive(Args, Debug)]
pub struct ThresholdsArgs {
    /// Threshold strategy id (linear_stddev, linear_exp_phase, linear_fixed,
    /// log_fixed, manual, auto)
    #[arg(long)]
    strategy: String,

    /// Scale (linear or log)
    #[arg(long, default_value = "linear")]
    scale: String,

    /// Manual per-channel overrides, CHANNEL=VALUE (repeatable)
    #[arg(long = "manual", value_name = "CHANNEL=VALUE")]
    manual: Vec<String>,

    /// Output directory
    #[arg(long)]
    out: PathBuf,

    /// Configuration directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// State directory
    #[arg(long, default_value = "ampliqc-state")]
    state: PathBuf,
}

pub fn handle(args: ThresholdsArgs) -> anyhow::Result<()> {
    let strategy = Strategy::from_str(&args.strategy)
        .ok_or_else(|| anyhow::anyhow!("unknown strategy id: {}", args.strategy))?;
    let scale = Scale::from_str(&args.scale)
        .ok_or_else(|| anyhow::anyhow!("unknown scale: {}", args.scale))?;
    let overrides = parse_overrides(&args.manual)?;

    let config = load_config(args.config.as_deref())?;
    let mut session = load_session(&args.state)?;
    let mut engine = restore_engine(config, &args.state, &session)?;

    let result = engine.recompute_thresholds(
        strategy,
        scale,
        if overrides.is_empty() {
            None
        } else {
            Some(overrides.clone())
        },
    )?;
    info!(
        strategy = strategy.as_str(),
        scale = scale.as_str(),
        thresholds = result.thresholds.len(),
        "thresholds recomputed"
    );
    log_class_counts(&result);

    // Keep the session on the new selection so later commands see it.
    session.run_input.strategy_selection.strategy_id = strategy.as_str().to_string();
    session.run_input.strategy_selection.scale = scale.as_str().to_string();
    if !overrides.is_empty() {
        session.run_input.strategy_selection.manual_overrides = Some(overrides);
    }

    write_artifacts(&args.out, &result)?;
    save_session(&args.state, &session)?;
    Ok(())
}

fn parse_overrides(pairs: &[String]) -> anyhow::Result<BTreeMap<String, f64>> {
    let mut out = BTreeMap::new();
    for pair in pairs {
        let Some((channel, value)) = pair.split_once('=') else {
            anyhow::bail!("manual override must be CHANNEL=VALUE, got {pair}");
        };
        let value: f64 = value
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid override value in {pair}"))?;
        out.insert(channel.to_string(), value);
    }
    Ok(out)
}
