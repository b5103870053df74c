use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::cli::session::{ExpertLabel, load_config, load_session, restore_engine, save_session, upsert_label};
use crate::cli::write_artifacts;

#[derive(Args, Debug)]
pub struct FeedbackArgs {
    /// Well coordinate, e.g. A1
    #[arg(long)]
    well: String,

    /// Fluorophore channel, e.g. FAM
    #[arg(long)]
    channel: String,

    /// Expert class label (STRONG_POSITIVE .. NEGATIVE)
    #[arg(long)]
    label: String,

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

pub fn handle(args: FeedbackArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut session = load_session(&args.state)?;
    let mut engine = restore_engine(config, &args.state, &session)?;

    let recorded = engine.submit_expert_feedback(&args.well, &args.channel, &args.label)?;
    info!(
        test_code = recorded.test_code.as_str(),
        training_count = recorded.training_count,
        retrained = recorded
            .retrained
            .as_ref()
            .map(|m| m.version.as_str())
            .unwrap_or("."),
        "expert feedback recorded"
    );

    upsert_label(
        &mut session,
        ExpertLabel {
            well_id: args.well.clone(),
            channel: args.channel.clone(),
            label: args.label.clone(),
        },
    );

    let result = engine.current_result()?;
    write_artifacts(&args.out, &result)?;
    save_session(&args.state, &session)?;
    Ok(())
}
