use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::cli::session::{load_config, load_session, restore_engine};
use crate::cli::{log_class_counts, write_artifacts};
use crate::engine::cancel::CancelToken;

#[derive(Args, Debug)]
pub struct ReclassifyArgs {
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

pub fn handle(args: ReclassifyArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let session = load_session(&args.state)?;
    let mut engine = restore_engine(config, &args.state, &session)?;

    let token = CancelToken::new();
    let progress = engine.batch_ml_reclassify(&token)?;
    info!(
        total = progress.total,
        updated = progress.updated,
        deferred = progress.deferred,
        expert_kept = progress.expert_kept,
        cancelled = progress.cancelled,
        "batch reclassification finished"
    );

    let result = engine.current_result()?;
    log_class_counts(&result);
    write_artifacts(&args.out, &result)?;
    Ok(())
}
