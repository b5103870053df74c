use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::cli::session::session_path;

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// State directory
    #[arg(long, default_value = "ampliqc-state")]
    state: PathBuf,
}

/// Drop the active session. Training data and model versions are never
/// touched by a reset.
pub fn handle(args: ResetArgs) -> anyhow::Result<()> {
    let path = session_path(&args.state);
    if path.is_file() {
        std::fs::remove_file(&path)?;
        info!("session dropped");
    } else {
        info!("no active session");
    }
    Ok(())
}
