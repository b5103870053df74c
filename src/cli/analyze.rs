use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use tracing::info;

use crate::cli::session::{Session, load_config, save_session};
use crate::cli::{log_class_counts, write_artifacts};
use crate::engine::Engine;
use crate::input::read_run_input;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Run input JSON (optionally .gz)
    #[arg(long)]
    input: PathBuf,

    /// Output directory
    #[arg(long)]
    out: PathBuf,

    /// Configuration directory (pathogens.toml, fixed_thresholds.toml, ml.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// State directory (session, training data, model registry)
    #[arg(long, default_value = "ampliqc-state")]
    state: PathBuf,
}

pub fn handle(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let mut engine = Engine::new(config, &args.state)?;

    let start = Instant::now();
    let input = read_run_input(&args.input)?;
    info!(
        run_id = input.run_id.as_str(),
        wells = input.wells.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "run input loaded"
    );

    let session = Session {
        run_input: input.clone(),
        expert_labels: Vec::new(),
    };
    let result = engine.analyze(input)?;
    log_class_counts(&result);

    write_artifacts(&args.out, &result)?;
    save_session(&args.state, &session)?;
    Ok(())
}
