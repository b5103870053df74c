use std::path::PathBuf;

use clap::Args;

use crate::cli::session::load_config;
use crate::engine::Engine;

#[derive(Args, Debug)]
pub struct ModelsArgs {
    /// Pathogen test code (e.g. NGON)
    #[arg(long)]
    test_code: String,

    /// Configuration directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// State directory
    #[arg(long, default_value = "ampliqc-state")]
    state: PathBuf,
}

pub fn handle(args: ModelsArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let engine = Engine::new(config, &args.state)?;
    let versions = engine.list_model_versions(&args.test_code)?;

    if versions.is_empty() {
        println!("no models trained for {}", args.test_code);
        return Ok(());
    }

    println!("version\tsamples\taccuracy\traw_accuracy\tparent\ttrained_at_unix");
    for meta in versions {
        println!(
            "{}\t{}\t{:.4}\t{:.4}\t{}\t{}",
            meta.version,
            meta.training_count,
            meta.accuracy,
            meta.raw_accuracy,
            meta.parent.as_deref().unwrap_or("."),
            meta.trained_at_unix
        );
    }
    Ok(())
}
