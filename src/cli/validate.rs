use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use tracing::info;

use crate::cli::session::load_config;
use crate::input::read_run_input;
use crate::pipeline::stage1_load::run_stage1_load;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Run input JSON (optionally .gz)
    #[arg(long)]
    input: PathBuf,

    /// Output directory
    #[arg(long)]
    out: PathBuf,

    /// Configuration directory
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn handle(args: ValidateArgs) -> anyhow::Result<()> {
    std::fs::create_dir_all(&args.out)?;
    let config = load_config(args.config.as_deref())?;

    let start = Instant::now();
    info!(stage = "stage1_load", "starting stage");
    let input = read_run_input(&args.input)?;
    let ctx = run_stage1_load(input, &config)?;
    info!(
        stage = "stage1_load",
        elapsed_ms = start.elapsed().as_millis(),
        "finished stage"
    );

    let mut role_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for meta in &ctx.meta {
        *role_counts.entry(meta.role.as_str()).or_insert(0) += 1;
    }

    let mut lines = Vec::new();
    lines.push(("run_id", ctx.run_id.clone()));
    lines.push(("n_wells", ctx.n_wells.to_string()));
    lines.push(("channels", ctx.channels.join(",")));
    lines.push(("test_codes", ctx.test_codes.join(",")));
    lines.push(("strategy", ctx.strategy.as_str().to_string()));
    lines.push(("scale", ctx.scale.as_str().to_string()));
    for (role, count) in &role_counts {
        lines.push(("role", format!("{role}={count}")));
    }

    let path = args.out.join("validate.tsv");
    let mut buf = String::new();
    for (k, v) in lines {
        buf.push_str(k);
        buf.push('\t');
        buf.push_str(&v);
        buf.push('\n');
    }
    std::fs::write(path, buf)?;
    Ok(())
}
