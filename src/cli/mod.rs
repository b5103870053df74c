use clap::{Parser, Subcommand};

mod analyze;
mod feedback;
mod models;
mod reclassify;
mod reset;
mod session;
mod thresholds;
mod validate;

#[derive(Parser, Debug)]
#[command(name = "ampliqc", version, about = "Ampliqc qPCR curve analysis CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Analyze(analyze::AnalyzeArgs),
    Thresholds(thresholds::ThresholdsArgs),
    Feedback(feedback::FeedbackArgs),
    Reclassify(reclassify::ReclassifyArgs),
    Models(models::ModelsArgs),
    Reset(reset::ResetArgs),
    Validate(validate::ValidateArgs),
}

impl Cli {
    pub fn dispatch(self) -> anyhow::Result<()> {
        match self.command {
            Command::Analyze(args) => analyze::handle(args),
            Command::Thresholds(args) => thresholds::handle(args),
            Command::Feedback(args) => feedback::handle(args),
            Command::Reclassify(args) => reclassify::handle(args),
            Command::Models(args) => models::handle(args),
            Command::Reset(args) => reset::handle(args),
            Command::Validate(args) => validate::handle(args),
        }
    }
}

pub(crate) fn write_artifacts(
    out_dir: &std::path::Path,
    result: &crate::pipeline::stage8_report::RunResult,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)?;
    crate::report::json::write_run(&out_dir.join("run.json"), result)?;
    crate::report::json::write_wells_csv(&out_dir.join("wells.csv"), result)?;
    std::fs::write(
        out_dir.join("report.txt"),
        crate::report::text::render_report(result),
    )?;
    Ok(())
}

pub(crate) fn log_class_counts(result: &crate::pipeline::stage8_report::RunResult) {
    for (class, count) in result.class_counts() {
        tracing::info!(class = class.as_str(), count);
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/cli/mod.rs"]
mod tests;
