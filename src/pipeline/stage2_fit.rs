use crate::fit::sigmoid::fit_trace;
use crate::model::fit::{FitResult, RejectionSet};
use crate::model::weights::FitGates;
use crate::pipeline::stage1_load::RunCtx;

/// Per-well fit results, parallel to `RunCtx::traces`. A well that could
/// not enter fitting at all carries its error code here; its FitResult is
/// a zeroed placeholder so later stages stay total.
#[derive(Debug, Clone)]
pub struct FitContext {
    pub fits: Vec<FitResult>,
    pub errors: Vec<Option<&'static str>>,
}

impl FitContext {
    pub fn fitted(&self, idx: usize) -> bool {
        self.errors[idx].is_none()
    }
}

pub fn run_stage2_fit(ctx: &RunCtx) -> FitContext {
    let gates = FitGates::default();
    let mut fits = Vec::with_capacity(ctx.n_wells);
    let mut errors = Vec::with_capacity(ctx.n_wells);

    for trace in &ctx.traces {
        match fit_trace(&trace.cycles, &trace.rfu, &gates) {
            Ok(fit) => {
                fits.push(fit);
                errors.push(None);
            }
            Err(e) => {
                tracing::debug!(
                    well = trace.well_id.as_str(),
                    channel = trace.channel.as_str(),
                    code = e.code(),
                    "fit skipped"
                );
                fits.push(FitResult::failed(0.0, RejectionSet::empty()));
                errors.push(Some(e.code()));
            }
        }
    }

    FitContext { fits, errors }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_fit.rs"]
mod tests;
