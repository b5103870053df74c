pub mod cancel;

use std::path::Path;
use std::time::Instant;

use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, EngineConfig};
use crate::engine::cancel::CancelToken;
use crate::input::RunInput;
use crate::ml::registry::{ModelMeta, ModelRegistry};
use crate::ml::training::{TrainingExample, TrainingStore, is_milestone, now_unix};
use crate::ml::MlError;
use crate::model::classes::{Classification, WellClass};
use crate::model::thresholds::{Scale, Strategy};
use crate::model::weights::ClassBands;
use crate::pipeline::stage1_load::{RunCtx, Stage1Error, run_stage1_load};
use crate::pipeline::stage2_fit::{FitContext, run_stage2_fit};
use crate::pipeline::stage3_anomalies::{AnomalyContext, run_stage3_anomalies};
use crate::pipeline::stage4_thresholds::{ThresholdContext, run_stage4_thresholds};
use crate::pipeline::stage5_quant::{QuantContext, run_stage5_quant};
use crate::pipeline::stage6_features::{FeaturesContext, run_stage6_features};
use crate::pipeline::stage7_classify::{ClassifyContext, run_stage7_classify, strict_summary};
use crate::pipeline::stage8_report::{RunResult, run_stage8_report};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("load error: {0}")]
    Load(#[from] Stage1Error),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("ml error: {0}")]
    Ml(#[from] MlError),
    #[error("no active run")]
    NoRun,
    #[error("well not found: {well}/{channel}")]
    WellNotFound { well: String, channel: String },
    #[error("unknown class label: {0}")]
    UnknownLabel(String),
    #[error("batch operation cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Load(e) => e.code(),
            EngineError::Config(_) => "INTERNAL",
            EngineError::Ml(e) => e.code(),
            EngineError::NoRun => "INTERNAL",
            EngineError::WellNotFound { .. } | EngineError::UnknownLabel(_) => "INPUT_MALFORMED",
            EngineError::Cancelled => "CANCELLED",
        }
    }
}

/// Everything derived for the active run. Replaced wholesale by the next
/// `analyze`; dropped by `emergency_reset`.
#[derive(Debug, Clone)]
pub struct RunState {
    pub ctx: RunCtx,
    pub fits: FitContext,
    pub anomalies: AnomalyContext,
    pub thresholds: ThresholdContext,
    pub quants: QuantContext,
    pub features: FeaturesContext,
    pub classify: ClassifyContext,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecorded {
    pub test_code: String,
    pub training_count: usize,
    pub retrained: Option<ModelMeta>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclassifyProgress {
    pub total: usize,
    pub updated: usize,
    pub deferred: usize,
    pub expert_kept: usize,
    pub cancelled: bool,
}

/// The analytical core. Owns the current run and the process-wide model
/// registry; hosts drive it through the operations below. Single-threaded
/// per run: wells are processed sequentially in plate order.
pub struct Engine {
    config: EngineConfig,
    registry: ModelRegistry,
    training: TrainingStore,
    run: Option<RunState>,
}

impl Engine {
    pub fn new(config: EngineConfig, state_dir: &Path) -> Result<Self, EngineError> {
        let registry = ModelRegistry::open(state_dir)?;
        let training = TrainingStore::open(state_dir)?;
        Ok(Self {
            config,
            registry,
            training,
            run: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn has_run(&self) -> bool {
        self.run.is_some()
    }

    /// Full pipeline end-to-end. Replaces any previous run.
    pub fn analyze(&mut self, input: RunInput) -> Result<RunResult, EngineError> {
        let start = Instant::now();
        info!(stage = "stage1_load", "starting stage");
        let ctx = run_stage1_load(input, &self.config)?;
        info!(
            stage = "stage1_load",
            elapsed_ms = start.elapsed().as_millis(),
            wells = ctx.n_wells,
            channels = ctx.channels.len(),
            "finished stage"
        );

        let start = Instant::now();
        info!(stage = "stage2_fit", "starting stage");
        let fits = run_stage2_fit(&ctx);
        info!(
            stage = "stage2_fit",
            elapsed_ms = start.elapsed().as_millis(),
            good = fits.fits.iter().filter(|f| f.is_good_scurve).count(),
            "finished stage"
        );

        let start = Instant::now();
        info!(stage = "stage3_anomalies", "starting stage");
        let anomalies = run_stage3_anomalies(&ctx, &fits, &self.config);
        info!(
            stage = "stage3_anomalies",
            elapsed_ms = start.elapsed().as_millis(),
            flagged = anomalies.flags.iter().filter(|f| !f.is_clean()).count(),
            "finished stage"
        );

        let state = self.derive(ctx, fits, anomalies);
        let result = self.assemble(&state);
        self.run = Some(state);
        Ok(result)
    }

    /// Stages 4..7 for the given base contexts; shared by analyze and
    /// recompute_thresholds.
    fn derive(&self, ctx: RunCtx, fits: FitContext, anomalies: AnomalyContext) -> RunState {
        let start = Instant::now();
        info!(stage = "stage4_thresholds", "starting stage");
        let thresholds = run_stage4_thresholds(&ctx, &fits, &self.config);
        info!(
            stage = "stage4_thresholds",
            elapsed_ms = start.elapsed().as_millis(),
            records = thresholds.thresholds.len(),
            "finished stage"
        );

        let start = Instant::now();
        info!(stage = "stage5_quant", "starting stage");
        let quants = run_stage5_quant(&ctx, &thresholds, &self.config);
        info!(
            stage = "stage5_quant",
            elapsed_ms = start.elapsed().as_millis(),
            crossed = quants.quants.iter().filter(|q| q.cqj.is_some()).count(),
            "finished stage"
        );

        let start = Instant::now();
        info!(stage = "stage6_features", "starting stage");
        let features = run_stage6_features(&ctx, &fits, &quants, &self.config);
        info!(
            stage = "stage6_features",
            elapsed_ms = start.elapsed().as_millis(),
            "finished stage"
        );

        let start = Instant::now();
        info!(stage = "stage7_classify", "starting stage");
        let classify = run_stage7_classify(&ctx, &fits, &anomalies);
        info!(
            stage = "stage7_classify",
            elapsed_ms = start.elapsed().as_millis(),
            "finished stage"
        );

        RunState {
            ctx,
            fits,
            anomalies,
            thresholds,
            quants,
            features,
            classify,
        }
    }

    fn assemble(&self, state: &RunState) -> RunResult {
        run_stage8_report(
            &state.ctx,
            &state.fits,
            &state.anomalies,
            &state.thresholds,
            &state.quants,
            &state.features,
            &state.classify,
        )
    }

    pub fn current_result(&self) -> Result<RunResult, EngineError> {
        let state = self.run.as_ref().ok_or(EngineError::NoRun)?;
        Ok(self.assemble(state))
    }

    /// Re-run thresholds, quantification, features and the rule classifier
    /// under a new strategy. Fits are kept; expert labels survive.
    pub fn recompute_thresholds(
        &mut self,
        strategy: Strategy,
        scale: Scale,
        manual_overrides: Option<std::collections::BTreeMap<String, f64>>,
    ) -> Result<RunResult, EngineError> {
        // Validate before touching the run: run-level failures leave the
        // previous state intact.
        {
            let state = self.run.as_ref().ok_or(EngineError::NoRun)?;
            if strategy.is_fixed() {
                for code in &state.ctx.test_codes {
                    if self.config.pathogens.get(code).is_none() {
                        return Err(EngineError::Load(Stage1Error::MissingProfile {
                            strategy: strategy.as_str(),
                            test_code: code.clone(),
                        }));
                    }
                }
            }
        }

        let Some(state) = self.run.take() else {
            return Err(EngineError::NoRun);
        };
        let previous = state.classify.classifications.clone();

        let mut ctx = state.ctx;
        ctx.strategy = strategy;
        ctx.scale = match strategy {
            Strategy::LinearFixed => Scale::Linear,
            Strategy::LogFixed => Scale::Log,
            _ => scale,
        };
        if let Some(overrides) = manual_overrides {
            ctx.manual_overrides = overrides;
        }

        let mut new_state = self.derive(ctx, state.fits, state.anomalies);
        for (idx, old) in previous.into_iter().enumerate() {
            if old.is_expert() {
                new_state.classify.classifications[idx] = old;
            }
        }

        let result = self.assemble(&new_state);
        self.run = Some(new_state);
        Ok(result)
    }

    /// Record an expert label: appends a training example, marks the well
    /// expert-classified, and retrains the pathogen model at milestones.
    pub fn submit_expert_feedback(
        &mut self,
        well_id: &str,
        channel: &str,
        label: &str,
    ) -> Result<TrainingRecorded, EngineError> {
        let class = WellClass::from_str(label)
            .ok_or_else(|| EngineError::UnknownLabel(label.to_string()))?;

        let state = self.run.as_mut().ok_or(EngineError::NoRun)?;
        let idx = state
            .ctx
            .find_well(well_id, channel)
            .ok_or_else(|| EngineError::WellNotFound {
                well: well_id.to_string(),
                channel: channel.to_string(),
            })?;

        let meta = &state.ctx.meta[idx];
        let example = TrainingExample {
            features: state.features.features[idx].to_array().to_vec(),
            label: class.as_str().to_string(),
            test_code: meta.test_code.clone(),
            channel: meta.channel.clone(),
            well_id: meta.well_id.clone(),
            run_id: state.ctx.run_id.clone(),
            recorded_at_unix: now_unix(),
        };
        let count = self.training.append(&example)?;

        let summary = strict_summary(
            &state.fits.fits[idx],
            state.anomalies.flags[idx],
            &ClassBands::default(),
        );
        state.classify.classifications[idx] = Classification::reduce(
            state.classify.classifications[idx].clone(),
            Classification::Expert {
                class,
                summary,
                reason: "Expert review".to_string(),
            },
        );

        let test_code = example.test_code.clone();
        let effective = self.config.ml.effective(&test_code, channel);
        let retrained = if self.config.ml.auto_training_enabled
            && !effective.training_locked
            && is_milestone(count)
        {
            let history = self.training.load(&test_code)?;
            let meta = self.registry.train_and_register(&test_code, &history)?;
            info!(
                test_code = test_code.as_str(),
                version = meta.version.as_str(),
                samples = meta.training_count,
                accuracy = meta.accuracy,
                "model retrained at milestone"
            );
            Some(meta)
        } else {
            None
        };

        Ok(TrainingRecorded {
            test_code,
            training_count: count,
            retrained,
        })
    }

    /// Per-well ML reclassification over the active run. Cooperative: the
    /// cancel token is polled between wells; already-updated wells keep
    /// their new state when the batch stops early.
    pub fn batch_ml_reclassify(
        &mut self,
        cancel: &CancelToken,
    ) -> Result<ReclassifyProgress, EngineError> {
        let state = self.run.as_mut().ok_or(EngineError::NoRun)?;
        let mut progress = ReclassifyProgress {
            total: state.ctx.n_wells,
            ..Default::default()
        };

        for idx in 0..state.ctx.n_wells {
            if cancel.is_cancelled() {
                progress.cancelled = true;
                break;
            }

            if state.classify.classifications[idx].is_expert() {
                progress.expert_kept += 1;
                continue;
            }

            let meta = &state.ctx.meta[idx];
            let effective = self.config.ml.effective(&meta.test_code, &meta.channel);
            if !effective.enabled {
                tracing::debug!(
                    well = meta.well_id.as_str(),
                    channel = meta.channel.as_str(),
                    code = "ML_DISABLED",
                    "prediction skipped"
                );
                progress.deferred += 1;
                continue;
            }

            let count = self.training.count(&meta.test_code)?;
            if count < self.config.ml.prediction_gate() {
                tracing::debug!(
                    well = meta.well_id.as_str(),
                    channel = meta.channel.as_str(),
                    code = "ML_INSUFFICIENT_TRAINING",
                    count,
                    "prediction skipped"
                );
                progress.deferred += 1;
                continue;
            }

            let Some(entry) = self.registry.get(&meta.test_code) else {
                progress.deferred += 1;
                continue;
            };
            if entry.meta.training_count < self.config.ml.prediction_gate() {
                progress.deferred += 1;
                continue;
            }

            let features = state.features.features[idx].to_array();
            let prediction = entry.committee.predict(&features)?;
            if prediction.confidence < effective.min_confidence {
                progress.deferred += 1;
                continue;
            }

            let summary = strict_summary(
                &state.fits.fits[idx],
                state.anomalies.flags[idx],
                &ClassBands::default(),
            );
            state.classify.classifications[idx] = Classification::reduce(
                state.classify.classifications[idx].clone(),
                Classification::Ml {
                    class: prediction.class,
                    summary,
                    confidence: prediction.confidence,
                    model_version: entry.meta.version.clone(),
                    reason: format!(
                        "Committee vote {:.0}%",
                        prediction.confidence * 100.0
                    ),
                },
            );
            progress.updated += 1;
        }

        Ok(progress)
    }

    /// Apply a previously recorded expert label without touching the
    /// training store. Hosts use this to restore session state.
    pub fn restore_expert_label(
        &mut self,
        well_id: &str,
        channel: &str,
        label: &str,
    ) -> Result<(), EngineError> {
        let class = WellClass::from_str(label)
            .ok_or_else(|| EngineError::UnknownLabel(label.to_string()))?;
        let state = self.run.as_mut().ok_or(EngineError::NoRun)?;
        let idx = state
            .ctx
            .find_well(well_id, channel)
            .ok_or_else(|| EngineError::WellNotFound {
                well: well_id.to_string(),
                channel: channel.to_string(),
            })?;
        let summary = strict_summary(
            &state.fits.fits[idx],
            state.anomalies.flags[idx],
            &ClassBands::default(),
        );
        state.classify.classifications[idx] = Classification::Expert {
            class,
            summary,
            reason: "Expert review".to_string(),
        };
        Ok(())
    }

    /// Drop the current run and its derived state. Archived runs and the
    /// model registry are untouched.
    pub fn emergency_reset(&mut self) {
        self.run = None;
        info!("engine reset: active run dropped");
    }

    pub fn list_model_versions(&self, test_code: &str) -> Result<Vec<ModelMeta>, EngineError> {
        Ok(self.registry.list_versions(test_code)?)
    }

    pub fn training_count(&self, test_code: &str) -> Result<usize, EngineError> {
        Ok(self.training.count(test_code)?)
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/engine/mod.rs"]
mod tests;
