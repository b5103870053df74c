use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, default_config_dir};
use crate::engine::Engine;
use crate::input::RunInput;

/// Host-side session: the last analyzed run input plus the expert labels
/// recorded against it. The engine itself is in-memory; the CLI restores
/// it from this file on every invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub run_input: RunInput,
    #[serde(default)]
    pub expert_labels: Vec<ExpertLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertLabel {
    pub well_id: String,
    pub channel: String,
    pub label: String,
}

pub fn session_path(state_dir: &Path) -> PathBuf {
    state_dir.join("session.json")
}

pub fn load_session(state_dir: &Path) -> anyhow::Result<Session> {
    let path = session_path(state_dir);
    if !path.is_file() {
        anyhow::bail!("no active session in {}; run analyze first", state_dir.display());
    }
    let bytes = std::fs::read(&path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn save_session(state_dir: &Path, session: &Session) -> anyhow::Result<()> {
    std::fs::create_dir_all(state_dir)?;
    std::fs::write(
        session_path(state_dir),
        serde_json::to_vec_pretty(session)?,
    )?;
    Ok(())
}

pub fn load_config(config_dir: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let dir = match config_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_config_dir(),
    };
    Ok(EngineConfig::load_from_dir(&dir)?)
}

/// Rebuild the engine state for a stored session: re-analyze the input
/// (fits are deterministic) and re-apply the recorded expert labels.
pub fn restore_engine(
    config: EngineConfig,
    state_dir: &Path,
    session: &Session,
) -> anyhow::Result<Engine> {
    let mut engine = Engine::new(config, state_dir)?;
    engine.analyze(session.run_input.clone())?;
    for label in &session.expert_labels {
        engine.restore_expert_label(&label.well_id, &label.channel, &label.label)?;
    }
    Ok(engine)
}

pub fn upsert_label(session: &mut Session, label: ExpertLabel) {
    if let Some(existing) = session
        .expert_labels
        .iter_mut()
        .find(|l| l.well_id == label.well_id && l.channel == label.channel)
    {
        *existing = label;
    } else {
        session.expert_labels.push(label);
    }
}
