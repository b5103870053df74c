use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::ml::MlError;
use crate::ml::forest::{CommitteeForest, cross_validate};
use crate::ml::training::{TrainingExample, now_unix};

/// Pathogen bucket used when no per-pathogen model exists yet.
pub const GENERAL_MODEL: &str = "GENERAL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub test_code: String,
    pub version: String,
    pub version_num: u32,
    pub parent: Option<String>,
    pub training_count: usize,
    pub raw_accuracy: f64,
    /// Conservative accuracy: raw cross-validation accuracy clamped by the
    /// small-sample cap tiers.
    pub accuracy: f64,
    pub cv_folds: usize,
    pub confusion: Vec<Vec<u32>>,
    pub trained_at_unix: u64,
}

#[derive(Serialize, Deserialize)]
struct ModelFile {
    meta: ModelMeta,
    committee: CommitteeForest,
}

#[derive(Debug)]
pub struct ModelEntry {
    pub meta: ModelMeta,
    pub committee: CommitteeForest,
}

/// Process-wide model registry. Readers load the full map lock-free; the
/// single writer path clones the map, inserts, and swaps the pointer, so a
/// reader sees either the old version or the new one, never a mix.
pub struct ModelRegistry {
    root: PathBuf,
    current: ArcSwap<BTreeMap<String, Arc<ModelEntry>>>,
    write_lock: Mutex<()>,
}

impl ModelRegistry {
    pub fn open(root: &std::path::Path) -> Result<Self, MlError> {
        let dir = root.join("models");
        std::fs::create_dir_all(&dir)?;

        let mut map: BTreeMap<String, Arc<ModelEntry>> = BTreeMap::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let test_code = entry.file_name().to_string_lossy().to_string();
            if let Some(model) = load_latest(&entry.path())? {
                map.insert(test_code, Arc::new(model));
            }
        }

        Ok(Self {
            root: dir,
            current: ArcSwap::from_pointee(map),
            write_lock: Mutex::new(()),
        })
    }

    /// Latest model for the pathogen, falling back to the GENERAL bucket.
    pub fn get(&self, test_code: &str) -> Option<Arc<ModelEntry>> {
        let map = self.current.load();
        map.get(test_code)
            .or_else(|| map.get(GENERAL_MODEL))
            .cloned()
    }

    pub fn get_exact(&self, test_code: &str) -> Option<Arc<ModelEntry>> {
        self.current.load().get(test_code).cloned()
    }

    /// Train on the full history and register the result as the next
    /// version. Model versions are strictly monotone per pathogen.
    pub fn train_and_register(
        &self,
        test_code: &str,
        examples: &[TrainingExample],
    ) -> Result<ModelMeta, MlError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let history = self.list_versions(test_code)?;
        let version_num = history.last().map(|m| m.version_num).unwrap_or(0) + 1;
        let parent = history.last().map(|m| m.version.clone());

        let cv = cross_validate(examples)?;
        let committee = CommitteeForest::train(examples)?;

        let raw = cv.accuracy;
        let capped = match accuracy_cap(examples.len()) {
            Some(cap) => raw.min(cap),
            None => raw,
        };

        let meta = ModelMeta {
            test_code: test_code.to_string(),
            version: format!("v{version_num}"),
            version_num,
            parent,
            training_count: examples.len(),
            raw_accuracy: raw,
            accuracy: capped,
            cv_folds: cv.folds,
            confusion: cv.confusion,
            trained_at_unix: now_unix(),
        };

        let dir = self.root.join(test_code);
        std::fs::create_dir_all(&dir)?;
        let file = ModelFile {
            meta: meta.clone(),
            committee,
        };
        let path = dir.join(format!("v{version_num}.json"));
        std::fs::write(&path, serde_json::to_vec(&file)?)?;

        // Pointer flip: readers see the old map or the new one.
        let reloaded = load_model(&path)?;
        let mut map: BTreeMap<String, Arc<ModelEntry>> =
            self.current.load().as_ref().clone();
        map.insert(test_code.to_string(), Arc::new(reloaded));
        self.current.store(Arc::new(map));

        Ok(meta)
    }

    /// Version history for one pathogen, oldest first.
    pub fn list_versions(&self, test_code: &str) -> Result<Vec<ModelMeta>, MlError> {
        let dir = self.root.join(test_code);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut metas = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let file: ModelFile = serde_json::from_slice(&std::fs::read(&path)?)
                .map_err(|e| MlError::Corrupt(format!("{}: {e}", path.to_string_lossy())))?;
            metas.push(file.meta);
        }
        metas.sort_by_key(|m| m.version_num);
        Ok(metas)
    }
}

fn load_model(path: &std::path::Path) -> Result<ModelEntry, MlError> {
    let file: ModelFile = serde_json::from_slice(&std::fs::read(path)?)
        .map_err(|e| MlError::Corrupt(format!("{}: {e}", path.to_string_lossy())))?;
    Ok(ModelEntry {
        meta: file.meta,
        committee: file.committee,
    })
}

fn load_latest(dir: &std::path::Path) -> Result<Option<ModelEntry>, MlError> {
    let mut best: Option<(u32, PathBuf)> = None;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(num) = stem.strip_prefix('v').and_then(|s| s.parse::<u32>().ok()) else {
            continue;
        };
        if best.as_ref().map(|(b, _)| num > *b).unwrap_or(true) {
            best = Some((num, path));
        }
    }
    match best {
        Some((_, path)) => Ok(Some(load_model(&path)?)),
        None => Ok(None),
    }
}

/// Small-sample accuracy caps: an overconfident number from a tiny
/// history is worse than a pessimistic one.
pub fn accuracy_cap(training_count: usize) -> Option<f64> {
    if training_count < 20 {
        Some(0.60)
    } else if training_count < 50 {
        Some(0.80)
    } else if training_count < 100 {
        Some(0.90)
    } else {
        None
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/ml/registry.rs"]
mod tests;
