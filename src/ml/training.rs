use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::ml::MlError;

/// One expert-labeled example. Records are append-only: a later expert
/// flip appends a new record, it never rewrites history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub features: Vec<f64>,
    pub label: String,
    pub test_code: String,
    pub channel: String,
    pub well_id: String,
    pub run_id: String,
    pub recorded_at_unix: u64,
}

/// Append-only JSONL log per pathogen, one file per test code under
/// `<root>/training/`. Appends are serialized per pathogen.
#[derive(Debug)]
pub struct TrainingStore {
    root: PathBuf,
    locks: Mutex<BTreeMap<String, Arc<Mutex<()>>>>,
}

impl TrainingStore {
    pub fn open(root: &std::path::Path) -> Result<Self, MlError> {
        let dir = root.join("training");
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            root: dir,
            locks: Mutex::new(BTreeMap::new()),
        })
    }

    fn file_for(&self, test_code: &str) -> PathBuf {
        self.root.join(format!("{test_code}.jsonl"))
    }

    fn lock_for(&self, test_code: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(test_code.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Append one example and return the new total for its pathogen.
    pub fn append(&self, example: &TrainingExample) -> Result<usize, MlError> {
        let lock = self.lock_for(&example.test_code);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let line = serde_json::to_string(example)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_for(&example.test_code))?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;

        self.count_unlocked(&example.test_code)
    }

    pub fn count(&self, test_code: &str) -> Result<usize, MlError> {
        let lock = self.lock_for(test_code);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        self.count_unlocked(test_code)
    }

    fn count_unlocked(&self, test_code: &str) -> Result<usize, MlError> {
        let path = self.file_for(test_code);
        if !path.is_file() {
            return Ok(0);
        }
        let reader = BufReader::new(std::fs::File::open(path)?);
        Ok(reader.lines().filter(|l| match l {
            Ok(line) => !line.trim().is_empty(),
            Err(_) => false,
        }).count())
    }

    /// Full history in append order; the model learns from all of it.
    pub fn load(&self, test_code: &str) -> Result<Vec<TrainingExample>, MlError> {
        let lock = self.lock_for(test_code);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let path = self.file_for(test_code);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut examples = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            examples.push(serde_json::from_str(&line)?);
        }
        Ok(examples)
    }
}

pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Retraining milestones: 20, 50, 100, 200, then doubling.
pub fn is_milestone(count: usize) -> bool {
    if count == 20 || count == 50 || count == 100 {
        return true;
    }
    let mut m = 200usize;
    while m < count {
        m *= 2;
    }
    m == count
}

#[cfg(test)]
#[path = "../../tests/src_inline/ml/training.rs"]
mod tests;
