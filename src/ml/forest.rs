use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::ml::MlError;
use crate::ml::training::TrainingExample;
use crate::model::classes::WellClass;

pub const COMMITTEE_SIZE: usize = 5;
pub const TREES_PER_MEMBER: u16 = 20;
const BASE_SEED: u64 = 0x51C0_FFEE;

type Forest = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// A small committee of forests with distinct deterministic seeds. The
/// committee exists because a single forest reports only a label; the
/// agreement fraction across members is the prediction confidence.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommitteeForest {
    members: Vec<Forest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvReport {
    pub accuracy: f64,
    pub folds: usize,
    /// 7x7 confusion matrix indexed [actual][predicted] by class label.
    pub confusion: Vec<Vec<u32>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub class: WellClass,
    pub confidence: f64,
}

fn matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>, MlError> {
    let n = rows.len();
    let m = rows.first().map(|r| r.len()).unwrap_or(0);
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Ok(DenseMatrix::new(n, m, flat, false))
}

fn params(seed: u64) -> RandomForestClassifierParameters {
    RandomForestClassifierParameters::default()
        .with_n_trees(TREES_PER_MEMBER)
        .with_max_depth(8)
        .with_min_samples_leaf(1)
        .with_min_samples_split(2)
        .with_seed(seed)
}

impl CommitteeForest {
    pub fn train(examples: &[TrainingExample]) -> Result<Self, MlError> {
        let rows: Vec<Vec<f64>> = examples.iter().map(|e| e.features.clone()).collect();
        let labels: Vec<i32> = examples
            .iter()
            .map(|e| {
                WellClass::from_str(&e.label)
                    .unwrap_or(WellClass::Negative)
                    .label()
            })
            .collect();
        Self::train_raw(&rows, &labels)
    }

    fn train_raw(rows: &[Vec<f64>], labels: &[i32]) -> Result<Self, MlError> {
        let x = matrix(rows)?;
        let y = labels.to_vec();
        let mut members = Vec::with_capacity(COMMITTEE_SIZE);
        for i in 0..COMMITTEE_SIZE {
            let forest = RandomForestClassifier::fit(&x, &y, params(BASE_SEED + i as u64))
                .map_err(|e| MlError::Train(e.to_string()))?;
            members.push(forest);
        }
        Ok(Self { members })
    }

    /// Majority vote across members; confidence is the agreement fraction.
    pub fn predict(&self, features: &[f64]) -> Result<Prediction, MlError> {
        let x = matrix(&[features.to_vec()])?;
        let mut votes = [0usize; 7];
        for member in &self.members {
            let predicted = member
                .predict(&x)
                .map_err(|e| MlError::Train(e.to_string()))?;
            let label = predicted.first().copied().unwrap_or(6);
            let slot = label.clamp(0, 6) as usize;
            votes[slot] += 1;
        }

        let (best, count) = votes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(i, c)| (i, *c))
            .unwrap_or((6, 0));

        Ok(Prediction {
            class: WellClass::from_label(best as i32),
            confidence: count as f64 / self.members.len() as f64,
        })
    }
}

/// Deterministic k-fold cross-validation: contiguous folds, no shuffle, so
/// the same history always yields the same report. 3 folds under 30
/// examples, 5 otherwise.
pub fn cross_validate(examples: &[TrainingExample]) -> Result<CvReport, MlError> {
    let rows: Vec<Vec<f64>> = examples.iter().map(|e| e.features.clone()).collect();
    let labels: Vec<i32> = examples
        .iter()
        .map(|e| {
            WellClass::from_str(&e.label)
                .unwrap_or(WellClass::Negative)
                .label()
        })
        .collect();

    let n = rows.len();
    let folds = if n < 30 { 3 } else { 5 };
    let mut confusion = vec![vec![0u32; 7]; 7];
    let mut correct = 0usize;
    let mut total = 0usize;

    for fold in 0..folds {
        let lo = n * fold / folds;
        let hi = n * (fold + 1) / folds;
        if lo == hi {
            continue;
        }

        let mut train_rows = Vec::with_capacity(n - (hi - lo));
        let mut train_labels = Vec::with_capacity(n - (hi - lo));
        for i in (0..n).filter(|i| *i < lo || *i >= hi) {
            train_rows.push(rows[i].clone());
            train_labels.push(labels[i]);
        }
        if train_rows.is_empty() || train_labels.iter().all(|l| *l == train_labels[0]) {
            // A single-class fold cannot train a discriminator; count the
            // held-out items against the majority label instead.
            let majority = train_labels.first().copied().unwrap_or(6);
            for i in lo..hi {
                let actual = labels[i].clamp(0, 6) as usize;
                let predicted = majority.clamp(0, 6) as usize;
                confusion[actual][predicted] += 1;
                if labels[i] == majority {
                    correct += 1;
                }
                total += 1;
            }
            continue;
        }

        let model = CommitteeForest::train_raw(&train_rows, &train_labels)?;
        for i in lo..hi {
            let prediction = model.predict(&rows[i])?;
            let actual = labels[i].clamp(0, 6) as usize;
            let predicted = prediction.class.label().clamp(0, 6) as usize;
            confusion[actual][predicted] += 1;
            if predicted == actual {
                correct += 1;
            }
            total += 1;
        }
    }

    Ok(CvReport {
        accuracy: if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        },
        folds,
        confusion,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/ml/forest.rs"]
mod tests;
