use std::path::Path;

use crc::{CRC_64_ECMA_182, Crc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::stage8_report::{RunResult, SCHEMA_VERSION};

const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA_182);

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported artifact version: {0}")]
    UnsupportedVersion(u32),
    #[error("artifact checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch { stored: String, computed: String },
}

impl ArtifactError {
    pub fn code(&self) -> &'static str {
        "INTERNAL"
    }
}

/// Persisted run envelope: the payload plus a CRC-64 of its canonical
/// serialization, so a reloaded run is verified before anything reclassifies
/// against it.
#[derive(Debug, Serialize, Deserialize)]
struct RunArtifact {
    artifact_version: u32,
    crc64: String,
    payload: RunResult,
}

fn checksum(result: &RunResult) -> Result<String, ArtifactError> {
    let canonical = serde_json::to_vec(result)?;
    Ok(format!("{:016x}", CRC64.checksum(&canonical)))
}

pub fn write_run(path: &Path, result: &RunResult) -> Result<(), ArtifactError> {
    let artifact = RunArtifact {
        artifact_version: SCHEMA_VERSION,
        crc64: checksum(result)?,
        payload: result.clone(),
    };
    std::fs::write(path, serde_json::to_vec_pretty(&artifact)?)?;
    Ok(())
}

pub fn read_run(path: &Path) -> Result<RunResult, ArtifactError> {
    let artifact: RunArtifact = serde_json::from_slice(&std::fs::read(path)?)?;
    if artifact.artifact_version != SCHEMA_VERSION {
        return Err(ArtifactError::UnsupportedVersion(artifact.artifact_version));
    }
    let computed = checksum(&artifact.payload)?;
    if computed != artifact.crc64 {
        return Err(ArtifactError::ChecksumMismatch {
            stored: artifact.crc64,
            computed,
        });
    }
    Ok(artifact.payload)
}

/// Per-well table for downstream UIs, one row per (well, channel) in run
/// order.
pub fn write_wells_csv(path: &Path, result: &RunResult) -> Result<(), ArtifactError> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_to_io)?;
    writer
        .write_record([
            "well_id",
            "channel",
            "sample_name",
            "role",
            "test_code",
            "class_7",
            "summary_3",
            "method",
            "confidence",
            "model_version",
            "reason",
            "cqj",
            "calcj",
            "threshold",
            "threshold_source",
            "amplitude",
            "steepness",
            "midpoint",
            "baseline",
            "r2",
            "rmse",
            "snr",
            "is_good_scurve",
            "rejection_reasons",
            "anomalies",
        ])
        .map_err(csv_to_io)?;

    for well in &result.wells {
        let fit = &well.fit;
        let record: Vec<String> = vec![
            well.well_id.clone(),
            well.channel.clone(),
            well.sample_name.clone(),
            well.role.clone(),
            well.test_code.clone(),
            well.classification.class_7.clone(),
            well.classification.summary_3.clone(),
            well.classification.method.clone(),
            opt_num(well.classification.confidence),
            well.classification
                .model_version
                .clone()
                .unwrap_or_else(|| ".".to_string()),
            well.classification.reason.clone(),
            opt_num(well.cqj),
            opt_num(well.calcj),
            opt_num(well.threshold.as_ref().map(|t| t.value)),
            well.threshold
                .as_ref()
                .map(|t| t.source.as_str())
                .unwrap_or(".")
                .to_string(),
            format!("{:.4}", fit.l),
            format!("{:.4}", fit.k),
            format!("{:.4}", fit.x0),
            format!("{:.4}", fit.b),
            format!("{:.6}", fit.r2),
            format!("{:.4}", fit.rmse),
            format!("{:.4}", fit.snr),
            fit.is_good_scurve.to_string(),
            fit.rejection_reasons.to_csv(),
            if well.anomalies.is_empty() {
                ".".to_string()
            } else {
                well.anomalies.join(",")
            },
        ];
        writer.write_record(&record).map_err(csv_to_io)?;
    }

    writer.flush()?;
    Ok(())
}

fn opt_num(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.4}"),
        _ => "N/A".to_string(),
    }
}

fn csv_to_io(e: csv::Error) -> ArtifactError {
    ArtifactError::Io(std::io::Error::other(e.to_string()))
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/json.rs"]
mod tests;
