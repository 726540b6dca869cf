//! JSON configuration and report helpers.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use solar_verify_detect::{
    ComparatorParams, PanelDetectorParams, PreprocessParams, Verdict, DEFAULT_MIN_CONFIDENCE,
};

use crate::verify::{Status, VerificationRecord};

/// File name of the report written by [`crate::VerificationPipeline::persist`].
pub const LATEST_RESULTS_FILE: &str = "latest_results.json";

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("verification_results")
}

fn default_render() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Write the annotated report image for scored verifications.
    #[serde(default = "default_render")]
    pub render: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            render: default_render(),
        }
    }
}

/// Everything a [`crate::VerificationPipeline`] is configured with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Confidence at or above which an installation is approved.
    pub min_confidence: f64,
    pub preprocess: PreprocessParams,
    pub detector: PanelDetectorParams,
    pub comparator: ComparatorParams,
    pub output: OutputConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            preprocess: PreprocessParams::default(),
            detector: PanelDetectorParams::default(),
            comparator: ComparatorParams::default(),
            output: OutputConfig::default(),
        }
    }
}

impl VerifierConfig {
    /// Load a JSON config from disk. Missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Flat, persisted view of a [`VerificationRecord`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// ISO-8601 local time with offset.
    pub timestamp: String,
    pub status: Status,
    pub verdict: Verdict,
    pub solar_detected: bool,
    pub solar_coverage: f64,
    pub similarity_score: f64,
    pub confidence: f64,
    pub panel_count: usize,
    pub message: String,
    #[serde(default)]
    pub output_image_path: Option<String>,
    #[serde(default)]
    pub user_image_path: Option<String>,
    #[serde(default)]
    pub satellite_image_path: Option<String>,
}

impl From<&VerificationRecord> for VerificationReport {
    fn from(record: &VerificationRecord) -> Self {
        Self {
            timestamp: record.timestamp().to_rfc3339(),
            status: record.status(),
            verdict: record.verdict(),
            solar_detected: record.solar_detected(),
            solar_coverage: record.coverage(),
            similarity_score: record.similarity().unwrap_or(0.0),
            confidence: record.confidence(),
            panel_count: record.panel_count(),
            message: record.message().to_string(),
            output_image_path: record
                .output_image_path()
                .map(|p| p.display().to_string()),
            user_image_path: record.inputs().user_image_path.clone(),
            satellite_image_path: record.inputs().satellite_image_path.clone(),
        }
    }
}

impl VerificationReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn is_approved(&self) -> bool {
        self.status == Status::Completed && self.verdict.is_approved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_json_gives_defaults() {
        let cfg: VerifierConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(cfg, VerifierConfig::default());
        assert_eq!(cfg.min_confidence, 0.45);
        assert_eq!(cfg.output.results_dir, PathBuf::from("verification_results"));
        assert!(cfg.output.render);
    }

    #[test]
    fn nested_partial_config_keeps_other_defaults() {
        let cfg: VerifierConfig = serde_json::from_str(
            r#"{ "min_confidence": 0.6, "detector": { "morph_kernel": 5 }, "output": { "render": false } }"#,
        )
        .expect("parse");
        assert_eq!(cfg.min_confidence, 0.6);
        assert_eq!(cfg.detector.morph_kernel, 5);
        assert_eq!(cfg.detector.min_vertices, 4);
        assert_eq!(cfg.preprocess.max_dimension, 2048);
        assert!(!cfg.output.render);
        assert_eq!(cfg.output.results_dir, PathBuf::from("verification_results"));
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let mut cfg = VerifierConfig::default();
        cfg.preprocess.max_dimension = 1024;
        cfg.write_json(&path).expect("write");
        assert_eq!(VerifierConfig::load_json(&path).expect("load"), cfg);
    }

    #[test]
    fn report_field_names_are_stable() {
        let report = VerificationReport {
            timestamp: "2024-03-09T14:05:07+00:00".into(),
            status: Status::Completed,
            verdict: Verdict::Approved,
            solar_detected: true,
            solar_coverage: 20.0,
            similarity_score: 0.0,
            confidence: 0.58,
            panel_count: 3,
            message: "ok".into(),
            output_image_path: None,
            user_image_path: Some("roof.png".into()),
            satellite_image_path: None,
        };
        let value = serde_json::to_value(&report).expect("json");
        assert_eq!(value["status"], "COMPLETED");
        assert_eq!(value["verdict"], "APPROVED");
        assert_eq!(value["solar_coverage"], 20.0);
        assert_eq!(value["user_image_path"], "roof.png");
        assert!(value["output_image_path"].is_null());
        assert!(report.is_approved());
    }
}
