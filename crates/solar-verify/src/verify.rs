//! End-to-end verification: detect, compare, score, render, record.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use solar_verify_core::RasterImage;
use solar_verify_detect::{
    preprocess, CompareError, ComparisonResult, ConfidenceScorer, DetectError, DetectionResult,
    ImageComparator, PanelDetector, Verdict,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::io::{IoError, VerificationReport, VerifierConfig, LATEST_RESULTS_FILE};
use crate::report::{RenderError, ReportRenderer, ReportSummary};

pub const NO_PANELS_MESSAGE: &str = "No solar panels detected in the image";

/// Failures inside a stage after the inputs were loaded.
#[derive(thiserror::Error, Debug)]
pub enum ProcessingError {
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error(transparent)]
    Compare(#[from] CompareError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(thiserror::Error, Debug)]
pub enum VerifyError {
    #[error("cannot read primary image {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("processing failed: {0}")]
    Processing(#[from] ProcessingError),
}

impl From<DetectError> for VerifyError {
    fn from(e: DetectError) -> Self {
        VerifyError::Processing(e.into())
    }
}

impl From<CompareError> for VerifyError {
    fn from(e: CompareError) -> Self {
        VerifyError::Processing(e.into())
    }
}

impl From<RenderError> for VerifyError {
    fn from(e: RenderError) -> Self {
        VerifyError::Processing(e.into())
    }
}

/// Decode an image file into an 8-bit RGB raster.
pub fn load_image(path: impl AsRef<Path>) -> Result<RasterImage, VerifyError> {
    let path = path.as_ref();
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|source| VerifyError::Input {
            path: path.to_path_buf(),
            source,
        })
}

/// Where the inputs of a verification came from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRefs {
    pub user_image_path: Option<String>,
    pub satellite_image_path: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Completed,
    Error,
}

/// Numbers of a verification that reached the scoring stage.
#[derive(Clone, Debug)]
pub struct ScoredOutcome {
    pub detection: DetectionResult,
    pub comparison: Option<ComparisonResult>,
    /// Coverage percent, two decimals.
    pub coverage: f64,
    /// Normalised similarity, three decimals; `None` without a reference.
    pub similarity: Option<f64>,
    /// Confidence, three decimals.
    pub confidence: f64,
    pub verdict: Verdict,
    pub output_image_path: Option<PathBuf>,
}

/// Terminal state of one verification call.
#[derive(Clone, Debug)]
pub enum VerificationOutcome {
    /// An input could not be read or a stage failed.
    Error(String),
    /// The detector accepted no region; nothing was scored.
    NoPanels(DetectionResult),
    Scored(Box<ScoredOutcome>),
}

/// Immutable result of one verification call.
#[derive(Clone, Debug)]
pub struct VerificationRecord {
    timestamp: DateTime<Local>,
    inputs: InputRefs,
    outcome: VerificationOutcome,
    message: String,
}

impl VerificationRecord {
    fn new(timestamp: DateTime<Local>, inputs: InputRefs, outcome: VerificationOutcome) -> Self {
        let message = match &outcome {
            VerificationOutcome::Error(msg) => msg.clone(),
            VerificationOutcome::NoPanels(_) => NO_PANELS_MESSAGE.to_string(),
            VerificationOutcome::Scored(s) => {
                let pct = s.confidence * 100.0;
                if s.verdict.is_approved() {
                    format!("Solar installation verified successfully (Confidence: {pct:.1}%)")
                } else {
                    format!("Solar installation verification failed (Confidence: {pct:.1}%)")
                }
            }
        };
        Self {
            timestamp,
            inputs,
            outcome,
            message,
        }
    }

    pub fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }

    pub fn inputs(&self) -> &InputRefs {
        &self.inputs
    }

    pub fn outcome(&self) -> &VerificationOutcome {
        &self.outcome
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> Status {
        match self.outcome {
            VerificationOutcome::Error(_) => Status::Error,
            _ => Status::Completed,
        }
    }

    /// `REJECTED` for every outcome except an approved score.
    pub fn verdict(&self) -> Verdict {
        match &self.outcome {
            VerificationOutcome::Scored(s) => s.verdict,
            _ => Verdict::Rejected,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.verdict().is_approved()
    }

    pub fn solar_detected(&self) -> bool {
        matches!(self.outcome, VerificationOutcome::Scored(_))
    }

    pub fn coverage(&self) -> f64 {
        match &self.outcome {
            VerificationOutcome::Scored(s) => s.coverage,
            _ => 0.0,
        }
    }

    pub fn similarity(&self) -> Option<f64> {
        match &self.outcome {
            VerificationOutcome::Scored(s) => s.similarity,
            _ => None,
        }
    }

    pub fn confidence(&self) -> f64 {
        match &self.outcome {
            VerificationOutcome::Scored(s) => s.confidence,
            _ => 0.0,
        }
    }

    pub fn panel_count(&self) -> usize {
        match &self.outcome {
            VerificationOutcome::Scored(s) => s.detection.panel_count(),
            _ => 0,
        }
    }

    pub fn detection(&self) -> Option<&DetectionResult> {
        match &self.outcome {
            VerificationOutcome::Scored(s) => Some(&s.detection),
            VerificationOutcome::NoPanels(d) => Some(d),
            VerificationOutcome::Error(_) => None,
        }
    }

    pub fn output_image_path(&self) -> Option<&Path> {
        match &self.outcome {
            VerificationOutcome::Scored(s) => s.output_image_path.as_deref(),
            _ => None,
        }
    }

    pub fn to_report(&self) -> VerificationReport {
        VerificationReport::from(self)
    }
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}

/// Runs the detect, compare, score and render stages with one configuration.
#[derive(Clone, Debug)]
pub struct VerificationPipeline {
    config: VerifierConfig,
    detector: PanelDetector,
    comparator: ImageComparator,
    scorer: ConfidenceScorer,
    renderer: ReportRenderer,
}

impl Default for VerificationPipeline {
    fn default() -> Self {
        Self::new(VerifierConfig::default())
    }
}

impl VerificationPipeline {
    pub fn new(config: VerifierConfig) -> Self {
        Self {
            detector: PanelDetector::new(config.detector.clone()),
            comparator: ImageComparator::new(config.comparator.clone()),
            scorer: ConfidenceScorer::new(config.min_confidence),
            renderer: ReportRenderer::new(config.output.results_dir.clone()),
            config,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify in-memory images. Failures are reported as an error record,
    /// never as a panic or an `Err`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, primary, reference, inputs), fields(width = primary.width(), height = primary.height(), reference = reference.is_some()))
    )]
    pub fn verify(
        &self,
        primary: &RasterImage,
        reference: Option<&RasterImage>,
        inputs: InputRefs,
    ) -> VerificationRecord {
        let timestamp = Local::now();
        let outcome = match self.run(primary, reference, &timestamp) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("verification failed: {e}");
                VerificationOutcome::Error(e.to_string())
            }
        };
        let record = VerificationRecord::new(timestamp, inputs, outcome);
        log::info!("{}: {}", record.verdict(), record.message());
        record
    }

    /// Load the primary (and optional reference) image from disk and verify.
    ///
    /// An unreadable primary image yields an error record; an unreadable
    /// reference is logged and the verification proceeds without it.
    pub fn verify_paths(
        &self,
        primary_path: impl AsRef<Path>,
        reference_path: Option<&Path>,
    ) -> VerificationRecord {
        let primary_path = primary_path.as_ref();
        let inputs = InputRefs {
            user_image_path: Some(primary_path.display().to_string()),
            satellite_image_path: reference_path.map(|p| p.display().to_string()),
        };

        let primary = match load_image(primary_path) {
            Ok(img) => img,
            Err(e) => {
                log::error!("{e}");
                let outcome = VerificationOutcome::Error(e.to_string());
                return VerificationRecord::new(Local::now(), inputs, outcome);
            }
        };

        let reference = reference_path.and_then(|p| match load_image(p) {
            Ok(img) => Some(img),
            Err(e) => {
                log::warn!("ignoring reference image: {e}");
                None
            }
        });

        self.verify(&primary, reference.as_ref(), inputs)
    }

    /// Write `record` as `latest_results.json` into the results directory.
    pub fn persist(&self, record: &VerificationRecord) -> Result<PathBuf, IoError> {
        let dir = &self.config.output.results_dir;
        fs::create_dir_all(dir)?;
        let path = dir.join(LATEST_RESULTS_FILE);
        record.to_report().write_json(&path)?;
        log::debug!("results written to {}", path.display());
        Ok(path)
    }

    fn run(
        &self,
        primary: &RasterImage,
        reference: Option<&RasterImage>,
        at: &DateTime<Local>,
    ) -> Result<VerificationOutcome, VerifyError> {
        let pre = preprocess(primary, &self.config.preprocess);
        let detection = self.detector.detect(&pre.image)?;
        let detection = DetectionResult::from_detection(detection, pre.scale);

        if !detection.panels_found() {
            return Ok(VerificationOutcome::NoPanels(detection));
        }

        let comparison = reference
            .map(|r| self.comparator.compare(primary, r))
            .transpose()?;

        let coverage = round_to(detection.coverage, 2);
        let similarity = comparison.map(|c| round_to(c.similarity, 3));
        let confidence = self
            .scorer
            .confidence(coverage, similarity, detection.panel_count());
        let verdict = self.scorer.verdict(confidence);
        log::debug!(
            "score: coverage={coverage:.2} similarity={similarity:?} panels={} confidence={confidence:.4}",
            detection.panel_count()
        );

        let output_image_path = if self.config.output.render {
            let summary = ReportSummary {
                verdict,
                coverage,
                confidence,
                panel_count: detection.panel_count(),
            };
            Some(
                self.renderer
                    .render_to_file(primary, &detection.regions, &summary, at)?,
            )
        } else {
            None
        };

        Ok(VerificationOutcome::Scored(Box::new(ScoredOutcome {
            detection,
            comparison,
            coverage,
            similarity,
            confidence: round_to(confidence, 3),
            verdict,
            output_image_path,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn no_render() -> VerificationPipeline {
        let mut cfg = VerifierConfig::default();
        cfg.output.render = false;
        VerificationPipeline::new(cfg)
    }

    #[test]
    fn rounding_helpers() {
        assert_eq!(round_to(12.345_678, 2), 12.35);
        assert_eq!(round_to(0.583_33, 3), 0.583);
    }

    #[test]
    fn uniform_image_is_a_no_panel_record() {
        let img = RasterImage::from_pixel(80, 60, Rgb([160, 100, 80]));
        let record = no_render().verify(&img, None, InputRefs::default());
        assert!(matches!(record.outcome(), VerificationOutcome::NoPanels(_)));
        assert_eq!(record.status(), Status::Completed);
        assert_eq!(record.verdict(), Verdict::Rejected);
        assert_eq!(record.message(), NO_PANELS_MESSAGE);
        assert_eq!(record.coverage(), 0.0);
        assert!(record.output_image_path().is_none());
    }

    #[test]
    fn empty_primary_is_an_error_record() {
        let img = RasterImage::new(0, 0);
        let record = no_render().verify(&img, None, InputRefs::default());
        assert_eq!(record.status(), Status::Error);
        assert!(!record.solar_detected());
        assert!(record.message().contains("no pixels"), "{}", record.message());
    }

    #[test]
    fn missing_primary_file_is_an_input_error() {
        let err = load_image("/definitely/not/here.png").expect_err("missing");
        assert!(matches!(err, VerifyError::Input { .. }));
        let record = no_render().verify_paths("/definitely/not/here.png", None);
        assert_eq!(record.status(), Status::Error);
        assert_eq!(
            record.inputs().user_image_path.as_deref(),
            Some("/definitely/not/here.png")
        );
    }

    fn one_panel_scene() -> RasterImage {
        RasterImage::from_fn(200, 150, |x, y| {
            if (20..80).contains(&x) && (40..100).contains(&y) {
                Rgb([30, 60, 100])
            } else {
                Rgb([220, 220, 220])
            }
        })
    }

    #[test]
    fn scored_message_reports_confidence() {
        let img = one_panel_scene();
        let record = no_render().verify(&img, None, InputRefs::default());
        let VerificationOutcome::Scored(scored) = record.outcome() else {
            panic!("expected a scored outcome, got {:?}", record.outcome());
        };
        assert_eq!(scored.detection.panel_count(), 1);
        assert!(scored.similarity.is_none());
        // 12% coverage saturates, one panel adds 0.06.
        assert_eq!(record.confidence(), 0.46);
        assert!(record.is_approved());
        assert_eq!(
            record.message(),
            "Solar installation verified successfully (Confidence: 46.0%)"
        );
    }

    #[test]
    fn reference_below_window_size_is_an_error_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let results = dir.path().join("results");
        let mut cfg = VerifierConfig::default();
        cfg.output.results_dir = results.clone();
        cfg.output.render = true;
        let pipeline = VerificationPipeline::new(cfg);
        let reference = RasterImage::from_pixel(5, 5, Rgb([220, 220, 220]));

        let record = pipeline.verify(&one_panel_scene(), Some(&reference), InputRefs::default());

        assert!(matches!(record.outcome(), VerificationOutcome::Error(_)));
        assert_eq!(record.status(), Status::Error);
        assert_eq!(record.verdict(), Verdict::Rejected);
        assert!(record.output_image_path().is_none());
        let written = std::fs::read_dir(&results).map(|it| it.count()).unwrap_or(0);
        assert_eq!(written, 0);
    }
}
