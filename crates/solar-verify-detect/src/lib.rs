//! Panel detection and scoring stages for rooftop solar verification.
//!
//! Stages, in pipeline order:
//! 1. [`preprocess`]: clamp resolution, equalize the HSV value channel.
//! 2. [`PanelDetector`]: HSV colour segmentation, morphological cleanup,
//!    contour tracing and shape filtering.
//! 3. [`coverage_percent`]: share of candidate pixels in the cleaned mask.
//! 4. [`ImageComparator`]: windowed structural similarity against a
//!    reference photo.
//! 5. [`ConfidenceScorer`]: weighted confidence and approve/reject verdict.
//!
//! Every stage is a pure function of its inputs and parameters.
//!
//! ```
//! use solar_verify_detect::{coverage_percent, PanelDetector, PanelDetectorParams};
//! use solar_verify_core::RasterImage;
//!
//! let img = RasterImage::from_pixel(64, 48, image::Rgb([220, 220, 220]));
//! let detector = PanelDetector::new(PanelDetectorParams::default());
//! let detection = detector.detect(&img).expect("valid image");
//! assert!(detection.regions.is_empty());
//! assert_eq!(coverage_percent(&detection.mask), 0.0);
//! ```

mod compare;
mod coverage;
mod detector;
mod preprocess;
mod score;

pub use compare::{CompareError, ComparatorParams, ComparisonResult, ImageComparator};
pub use coverage::coverage_percent;
pub use detector::{
    DetectError, DetectionResult, PanelDetection, PanelDetector, PanelDetectorParams,
};
pub use preprocess::{preprocess, PreprocessParams, Preprocessed};
pub use score::{ConfidenceScorer, ScoreBreakdown, Verdict, DEFAULT_MIN_CONFIDENCE};
