//! Colour/shape panel detector.
//!
//! This module wires together HSV segmentation, morphological mask cleanup,
//! contour tracing and the panel shape filter.

mod error;
mod params;
mod pipeline;
mod result;
mod segment;

pub use error::DetectError;
pub use params::PanelDetectorParams;
pub use pipeline::PanelDetector;
pub use result::{DetectionResult, PanelDetection};
