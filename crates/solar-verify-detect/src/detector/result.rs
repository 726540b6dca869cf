use serde::{Deserialize, Serialize};
use solar_verify_core::{BinaryMask, PanelRegion};

use crate::coverage_percent;

/// Raw detector output on the (preprocessed) working image.
#[derive(Clone, Debug)]
pub struct PanelDetection {
    /// Accepted regions, in tracing order.
    pub regions: Vec<PanelRegion>,
    /// Candidate mask after morphological cleanup, before shape filtering.
    pub mask: BinaryMask,
    /// Number of traced boundaries before filtering.
    pub contours_traced: usize,
}

/// Detection result expressed in original-image coordinates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectionResult {
    pub regions: Vec<PanelRegion>,
    #[serde(skip)]
    pub mask: Option<BinaryMask>,
    /// Percentage of mask pixels set, in `[0, 100]`.
    pub coverage: f64,
    /// Working-image scale the detector ran at.
    pub scale: f64,
}

impl DetectionResult {
    /// Map a working-image detection back to the original resolution.
    pub fn from_detection(detection: PanelDetection, scale: f64) -> Self {
        let coverage = coverage_percent(&detection.mask);
        let back = if scale > 0.0 { 1.0 / scale } else { 1.0 };
        let regions = detection
            .regions
            .iter()
            .map(|r| r.scaled(back))
            .collect();
        Self {
            regions,
            mask: Some(detection.mask),
            coverage,
            scale,
        }
    }

    pub fn panel_count(&self) -> usize {
        self.regions.len()
    }

    pub fn panels_found(&self) -> bool {
        !self.regions.is_empty()
    }
}
