use serde::{Deserialize, Serialize};
use solar_verify_core::{Hsv8, HsvRange};

use super::DetectError;

/// Configuration for the colour/shape panel detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelDetectorParams {
    /// Dark, blue-leaning, not washed out pixels.
    pub candidate: HsvRange,
    /// Brown/red roofing bands removed from the candidate mask.
    pub exclusions: Vec<HsvRange>,
    /// Side of the square structuring element used for close-then-open.
    ///
    /// Must be odd; `0` disables mask cleanup.
    pub morph_kernel: u32,
    /// Minimum contour area as a fraction of the image area.
    pub min_area_frac: f64,
    /// Polygon simplification tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_frac: f64,
    /// Minimum vertex count of the simplified polygon.
    pub min_vertices: usize,
    /// Exclusive lower bound on bounding-box `width / height`.
    pub aspect_ratio_min: f64,
    /// Exclusive upper bound on bounding-box `width / height`.
    pub aspect_ratio_max: f64,
}

impl Default for PanelDetectorParams {
    fn default() -> Self {
        Self {
            candidate: HsvRange::new(Hsv8::new(80, 50, 20), Hsv8::new(140, 255, 150)),
            exclusions: vec![
                HsvRange::new(Hsv8::new(0, 40, 30), Hsv8::new(25, 255, 180)),
                HsvRange::new(Hsv8::new(160, 40, 30), Hsv8::new(180, 255, 180)),
            ],
            morph_kernel: 7,
            min_area_frac: 0.002,
            approx_epsilon_frac: 0.02,
            min_vertices: 4,
            aspect_ratio_min: 0.2,
            aspect_ratio_max: 5.0,
        }
    }
}

impl PanelDetectorParams {
    /// Reject parameter sets the detector cannot run with.
    pub fn validate(&self) -> Result<(), DetectError> {
        let invalid = |reason: &str| Err(DetectError::InvalidParams(reason.to_string()));
        if self.candidate.is_empty() {
            return invalid("candidate HSV range is empty");
        }
        if self.morph_kernel != 0 && self.morph_kernel % 2 == 0 {
            return invalid("morph_kernel must be odd (or 0 to disable cleanup)");
        }
        if self.morph_kernel > 2 * u8::MAX as u32 + 1 {
            return invalid("morph_kernel is too large");
        }
        if !(0.0..=1.0).contains(&self.min_area_frac) {
            return invalid("min_area_frac must lie in [0, 1]");
        }
        if !(self.approx_epsilon_frac.is_finite() && self.approx_epsilon_frac > 0.0) {
            return invalid("approx_epsilon_frac must be positive");
        }
        if !(self.aspect_ratio_min.is_finite()
            && self.aspect_ratio_max.is_finite()
            && self.aspect_ratio_min < self.aspect_ratio_max)
        {
            return invalid("aspect ratio bounds must be finite with min < max");
        }
        Ok(())
    }

    /// Half-width of the structuring element, as used by `imageproc` morphology.
    pub(crate) fn morph_radius(&self) -> Option<u8> {
        (self.morph_kernel > 0).then(|| (self.morph_kernel / 2) as u8)
    }

    #[inline]
    pub(crate) fn aspect_ok(&self, aspect: f64) -> bool {
        aspect > self.aspect_ratio_min && aspect < self.aspect_ratio_max
    }
}
