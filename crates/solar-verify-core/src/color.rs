//! 8-bit HSV pixels and inclusive HSV ranges.
//!
//! Hue is stored as degrees / 2 in `[0, 180)`, saturation and value in
//! `[0, 255]`, so panel colour thresholds can be written in the usual
//! 8-bit HSV convention.

use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hsv8 {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv8 {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// Convert an RGB pixel into 8-bit HSV.
pub fn rgb_to_hsv8(rgb: [u8; 3]) -> Hsv8 {
    let srgb: Srgb<f32> = Srgb::new(rgb[0], rgb[1], rgb[2]).into_format();
    let hsv: Hsv = Hsv::from_color(srgb);
    let half_degrees = (hsv.hue.into_positive_degrees() * 0.5).round() as u16;
    Hsv8 {
        h: (half_degrees % 180) as u8,
        s: unit_to_u8(hsv.saturation),
        v: unit_to_u8(hsv.value),
    }
}

#[inline]
fn unit_to_u8(x: f32) -> u8 {
    (x * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Inclusive per-channel HSV box, `lower <= pixel <= upper` on all channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: Hsv8,
    pub upper: Hsv8,
}

impl HsvRange {
    pub const fn new(lower: Hsv8, upper: Hsv8) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, px: Hsv8) -> bool {
        (self.lower.h..=self.upper.h).contains(&px.h)
            && (self.lower.s..=self.upper.s).contains(&px.s)
            && (self.lower.v..=self.upper.v).contains(&px.v)
    }

    /// A range whose lower bound exceeds its upper bound on some channel
    /// matches nothing.
    pub fn is_empty(&self) -> bool {
        self.lower.h > self.upper.h || self.lower.s > self.upper.s || self.lower.v > self.upper.v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_map_to_half_degree_hues() {
        assert_eq!(rgb_to_hsv8([255, 0, 0]), Hsv8::new(0, 255, 255));
        assert_eq!(rgb_to_hsv8([0, 255, 0]), Hsv8::new(60, 255, 255));
        assert_eq!(rgb_to_hsv8([0, 0, 255]), Hsv8::new(120, 255, 255));
    }

    #[test]
    fn grays_have_no_saturation() {
        let hsv = rgb_to_hsv8([220, 220, 220]);
        assert_eq!(hsv.s, 0);
        assert_eq!(hsv.v, 220);
    }

    #[test]
    fn dark_panel_blue_is_blue_leaning_and_dark() {
        let hsv = rgb_to_hsv8([30, 60, 100]);
        assert!((100..=110).contains(&hsv.h), "hue {}", hsv.h);
        assert!(hsv.s > 150);
        assert_eq!(hsv.v, 100);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let r = HsvRange::new(Hsv8::new(80, 50, 20), Hsv8::new(140, 255, 150));
        assert!(r.contains(Hsv8::new(80, 50, 20)));
        assert!(r.contains(Hsv8::new(140, 255, 150)));
        assert!(!r.contains(Hsv8::new(79, 200, 100)));
        assert!(!r.contains(Hsv8::new(100, 200, 151)));
        assert!(!r.is_empty());
        assert!(HsvRange::new(Hsv8::new(10, 0, 0), Hsv8::new(5, 255, 255)).is_empty());
    }
}
