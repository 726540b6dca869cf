//! HSV segmentation and mask cleanup.

use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use solar_verify_core::{rgb_to_hsv8, BinaryMask, RasterImage};

use super::{DetectError, PanelDetectorParams};

/// Candidate pixels minus every exclusion band.
pub(crate) fn segment_candidates(
    image: &RasterImage,
    params: &PanelDetectorParams,
) -> Result<BinaryMask, DetectError> {
    let candidate = BinaryMask::from_fn(image, |p| params.candidate.contains(rgb_to_hsv8(p.0)));
    let excluded = BinaryMask::from_fn(image, |p| {
        let hsv = rgb_to_hsv8(p.0);
        params.exclusions.iter().any(|band| band.contains(hsv))
    });

    Ok(candidate.and_not(&excluded)?)
}

/// Morphological close then open with a square structuring element.
///
/// Close fills pinholes and grid lines inside panels, open removes isolated
/// specks.
pub(crate) fn clean_mask(mask: &BinaryMask, params: &PanelDetectorParams) -> BinaryMask {
    match params.morph_radius() {
        None | Some(0) => mask.clone(),
        Some(k) => {
            let closed = close(mask.as_gray(), Norm::LInf, k);
            BinaryMask::from_gray(open(&closed, Norm::LInf, k))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use solar_verify_core::{Hsv8, HsvRange};

    const PANEL: Rgb<u8> = Rgb([30, 60, 100]);
    const ROOF_RED: Rgb<u8> = Rgb([160, 100, 80]);
    const SKY: Rgb<u8> = Rgb([220, 220, 220]);

    #[test]
    fn dark_blue_is_candidate_and_red_roof_is_not() {
        let img = RasterImage::from_fn(30, 10, |x, _| match x / 10 {
            0 => PANEL,
            1 => ROOF_RED,
            _ => SKY,
        });
        let mask = segment_candidates(&img, &PanelDetectorParams::default()).expect("mask");
        assert!(mask.get(5, 5));
        assert!(!mask.get(15, 5));
        assert!(!mask.get(25, 5));
        assert_eq!(mask.count_nonzero(), 100);
    }

    #[test]
    fn exclusion_band_wins_over_candidate() {
        let mut params = PanelDetectorParams::default();
        // Widen the exclusion band to cover the panel hue as well.
        params.exclusions = vec![HsvRange::new(
            Hsv8::new(0, 0, 0),
            Hsv8::new(180, 255, 255),
        )];
        let img = RasterImage::from_pixel(8, 8, PANEL);
        let mask = segment_candidates(&img, &params).expect("mask");
        assert_eq!(mask.count_nonzero(), 0);
    }

    #[test]
    fn close_fills_thin_grid_lines() {
        // 40x40 block split by a 2 px vertical seam.
        let mut mask = BinaryMask::new(60, 60);
        for y in 10..50 {
            for x in 10..50 {
                if !(29..31).contains(&x) {
                    mask.set(x, y, true);
                }
            }
        }
        let cleaned = clean_mask(&mask, &PanelDetectorParams::default());
        assert!(cleaned.get(29, 30));
        assert!(cleaned.get(30, 30));
    }

    #[test]
    fn open_removes_isolated_specks() {
        let mut mask = BinaryMask::new(40, 40);
        for y in 5..8 {
            for x in 5..8 {
                mask.set(x, y, true);
            }
        }
        let cleaned = clean_mask(&mask, &PanelDetectorParams::default());
        assert_eq!(cleaned.count_nonzero(), 0);
    }

    #[test]
    fn zero_kernel_leaves_mask_untouched() {
        let mut mask = BinaryMask::new(10, 10);
        mask.set(3, 3, true);
        let params = PanelDetectorParams {
            morph_kernel: 0,
            ..PanelDetectorParams::default()
        };
        assert_eq!(clean_mask(&mask, &params), mask);
    }
}
