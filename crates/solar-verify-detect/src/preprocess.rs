//! Resolution clamp and luminance normalisation ahead of colour segmentation.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb};
use imageproc::contrast::equalize_histogram;
use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};
use solar_verify_core::RasterImage;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessParams {
    /// Larger image side above which the working copy is downscaled.
    pub max_dimension: u32,
}

impl Default for PreprocessParams {
    fn default() -> Self {
        Self {
            max_dimension: 2048,
        }
    }
}

/// Working copy handed to the panel detector.
#[derive(Clone, Debug)]
pub struct Preprocessed {
    pub image: RasterImage,
    /// `processed size / original size`; `1.0` when no downscale happened.
    pub scale: f64,
}

/// Downscale `image` to fit `max_dimension` (aspect preserved) and equalize
/// the histogram of its HSV value channel.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(image, params), fields(width = image.width(), height = image.height()))
)]
pub fn preprocess(image: &RasterImage, params: &PreprocessParams) -> Preprocessed {
    let (resized, scale) = clamp_resolution(image, params.max_dimension);
    log::debug!(
        "preprocess: {}x{} -> {}x{} (scale {:.4})",
        image.width(),
        image.height(),
        resized.width(),
        resized.height(),
        scale
    );
    Preprocessed {
        image: equalize_value_channel(&resized),
        scale,
    }
}

fn clamp_resolution(image: &RasterImage, max_dimension: u32) -> (RasterImage, f64) {
    let (w, h) = image.dimensions();
    let larger = w.max(h);
    if max_dimension == 0 || larger <= max_dimension || w == 0 || h == 0 {
        return (image.clone(), 1.0);
    }
    let scale = max_dimension as f64 / larger as f64;
    let fit = |side: u32| {
        if side == larger {
            max_dimension
        } else {
            ((side as f64 * scale).round() as u32).max(1)
        }
    };
    let resized = imageops::resize(image, fit(w), fit(h), FilterType::Triangle);
    (resized, scale)
}

fn equalize_value_channel(image: &RasterImage) -> RasterImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }

    let hsv: Vec<Hsv> = image
        .pixels()
        .map(|p| {
            let rgb: Srgb<f32> = Srgb::new(p.0[0], p.0[1], p.0[2]).into_format();
            Hsv::from_color(rgb)
        })
        .collect();

    let mut value = GrayImage::new(w, h);
    for (dst, px) in value.pixels_mut().zip(&hsv) {
        *dst = Luma([(px.value * 255.0).round().clamp(0.0, 255.0) as u8]);
    }
    let equalized = equalize_histogram(&value);

    let mut out = RasterImage::new(w, h);
    for ((dst, px), v) in out.pixels_mut().zip(&hsv).zip(equalized.pixels()) {
        let mut px = *px;
        px.value = v.0[0] as f32 / 255.0;
        let rgb: Srgb<u8> = Srgb::<f32>::from_color(px).into_format();
        *dst = Rgb([rgb.red, rgb.green, rgb.blue]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_images_keep_their_size() {
        let img = RasterImage::from_pixel(40, 30, Rgb([120, 80, 40]));
        let out = preprocess(&img, &PreprocessParams::default());
        assert_eq!(out.image.dimensions(), (40, 30));
        assert_eq!(out.scale, 1.0);
    }

    #[test]
    fn larger_side_is_clamped_with_aspect_preserved() {
        let img = RasterImage::from_pixel(300, 150, Rgb([10, 20, 30]));
        let params = PreprocessParams { max_dimension: 100 };
        let out = preprocess(&img, &params);
        assert_eq!(out.image.dimensions(), (100, 50));
        assert!((out.scale - 1.0 / 3.0).abs() < 1e-12);

        let tall = RasterImage::from_pixel(150, 301, Rgb([10, 20, 30]));
        let out = preprocess(&tall, &params);
        assert_eq!(out.image.height(), 100);
        assert_eq!(out.image.width(), 50);
    }

    #[test]
    fn equalization_stretches_value_but_keeps_hue() {
        // Dark blue block on a light gray background.
        let img = RasterImage::from_fn(20, 20, |x, _| {
            if x < 5 {
                Rgb([30, 60, 100])
            } else {
                Rgb([200, 200, 200])
            }
        });
        let out = preprocess(&img, &PreprocessParams::default()).image;

        let dark = solar_verify_core::rgb_to_hsv8(out.get_pixel(0, 0).0);
        let light = solar_verify_core::rgb_to_hsv8(out.get_pixel(19, 0).0);
        // 25% of the pixels sit at the lowest value: cdf 0.25 -> ~64.
        assert!((60..=68).contains(&dark.v), "dark value {}", dark.v);
        assert_eq!(light.v, 255);
        assert!((100..=110).contains(&dark.h), "hue {}", dark.h);
    }

    #[test]
    fn preprocessing_is_deterministic() {
        let img = RasterImage::from_fn(33, 17, |x, y| Rgb([(x * 7) as u8, (y * 13) as u8, 90]));
        let params = PreprocessParams::default();
        assert_eq!(preprocess(&img, &params).image, preprocess(&img, &params).image);
    }

    #[test]
    fn empty_image_passes_through() {
        let img = RasterImage::new(0, 0);
        let out = preprocess(&img, &PreprocessParams::default());
        assert_eq!(out.image.dimensions(), (0, 0));
    }
}
