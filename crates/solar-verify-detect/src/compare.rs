//! Structural similarity between the primary photo and a reference photo.

use image::imageops::{self, FilterType};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use solar_verify_core::RasterImage;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error("image too small for a {window}x{window} window ({width}x{height})")]
    ImageTooSmall { width: u32, height: u32, window: u32 },
    #[error("invalid comparator parameters: {0}")]
    InvalidParams(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorParams {
    /// Side of the square SSIM window (odd).
    pub window: u32,
    pub k1: f64,
    pub k2: f64,
}

impl Default for ComparatorParams {
    fn default() -> Self {
        Self {
            window: 7,
            k1: 0.01,
            k2: 0.03,
        }
    }
}

/// SSIM outcome.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Mean SSIM over all windows, in `[-1, 1]`.
    pub raw_ssim: f64,
    /// `(raw_ssim + 1) / 2`, in `[0, 1]`.
    pub similarity: f64,
    /// Common size both images were compared at.
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, Default)]
pub struct ImageComparator {
    params: ComparatorParams,
}

impl ImageComparator {
    pub fn new(params: ComparatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ComparatorParams {
        &self.params
    }

    /// Compare `a` against `b` after resizing both to their common minimum
    /// size and converting to grayscale.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, a, b), fields(a = ?a.dimensions(), b = ?b.dimensions()))
    )]
    pub fn compare(
        &self,
        a: &RasterImage,
        b: &RasterImage,
    ) -> Result<ComparisonResult, CompareError> {
        let win = self.params.window;
        if win == 0 || win % 2 == 0 {
            return Err(CompareError::InvalidParams(format!(
                "window must be odd and positive, got {win}"
            )));
        }

        let width = a.width().min(b.width());
        let height = a.height().min(b.height());
        if width < win || height < win {
            return Err(CompareError::ImageTooSmall {
                width,
                height,
                window: win,
            });
        }

        let ga = to_gray(a, width, height);
        let gb = to_gray(b, width, height);
        let raw = mean_ssim(&ga, &gb, &self.params);
        let similarity = ((raw + 1.0) / 2.0).clamp(0.0, 1.0);
        log::debug!("compare: {width}x{height} ssim={raw:.4} similarity={similarity:.4}");

        Ok(ComparisonResult {
            raw_ssim: raw,
            similarity,
            width,
            height,
        })
    }
}

fn to_gray(img: &RasterImage, width: u32, height: u32) -> GrayImage {
    if img.dimensions() == (width, height) {
        imageops::grayscale(img)
    } else {
        let resized = imageops::resize(img, width, height, FilterType::Triangle);
        imageops::grayscale(&resized)
    }
}

/// Summed-area tables of `a`, `b`, `a²`, `b²` and `a·b`, with a zero guard
/// row and column.
struct Integrals {
    stride: usize,
    sa: Vec<u64>,
    sb: Vec<u64>,
    saa: Vec<u64>,
    sbb: Vec<u64>,
    sab: Vec<u64>,
}

impl Integrals {
    fn build(a: &GrayImage, b: &GrayImage) -> Self {
        let (w, h) = (a.width() as usize, a.height() as usize);
        let stride = w + 1;
        let n = stride * (h + 1);
        let mut t = Self {
            stride,
            sa: vec![0; n],
            sb: vec![0; n],
            saa: vec![0; n],
            sbb: vec![0; n],
            sab: vec![0; n],
        };
        let (ra, rb) = (a.as_raw(), b.as_raw());
        for y in 0..h {
            let (mut ca, mut cb, mut caa, mut cbb, mut cab) = (0u64, 0u64, 0u64, 0u64, 0u64);
            for x in 0..w {
                let va = ra[y * w + x] as u64;
                let vb = rb[y * w + x] as u64;
                ca += va;
                cb += vb;
                caa += va * va;
                cbb += vb * vb;
                cab += va * vb;
                let i = (y + 1) * stride + x + 1;
                let up = y * stride + x + 1;
                t.sa[i] = t.sa[up] + ca;
                t.sb[i] = t.sb[up] + cb;
                t.saa[i] = t.saa[up] + caa;
                t.sbb[i] = t.sbb[up] + cbb;
                t.sab[i] = t.sab[up] + cab;
            }
        }
        t
    }

    #[inline]
    fn window_sum(&self, table: &[u64], x0: usize, y0: usize, side: usize) -> u64 {
        let (x1, y1) = (x0 + side, y0 + side);
        let s = self.stride;
        table[y1 * s + x1] + table[y0 * s + x0] - table[y0 * s + x1] - table[y1 * s + x0]
    }
}

fn mean_ssim(a: &GrayImage, b: &GrayImage, params: &ComparatorParams) -> f64 {
    let side = params.window as usize;
    let (w, h) = (a.width() as usize, a.height() as usize);
    let n = (side * side) as f64;
    let cov_norm = n / (n - 1.0);
    let c1 = (params.k1 * 255.0).powi(2);
    let c2 = (params.k2 * 255.0).powi(2);

    let t = Integrals::build(a, b);
    let mut total = 0.0;
    let mut count = 0usize;
    for y0 in 0..=h - side {
        for x0 in 0..=w - side {
            let mu_a = t.window_sum(&t.sa, x0, y0, side) as f64 / n;
            let mu_b = t.window_sum(&t.sb, x0, y0, side) as f64 / n;
            let e_aa = t.window_sum(&t.saa, x0, y0, side) as f64 / n;
            let e_bb = t.window_sum(&t.sbb, x0, y0, side) as f64 / n;
            let e_ab = t.window_sum(&t.sab, x0, y0, side) as f64 / n;

            let var_a = cov_norm * (e_aa - mu_a * mu_a);
            let var_b = cov_norm * (e_bb - mu_b * mu_b);
            let cov = cov_norm * (e_ab - mu_a * mu_b);

            let num = (2.0 * mu_a * mu_b + c1) * (2.0 * cov + c2);
            let den = (mu_a * mu_a + mu_b * mu_b + c1) * (var_a + var_b + c2);
            total += num / den;
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    total / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;

    fn gradient(w: u32, h: u32) -> RasterImage {
        RasterImage::from_fn(w, h, |x, y| {
            let v = ((x * 5 + y * 3) % 256) as u8;
            Rgb([v, v / 2, 255 - v])
        })
    }

    #[test]
    fn identical_images_score_one() {
        let img = gradient(64, 48);
        let res = ImageComparator::default().compare(&img, &img).expect("compare");
        assert_relative_eq!(res.raw_ssim, 1.0, epsilon = 1e-12);
        assert_relative_eq!(res.similarity, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn comparison_is_symmetric() {
        let a = gradient(50, 40);
        let b = RasterImage::from_fn(50, 40, |x, y| Rgb([(x * y % 200) as u8, 30, 90]));
        let cmp = ImageComparator::default();
        let ab = cmp.compare(&a, &b).expect("ab");
        let ba = cmp.compare(&b, &a).expect("ba");
        assert_eq!(ab.raw_ssim, ba.raw_ssim);
        assert!((0.0..=1.0).contains(&ab.similarity));
    }

    #[test]
    fn inverted_image_scores_below_identical() {
        let a = gradient(40, 40);
        let b = RasterImage::from_fn(40, 40, |x, y| {
            let p = a.get_pixel(x, y).0;
            Rgb([255 - p[0], 255 - p[1], 255 - p[2]])
        });
        let res = ImageComparator::default().compare(&a, &b).expect("compare");
        assert!(res.similarity < 0.5, "similarity {}", res.similarity);
    }

    #[test]
    fn different_sizes_are_compared_at_the_common_minimum() {
        let a = gradient(80, 30);
        let b = gradient(40, 60);
        let res = ImageComparator::default().compare(&a, &b).expect("compare");
        assert_eq!((res.width, res.height), (40, 30));
    }

    #[test]
    fn tiny_images_are_rejected() {
        let a = gradient(6, 40);
        let b = gradient(40, 40);
        assert!(matches!(
            ImageComparator::default().compare(&a, &b),
            Err(CompareError::ImageTooSmall { width: 6, .. })
        ));
    }
}
