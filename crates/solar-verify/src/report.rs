//! Annotated report image: the original photo with detected regions drawn
//! on it, next to a side panel with the verification summary.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use image::{ImageFormat, Rgb};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use solar_verify_core::{PanelRegion, RasterImage};
use solar_verify_detect::Verdict;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::font;

pub const SIDE_PANEL_WIDTH: u32 = 300;

const PANEL_BACKGROUND: Rgb<u8> = Rgb([50, 50, 50]);
const BOUNDARY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BBOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const TITLE_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const APPROVED_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const REJECTED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

const TEXT_SCALE: u32 = 2;
const TEXT_LEFT: u32 = 10;
const TEXT_TOP: u32 = 16;
const LINE_HEIGHT: u32 = 30;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to encode report image {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Numbers shown in the side panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReportSummary {
    pub verdict: Verdict,
    /// Percent, shown with two decimals.
    pub coverage: f64,
    /// Fraction in `[0, 1]`, shown as a percentage with one decimal.
    pub confidence: f64,
    pub panel_count: usize,
}

impl ReportSummary {
    fn lines(&self) -> [(String, Rgb<u8>); 5] {
        let status_color = if self.verdict.is_approved() {
            APPROVED_COLOR
        } else {
            REJECTED_COLOR
        };
        [
            ("VERIFICATION REPORT".to_string(), TITLE_COLOR),
            (format!("Status: {}", self.verdict), status_color),
            (format!("Coverage: {:.2}%", self.coverage), TEXT_COLOR),
            (format!("Confidence: {:.1}%", self.confidence * 100.0), TEXT_COLOR),
            (format!("Panels: {}", self.panel_count), TEXT_COLOR),
        ]
    }
}

/// Draws and persists report images into one results directory.
#[derive(Clone, Debug)]
pub struct ReportRenderer {
    results_dir: PathBuf,
}

impl ReportRenderer {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    /// Composite of `original` (annotated) and the summary side panel.
    ///
    /// `regions` must be in `original` coordinates.
    pub fn compose(
        &self,
        original: &RasterImage,
        regions: &[PanelRegion],
        summary: &ReportSummary,
    ) -> RasterImage {
        let mut annotated = original.clone();
        for region in regions {
            draw_boundary(&mut annotated, &region.polygon);
        }
        for region in regions {
            draw_bbox(&mut annotated, region);
        }

        let (w, h) = annotated.dimensions();
        let mut out = RasterImage::from_fn(w + SIDE_PANEL_WIDTH, h, |x, y| {
            if x < w {
                *annotated.get_pixel(x, y)
            } else {
                PANEL_BACKGROUND
            }
        });

        for (i, (text, color)) in summary.lines().iter().enumerate() {
            font::draw_text(
                &mut out,
                w + TEXT_LEFT,
                TEXT_TOP + i as u32 * LINE_HEIGHT,
                TEXT_SCALE,
                text,
                *color,
            );
        }
        out
    }

    /// Artifact path for a report produced at `at`.
    pub fn artifact_path(&self, at: &DateTime<Local>) -> PathBuf {
        self.results_dir
            .join(format!("verification_{}.png", at.format("%Y%m%d_%H%M%S_%3f")))
    }

    /// Compose and write the report as PNG, returning its path. A failed
    /// write leaves no file behind.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, original, regions, summary), fields(regions = regions.len()))
    )]
    pub fn render_to_file(
        &self,
        original: &RasterImage,
        regions: &[PanelRegion],
        summary: &ReportSummary,
        at: &DateTime<Local>,
    ) -> Result<PathBuf, RenderError> {
        fs::create_dir_all(&self.results_dir)?;
        let composite = self.compose(original, regions, summary);
        let path = self.artifact_path(at);
        if let Err(source) = composite.save_with_format(&path, ImageFormat::Png) {
            if path.exists() {
                let _ = fs::remove_file(&path);
            }
            return Err(RenderError::Encode { path, source });
        }
        log::debug!("report image written to {}", path.display());
        Ok(path)
    }
}

/// 2 px closed polyline through the boundary pixels.
fn draw_boundary(img: &mut RasterImage, polygon: &[[i32; 2]]) {
    if polygon.len() < 2 {
        return;
    }
    for (i, &[x0, y0]) in polygon.iter().enumerate() {
        let [x1, y1] = polygon[(i + 1) % polygon.len()];
        for (ox, oy) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
            draw_line_segment_mut(
                img,
                (x0 as f32 + ox, y0 as f32 + oy),
                (x1 as f32 + ox, y1 as f32 + oy),
                BOUNDARY_COLOR,
            );
        }
    }
}

/// 2 px rectangle: the box outline and the outline one pixel inside it.
fn draw_bbox(img: &mut RasterImage, region: &PanelRegion) {
    let b = region.bbox;
    draw_hollow_rect_mut(img, Rect::at(b.x, b.y).of_size(b.width, b.height), BBOX_COLOR);
    if b.width > 2 && b.height > 2 {
        draw_hollow_rect_mut(
            img,
            Rect::at(b.x + 1, b.y + 1).of_size(b.width - 2, b.height - 2),
            BBOX_COLOR,
        );
    }
}
