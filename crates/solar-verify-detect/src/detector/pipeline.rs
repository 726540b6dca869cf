use imageproc::contours::{find_contours, Contour};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use solar_verify_core::{BoundaryKind, BoundingBox, PanelRegion, RasterImage};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::segment::{clean_mask, segment_candidates};
use super::{DetectError, PanelDetection, PanelDetectorParams};

/// Finds panel-shaped regions of panel-coloured pixels.
#[derive(Clone, Debug, Default)]
pub struct PanelDetector {
    params: PanelDetectorParams,
}

impl PanelDetector {
    pub fn new(params: PanelDetectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PanelDetectorParams {
        &self.params
    }

    /// Segment, clean, trace and filter.
    ///
    /// Every traced boundary is considered, holes included, so a hole inside
    /// a panel-coloured blob can itself pass as a region. A region's kind
    /// follows its nesting depth in the boundary hierarchy.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(width = image.width(), height = image.height()))
    )]
    pub fn detect(&self, image: &RasterImage) -> Result<PanelDetection, DetectError> {
        self.params.validate()?;
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(DetectError::EmptyImage {
                width: w,
                height: h,
            });
        }

        let raw = segment_candidates(image, &self.params)?;
        let mask = clean_mask(&raw, &self.params);

        let contours: Vec<Contour<i32>> = find_contours(mask.as_gray());
        let min_area = self.params.min_area_frac * (w as f64 * h as f64);

        let regions: Vec<PanelRegion> = contours
            .iter()
            .enumerate()
            .filter_map(|(i, c)| self.accept(c, boundary_kind(&contours, i), min_area))
            .collect();

        log::debug!(
            "detect: {} candidate px, {} boundaries traced, {} accepted",
            mask.count_nonzero(),
            contours.len(),
            regions.len()
        );

        Ok(PanelDetection {
            regions,
            mask,
            contours_traced: contours.len(),
        })
    }

    fn accept(
        &self,
        contour: &Contour<i32>,
        kind: BoundaryKind,
        min_area: f64,
    ) -> Option<PanelRegion> {
        if contour.points.len() < 3 {
            return None;
        }
        let polygon: Vec<[i32; 2]> = contour.points.iter().map(|p| [p.x, p.y]).collect();

        let area = solar_verify_core::polygon_area(&polygon);
        if area < min_area {
            return None;
        }

        let perimeter = arc_length(&contour.points, true);
        let epsilon = self.params.approx_epsilon_frac * perimeter;
        if !(epsilon > 0.0) {
            return None;
        }
        let approx = approximate_polygon_dp(&contour.points, epsilon, true);
        if approx.len() < self.params.min_vertices {
            return None;
        }

        let aspect = BoundingBox::enclosing(&polygon)?.aspect_ratio()?;
        if !self.params.aspect_ok(aspect) {
            return None;
        }

        PanelRegion::from_boundary(polygon, approx.len(), kind)
    }
}

/// Outer boundaries sit at even depth, holes at odd depth.
///
/// imageproc's own `border_type` reports a blob touching the image origin
/// as a hole, so the parent chain is used instead.
fn boundary_kind(contours: &[Contour<i32>], index: usize) -> BoundaryKind {
    let mut depth = 0usize;
    let mut parent = contours.get(index).and_then(|c| c.parent);
    while let Some(p) = parent {
        depth += 1;
        if depth > contours.len() {
            break;
        }
        parent = contours.get(p).and_then(|c| c.parent);
    }
    if depth % 2 == 0 {
        BoundaryKind::Outer
    } else {
        BoundaryKind::Hole
    }
}
