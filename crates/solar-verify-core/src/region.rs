use serde::{Deserialize, Serialize};

/// Axis-aligned pixel box; `width`/`height` count pixels, so a single pixel
/// has a 1×1 box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Smallest box containing every point, or `None` for an empty slice.
    pub fn enclosing(points: &[[i32; 2]]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y) = (first[0], first[1]);
        let (mut max_x, mut max_y) = (first[0], first[1]);
        for &[x, y] in &points[1..] {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: (max_x - min_x) as u32 + 1,
            height: (max_y - min_y) as u32 + 1,
        })
    }

    /// `width / height`; `None` for a zero-height box.
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.height > 0).then(|| self.width as f64 / self.height as f64)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Whether a traced boundary encloses foreground or a hole inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    Outer,
    Hole,
}

/// A panel-shaped region accepted by the detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PanelRegion {
    /// Ordered boundary pixels in image coordinates.
    pub polygon: Vec<[i32; 2]>,
    pub bbox: BoundingBox,
    /// Area enclosed by `polygon` (pixel centres as vertices).
    pub area: f64,
    /// `bbox.width / bbox.height`.
    pub aspect_ratio: f64,
    /// Vertex count of the simplified polygon used for the shape test.
    pub approx_vertices: usize,
    pub kind: BoundaryKind,
}

impl PanelRegion {
    /// Build a region from a traced boundary. Returns `None` for an empty
    /// boundary.
    pub fn from_boundary(
        polygon: Vec<[i32; 2]>,
        approx_vertices: usize,
        kind: BoundaryKind,
    ) -> Option<Self> {
        let bbox = BoundingBox::enclosing(&polygon)?;
        let aspect_ratio = bbox.aspect_ratio()?;
        Some(Self {
            area: polygon_area(&polygon),
            polygon,
            bbox,
            aspect_ratio,
            approx_vertices,
            kind,
        })
    }

    /// Region geometry mapped by `factor` (e.g. from a downscaled working
    /// image back to the original resolution).
    pub fn scaled(&self, factor: f64) -> PanelRegion {
        if factor == 1.0 {
            return self.clone();
        }
        let s = |v: i32| (v as f64 * factor).round() as i32;
        let polygon: Vec<[i32; 2]> = self.polygon.iter().map(|&[x, y]| [s(x), s(y)]).collect();
        let bbox = BoundingBox {
            x: s(self.bbox.x),
            y: s(self.bbox.y),
            width: ((self.bbox.width as f64 * factor).round() as u32).max(1),
            height: ((self.bbox.height as f64 * factor).round() as u32).max(1),
        };
        PanelRegion {
            polygon,
            bbox,
            area: self.area * factor * factor,
            aspect_ratio: self.aspect_ratio,
            approx_vertices: self.approx_vertices,
            kind: self.kind,
        }
    }
}

/// Unsigned shoelace area of a closed polygon.
pub fn polygon_area(points: &[[i32; 2]]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for (i, &[x0, y0]) in points.iter().enumerate() {
        let [x1, y1] = points[(i + 1) % points.len()];
        twice += x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64;
    }
    twice.unsigned_abs() as f64 * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect_boundary(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<[i32; 2]> {
        let mut pts = Vec::new();
        for x in x0..=x1 {
            pts.push([x, y0]);
        }
        for y in y0 + 1..=y1 {
            pts.push([x1, y]);
        }
        for x in (x0..x1).rev() {
            pts.push([x, y1]);
        }
        for y in (y0 + 1..y1).rev() {
            pts.push([x0, y]);
        }
        pts
    }

    #[test]
    fn rectangle_boundary_geometry() {
        let region = PanelRegion::from_boundary(
            rect_boundary(10, 20, 109, 69),
            4,
            BoundaryKind::Outer,
        )
        .expect("non-empty");
        assert_eq!(
            region.bbox,
            BoundingBox {
                x: 10,
                y: 20,
                width: 100,
                height: 50
            }
        );
        assert_relative_eq!(region.aspect_ratio, 2.0);
        assert_relative_eq!(region.area, 99.0 * 49.0);
    }

    #[test]
    fn degenerate_boundaries() {
        assert!(PanelRegion::from_boundary(Vec::new(), 0, BoundaryKind::Outer).is_none());
        let single = PanelRegion::from_boundary(vec![[3, 4]], 1, BoundaryKind::Outer)
            .expect("single pixel");
        assert_eq!(single.bbox.width, 1);
        assert_eq!(single.area, 0.0);
    }

    #[test]
    fn scaling_maps_geometry_back() {
        let region = PanelRegion::from_boundary(
            rect_boundary(10, 10, 29, 19),
            4,
            BoundaryKind::Outer,
        )
        .expect("non-empty");
        let up = region.scaled(2.0);
        assert_eq!(up.bbox.x, 20);
        assert_eq!(up.bbox.width, 40);
        assert_eq!(up.bbox.height, 20);
        assert_relative_eq!(up.area, region.area * 4.0);
        assert_relative_eq!(up.aspect_ratio, region.aspect_ratio);
        assert_eq!(up.polygon.len(), region.polygon.len());
    }

    #[test]
    fn boundary_kind_serializes_lowercase() {
        let json = serde_json::to_string(&BoundaryKind::Hole).expect("json");
        assert_eq!(json, "\"hole\"");
    }
}
