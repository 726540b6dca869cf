//! Core types and utilities for rooftop solar installation verification.
//!
//! This crate is intentionally small. It holds the data model shared by the
//! detector and the verification facade (images, masks, HSV pixels, panel
//! regions) and does *not* contain any detection logic.

mod color;
mod logger;
mod raster;
mod region;

pub use color::{rgb_to_hsv8, Hsv8, HsvRange};
pub use raster::{BinaryMask, MaskError, RasterImage};
pub use region::{polygon_area, BoundaryKind, BoundingBox, PanelRegion};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
