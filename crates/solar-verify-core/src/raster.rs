use image::{GrayImage, Luma};

/// 8-bit RGB raster, row-major. Every pipeline stage either borrows one or
/// produces a fresh one.
pub type RasterImage = image::RgbImage;

/// Errors raised when combining or building masks.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MaskError {
    #[error("mask dimensions differ ({left_w}x{left_h} vs {right_w}x{right_h})")]
    DimensionMismatch {
        left_w: u32,
        left_h: u32,
        right_w: u32,
        right_h: u32,
    },
}

/// Per-pixel panel-candidate flags for one image.
///
/// Cells are stored as `0` (background) or `255` (set) so the buffer can be
/// handed directly to grayscale morphology and contour tracing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    cells: GrayImage,
}

impl BinaryMask {
    /// All-clear mask of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            cells: GrayImage::new(width, height),
        }
    }

    /// Build a mask by evaluating `pred` on every pixel of `image`.
    pub fn from_fn<P, F>(image: &image::ImageBuffer<P, Vec<u8>>, mut pred: F) -> Self
    where
        P: image::Pixel<Subpixel = u8>,
        F: FnMut(&P) -> bool,
    {
        let (width, height) = image.dimensions();
        let mut cells = GrayImage::new(width, height);
        for (dst, src) in cells.pixels_mut().zip(image.pixels()) {
            if pred(src) {
                *dst = Luma([255]);
            }
        }
        Self { cells }
    }

    /// Wrap a grayscale buffer; any nonzero value counts as set.
    pub fn from_gray(gray: GrayImage) -> Self {
        let mut cells = gray;
        for p in cells.pixels_mut() {
            if p.0[0] != 0 {
                p.0[0] = 255;
            }
        }
        Self { cells }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.cells.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.cells.height()
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.cells.dimensions()
    }

    /// Total number of cells (`width * height`).
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.as_raw().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the cell at `(x, y)` is set. Out-of-bounds reads are clear.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height() && self.cells.get_pixel(x, y).0[0] != 0
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width() && y < self.height() {
            self.cells.put_pixel(x, y, Luma([if value { 255 } else { 0 }]));
        }
    }

    pub fn count_nonzero(&self) -> usize {
        self.cells.as_raw().iter().filter(|&&v| v != 0).count()
    }

    /// Cells set in `self` and clear in `other`.
    pub fn and_not(&self, other: &BinaryMask) -> Result<BinaryMask, MaskError> {
        self.zip_with(other, |a, b| a && !b)
    }

    fn zip_with(
        &self,
        other: &BinaryMask,
        op: impl Fn(bool, bool) -> bool,
    ) -> Result<BinaryMask, MaskError> {
        if self.dimensions() != other.dimensions() {
            return Err(MaskError::DimensionMismatch {
                left_w: self.width(),
                left_h: self.height(),
                right_w: other.width(),
                right_h: other.height(),
            });
        }
        let mut cells = GrayImage::new(self.width(), self.height());
        for ((dst, a), b) in cells
            .pixels_mut()
            .zip(self.cells.pixels())
            .zip(other.cells.pixels())
        {
            if op(a.0[0] != 0, b.0[0] != 0) {
                *dst = Luma([255]);
            }
        }
        Ok(BinaryMask { cells })
    }

    /// Borrow the 0/255 grayscale representation.
    #[inline]
    pub fn as_gray(&self) -> &GrayImage {
        &self.cells
    }
}
