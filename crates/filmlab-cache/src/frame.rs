//! Frame buffers: dense 3-channel floating-point rasters.

use crate::types::{CacheError, Dimensions};

/// Re-export the underlying raster type so downstream crates can pass
/// pixel data to stage functions without depending on `image` directly.
pub use image::Rgb32FImage;

/// A dense 3-channel `f32` raster with explicit dimensions.
///
/// Channel values are nominally in `[0, 1]` but are not clamped here —
/// clamping is a stage concern, and intermediate results (e.g. scene
/// exposure before tone mapping) legitimately exceed the nominal range.
///
/// A `Frame` is owned by the [`CacheEntry`](crate::CacheEntry) that
/// holds it; consumers receive `&Frame` and must produce a *new* frame
/// for any edit rather than mutating in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: Rgb32FImage,
}

impl Frame {
    /// Number of channels per pixel.
    pub const CHANNELS: usize = 3;

    /// Construct a frame from interleaved RGB pixel data.
    ///
    /// `data` must contain exactly `width * height * 3` values in
    /// row-major, channel-interleaved order.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidBuffer`] if either dimension is
    /// zero or if `data` has the wrong length.
    pub fn from_raw(width: u32, height: u32, data: Vec<f32>) -> Result<Self, CacheError> {
        if width == 0 || height == 0 {
            return Err(CacheError::InvalidBuffer(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        let expected = u64::from(width) * u64::from(height) * Self::CHANNELS as u64;
        if data.len() as u64 != expected {
            return Err(CacheError::InvalidBuffer(format!(
                "pixel data length {} does not match {width}x{height}x3 ({expected})",
                data.len(),
            )));
        }
        // Length was checked above, so from_raw cannot fail here.
        Rgb32FImage::from_raw(width, height, data)
            .map(|pixels| Self { pixels })
            .ok_or_else(|| {
                CacheError::InvalidBuffer(format!(
                    "pixel data does not fit a {width}x{height} raster"
                ))
            })
    }

    /// Construct a frame filled with a single RGB value.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidBuffer`] if either dimension is zero.
    pub fn filled(width: u32, height: u32, rgb: [f32; 3]) -> Result<Self, CacheError> {
        if width == 0 || height == 0 {
            return Err(CacheError::InvalidBuffer(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok(Self {
            pixels: Rgb32FImage::from_pixel(width, height, image::Rgb(rgb)),
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Frame dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.pixels.width(),
            height: self.pixels.height(),
        }
    }

    /// The RGB value at `(x, y)`, or `None` if out of bounds.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x < self.width() && y < self.height() {
            Some(self.pixels.get_pixel(x, y).0)
        } else {
            None
        }
    }

    /// Read-only view of the underlying raster.
    #[must_use]
    pub const fn raster(&self) -> &Rgb32FImage {
        &self.pixels
    }

    /// Read-only view of the interleaved pixel data.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        self.pixels.as_raw()
    }
}
