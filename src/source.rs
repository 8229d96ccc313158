//! Decoded source images and the resizes the search applies to them.
//!
//! A [`SourceImage`] is never modified in place: shrinking or scaling
//! produces a new value and leaves the original untouched.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageError, ImageReader, RgbImage};

use crate::error::{CompressError, Result};

/// Resampling filter used for every resize.
const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// RGB pixel buffer plus its dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pixels: RgbImage,
}

impl SourceImage {
    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    /// Decode the file at `path` to 8-bit RGB. Alpha is dropped.
    ///
    /// The format is sniffed from the content, so a misnamed file still decodes.
    pub fn open(path: &Path) -> Result<Self> {
        let decode_err = |source: ImageError| CompressError::Decode {
            path: path.to_path_buf(),
            source,
        };

        let img = ImageReader::open(path)
            .map_err(|e| decode_err(ImageError::IoError(e)))?
            .with_guessed_format()
            .map_err(|e| decode_err(ImageError::IoError(e)))?
            .decode()
            .map_err(decode_err)?;

        Ok(Self::from_rgb(img.to_rgb8()))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.pixels
    }

    /// Shrink so the longer side is at most `max_edge`, keeping aspect ratio.
    /// Images that already fit are returned as is.
    pub fn shrink_to_fit(self, max_edge: u32) -> Self {
        let (width, height) = self.dimensions();
        if width <= max_edge && height <= max_edge {
            return self;
        }
        let (new_width, new_height) = fit_dimensions(width, height, max_edge);
        self.resized(new_width, new_height)
    }

    /// Scale both sides by `tenths / 10`, rounding each side down on its own.
    ///
    /// Independent rounding can shift the aspect ratio by a pixel.
    pub fn scaled_by_tenths(&self, tenths: u32) -> Self {
        let (width, height) = scaled_dimensions(self.width(), self.height(), tenths);
        self.resized(width, height)
    }

    fn resized(&self, width: u32, height: u32) -> Self {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        Self::from_rgb(imageops::resize(&self.pixels, width, height, RESIZE_FILTER))
    }
}

/// Dimensions whose longer side equals `max_edge`, preserving aspect ratio.
pub(crate) fn fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let ratio = width as f64 / height as f64;

    if width >= height {
        let new_height = (max_edge as f64 / ratio).round() as u32;
        (max_edge, new_height.clamp(1, height))
    } else {
        let new_width = (max_edge as f64 * ratio).round() as u32;
        (new_width.clamp(1, width), max_edge)
    }
}

/// `floor(side * tenths / 10)` per side, never below one pixel.
pub(crate) fn scaled_dimensions(width: u32, height: u32, tenths: u32) -> (u32, u32) {
    let scale = |side: u32| ((side as u64 * tenths as u64) / 10).max(1) as u32;
    (scale(width), scale(height))
}
