//! Lossy encoder adapters.
//!
//! The search only needs "pixels + quality in, bytes out", so the codec sits
//! behind [`ImageEncoder`] and can be swapped (tests use a fake one).

use image::RgbImage;

use crate::error::EncodeError;

/// Bytes produced by one encode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    /// Encoded size in KiB.
    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }
}

/// A lossy codec driven by a 1-100 quality knob.
///
/// Output must be deterministic for a given image and quality.
pub trait ImageEncoder: Sync {
    /// Extension of the files this encoder produces, without the dot.
    fn extension(&self) -> &'static str;

    fn encode(&self, image: &RgbImage, quality: u8) -> Result<EncodedImage, EncodeError>;
}

/// Lossy WebP through libwebp.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpEncoder;

impl ImageEncoder for WebpEncoder {
    fn extension(&self) -> &'static str {
        "webp"
    }

    fn encode(&self, image: &RgbImage, quality: u8) -> Result<EncodedImage, EncodeError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(EncodeError::InvalidDimensions { width, height });
        }

        let quality = quality.clamp(1, 100);
        let memory = webp::Encoder::from_rgb(image.as_raw(), width, height)
            .encode_simple(false, quality as f32)
            .map_err(|e| EncodeError::EncodingFailed(format!("{:?}", e)))?;

        Ok(EncodedImage {
            bytes: memory.to_vec(),
        })
    }
}
