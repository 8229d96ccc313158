//! Error types for the compressor.
//!
//! Every per-file failure carries the path it concerns so a batch can report
//! which input broke after all other files have finished.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by an [`ImageEncoder`](crate::encoder::ImageEncoder).
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The codec rejected the input
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Main error type for compression requests.
#[derive(Debug, Error)]
pub enum CompressError {
    /// Source file unreadable or not a valid image
    #[error("Failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Codec rejected the image or its parameters
    #[error("Failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: EncodeError,
    },

    /// Output directory or destination file could not be written
    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CompressError {
    /// The file this error refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Decode { path, .. }
            | Self::Encode { path, .. }
            | Self::Filesystem { path, .. } => Some(path.as_path()),
            Self::InvalidConfig(_) => None,
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompressError>;
