//! Batch image compression to a per-file size budget.
//!
//! Each image is decoded to RGB and re-encoded as lossy WebP. The encoder
//! quality is bisected, and the image downscaled if needed, until the output
//! fits `max_size_kb` or the search runs out of steps.

pub mod batch;
pub mod config;
pub mod encoder;
pub mod error;
pub mod search;
pub mod source;

pub use batch::{compress_folder, compress_folder_with, FileReport};
pub use config::{CompressConfig, CompressionRequest};
pub use encoder::{EncodedImage, ImageEncoder, WebpEncoder};
pub use error::{CompressError, EncodeError};
pub use search::{compress_image, search, CompressionResult, SearchOutcome};
pub use source::SourceImage;
