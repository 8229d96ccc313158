use std::path::{Path, PathBuf};

use crate::error::{CompressError, Result};

pub const DEFAULT_QUALITY: u8 = 95;
pub const DEFAULT_MAX_SIZE_KB: f64 = 100.0;
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Batch-wide settings passed explicitly into the entry points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressConfig {
    /// Quality of the first encode attempt (1-100)
    pub quality: u8,
    /// Size budget per output file, in KiB
    pub max_size_kb: f64,
    /// Number of images compressed concurrently
    pub max_workers: usize,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_size_kb: DEFAULT_MAX_SIZE_KB,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl CompressConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(CompressError::InvalidConfig(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        if !self.max_size_kb.is_finite() || self.max_size_kb <= 0.0 {
            return Err(CompressError::InvalidConfig(format!(
                "max size must be a positive number of KB, got {}",
                self.max_size_kb
            )));
        }
        if self.max_workers == 0 {
            return Err(CompressError::InvalidConfig(
                "at least one worker is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the request for one file using this config's quality and budget.
    pub fn request(&self, source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> CompressionRequest {
        CompressionRequest {
            source: source.into(),
            dest: dest.into(),
            initial_quality: self.quality,
            max_size_kb: self.max_size_kb,
        }
    }
}

/// One file to compress. Requests share nothing with each other.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionRequest {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub initial_quality: u8,
    pub max_size_kb: f64,
}

impl CompressionRequest {
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        CompressConfig::default().request(source, dest)
    }

    pub fn file_name(&self) -> String {
        display_name(&self.source)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
