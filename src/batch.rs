//! Folder-level driver.
//!
//! Lists the supported images in a folder, compresses them on a fixed-size
//! rayon pool and reports the first failure only after every file has been
//! attempted, so successful outputs stay on disk.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::{display_name, CompressConfig, CompressionRequest};
use crate::encoder::{ImageEncoder, WebpEncoder};
use crate::error::{CompressError, Result};
use crate::search::{compress_image, CompressionResult};

/// Input extensions picked up from the folder, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Status of one finished file.
#[derive(Debug)]
pub struct FileReport {
    pub request: CompressionRequest,
    pub outcome: Result<CompressionResult>,
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(result) => write!(
                f,
                "Compressed {}: {:.2} KB, Quality={}%, Size={}x{}",
                self.request.file_name(),
                result.final_size_kb,
                result.final_quality,
                result.final_width,
                result.final_height
            ),
            Err(e) => write!(f, "Failed {}: {}", self.request.file_name(), e),
        }
    }
}

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// `<output_dir>/<stem>.<extension>`
pub fn output_path(source: &Path, output_dir: &Path, extension: &str) -> PathBuf {
    let mut name = source
        .file_stem()
        .unwrap_or(source.as_os_str())
        .to_os_string();
    name.push(".");
    name.push(extension);
    output_dir.join(name)
}

/// Supported files directly inside `input_dir`, sorted by name.
pub fn list_images(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(input_dir).map_err(|e| CompressError::filesystem(input_dir, e))?;

    let mut images = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CompressError::filesystem(input_dir, e))?.path();
        if !path.is_file() {
            continue;
        }
        if is_supported(&path) {
            images.push(path);
        } else {
            debug!("Skipping {}", display_name(&path));
        }
    }
    images.sort();
    Ok(images)
}

/// Build one request per image and warn about inputs that share an output name.
pub fn plan_requests(
    images: &[PathBuf],
    output_dir: &Path,
    config: &CompressConfig,
    extension: &str,
) -> Vec<CompressionRequest> {
    let requests: Vec<CompressionRequest> = images
        .iter()
        .map(|source| config.request(source, output_path(source, output_dir, extension)))
        .collect();

    let mut seen: HashMap<&Path, &Path> = HashMap::new();
    for request in &requests {
        if let Some(previous) = seen.insert(&request.dest, &request.source) {
            warn!(
                "{} and {} both write {}; the last one to finish wins",
                display_name(previous),
                request.file_name(),
                display_name(&request.dest)
            );
        }
    }
    requests
}

/// Run `requests` on `max_workers` threads, calling `on_done` as each finishes.
///
/// Every request runs to completion even if others fail.
pub fn run_requests<E, F>(
    requests: Vec<CompressionRequest>,
    max_workers: usize,
    encoder: &E,
    on_done: F,
) -> Result<Vec<FileReport>>
where
    E: ImageEncoder + ?Sized,
    F: Fn(&FileReport) + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_workers)
        .thread_name(|i| format!("compress-{}", i))
        .build()
        .map_err(|e| CompressError::InvalidConfig(format!("Failed to start worker pool: {}", e)))?;

    let reports: Vec<FileReport> = pool.install(|| {
        requests
            .into_par_iter()
            .map(|request| {
                let outcome = compress_image(&request, encoder);
                let report = FileReport { request, outcome };
                on_done(&report);
                report
            })
            .collect()
    });
    Ok(reports)
}

/// Compress every supported image in `input_dir` into `output_dir`.
///
/// Returns one result per image when all succeed, otherwise the first
/// error in file-name order once every file has been attempted.
pub fn compress_folder_with<E, F>(
    input_dir: &Path,
    output_dir: &Path,
    config: &CompressConfig,
    encoder: &E,
    on_done: F,
) -> Result<Vec<CompressionResult>>
where
    E: ImageEncoder + ?Sized,
    F: Fn(&FileReport) + Sync,
{
    config.validate()?;
    fs::create_dir_all(output_dir).map_err(|e| CompressError::filesystem(output_dir, e))?;

    let images = list_images(input_dir)?;
    info!(
        "Compressing {} images from {} with {} workers",
        images.len(),
        input_dir.display(),
        config.max_workers
    );

    let requests = plan_requests(&images, output_dir, config, encoder.extension());
    let reports = run_requests(requests, config.max_workers, encoder, on_done)?;

    let total = reports.len();
    let mut results = Vec::with_capacity(total);
    let mut first_error = None;
    for report in reports {
        match report.outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => {
            warn!("{} of {} images failed", total - results.len(), total);
            Err(e)
        }
        None => Ok(results),
    }
}

/// [`compress_folder_with`] using lossy WebP and no progress callback.
pub fn compress_folder(
    input_dir: &Path,
    output_dir: &Path,
    config: &CompressConfig,
) -> Result<Vec<CompressionResult>> {
    compress_folder_with(input_dir, output_dir, config, &WebpEncoder, |_| {})
}
