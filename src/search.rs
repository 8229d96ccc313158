//! Size-targeting search.
//!
//! Finds an encoder quality, and if needed smaller dimensions, whose output
//! fits a size budget. Runs in three phases, each entered only when the
//! previous one left the output over budget:
//!
//! 0. Shrink images whose longer side exceeds [`MAX_EDGE`].
//! 1. Bisect quality inside `[QUALITY_FLOOR, QUALITY_CEILING]` until the output
//!    fits or the bracket is at most [`MIN_QUALITY_GAP`] wide.
//! 2. Re-encode at the phase-1 quality with the image scaled by 0.9, 0.8, 0.7
//!    and 0.6 until it fits.
//!
//! If nothing fits, the last attempt is kept. Callers must not assume the
//! budget is always met.

use std::fs;
use std::path::Path;

use log::{debug, info, trace, warn};

use crate::config::CompressionRequest;
use crate::encoder::{EncodedImage, ImageEncoder};
use crate::error::{CompressError, EncodeError, Result};
use crate::source::SourceImage;

/// Longer side limit applied before any encode.
pub const MAX_EDGE: u32 = 2048;
/// Lowest quality the bisection will try.
pub const QUALITY_FLOOR: u8 = 70;
pub const QUALITY_CEILING: u8 = 98;
/// Bisection stops once `upper - lower` is no larger than this.
pub const MIN_QUALITY_GAP: u8 = 2;
/// First downscale factor, in tenths.
pub const FIRST_SCALE_TENTHS: u32 = 9;
/// Downscaling stops before reaching this factor, in tenths.
pub const SCALE_LIMIT_TENTHS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initial,
    Quality,
    Downscale,
}

/// One encoder invocation, with the search state it was made in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attempt {
    pub phase: Phase,
    pub quality: u8,
    pub lower_bound: u8,
    pub upper_bound: u8,
    pub scale_tenths: u32,
    pub width: u32,
    pub height: u32,
    pub size_kb: f64,
}

/// Mutable state of one search. Owned by a single request.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub current_quality: u8,
    pub lower_bound: u8,
    pub upper_bound: u8,
    /// Current downscale factor in tenths; 10 until phase 2 starts.
    pub scale_tenths: u32,
    pub last_size_kb: f64,
    pub last_encoded: EncodedImage,
    pub width: u32,
    pub height: u32,
    pub attempts: Vec<Attempt>,
}

impl SearchState {
    fn new(quality: u8, image: &SourceImage, encoded: EncodedImage) -> Self {
        let mut state = Self {
            current_quality: quality,
            lower_bound: QUALITY_FLOOR,
            upper_bound: QUALITY_CEILING,
            scale_tenths: 10,
            last_size_kb: 0.0,
            last_encoded: EncodedImage { bytes: Vec::new() },
            width: 0,
            height: 0,
            attempts: Vec::new(),
        };
        state.record(Phase::Initial, quality, image, encoded);
        state
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_tenths as f64 / 10.0
    }

    fn over_budget(&self, max_size_kb: f64) -> bool {
        self.last_size_kb > max_size_kb
    }

    fn record(&mut self, phase: Phase, quality: u8, image: &SourceImage, encoded: EncodedImage) {
        let (width, height) = image.dimensions();
        let size_kb = encoded.size_kb();
        trace!(
            "{:?} attempt: q={} bracket=[{}, {}] scale={:.1} {}x{} -> {:.2} KB",
            phase,
            quality,
            self.lower_bound,
            self.upper_bound,
            self.scale_factor(),
            width,
            height,
            size_kb
        );

        self.attempts.push(Attempt {
            phase,
            quality,
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
            scale_tenths: self.scale_tenths,
            width,
            height,
            size_kb,
        });
        self.current_quality = quality;
        self.last_size_kb = size_kb;
        self.last_encoded = encoded;
        self.width = width;
        self.height = height;
    }
}

/// Settings of the output that was kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionResult {
    pub final_size_kb: f64,
    pub final_quality: u8,
    pub final_width: u32,
    pub final_height: u32,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub result: CompressionResult,
    pub bytes: Vec<u8>,
    pub attempts: Vec<Attempt>,
}

impl SearchOutcome {
    pub fn met_budget(&self, max_size_kb: f64) -> bool {
        self.result.final_size_kb <= max_size_kb
    }
}

/// Run all phases on `image` and return the last encoded output.
pub fn search<E>(
    image: SourceImage,
    initial_quality: u8,
    max_size_kb: f64,
    encoder: &E,
) -> std::result::Result<SearchOutcome, EncodeError>
where
    E: ImageEncoder + ?Sized,
{
    let (src_width, src_height) = image.dimensions();
    let image = image.shrink_to_fit(MAX_EDGE);
    if image.dimensions() != (src_width, src_height) {
        debug!(
            "Pre-shrunk {}x{} to {}x{}",
            src_width,
            src_height,
            image.width(),
            image.height()
        );
    }

    let encoded = encoder.encode(image.as_rgb(), initial_quality)?;
    let mut state = SearchState::new(initial_quality, &image, encoded);

    while state.over_budget(max_size_kb)
        && state.upper_bound - state.lower_bound > MIN_QUALITY_GAP
    {
        let quality = midpoint(state.lower_bound, state.upper_bound);
        let encoded = encoder.encode(image.as_rgb(), quality)?;
        state.record(Phase::Quality, quality, &image, encoded);

        if state.over_budget(max_size_kb) {
            state.upper_bound = quality;
        } else {
            state.lower_bound = quality;
        }
    }

    if state.over_budget(max_size_kb) {
        debug!(
            "Still {:.2} KB at q={}, falling back to downscaling",
            state.last_size_kb, state.current_quality
        );
        let quality = state.current_quality;
        state.scale_tenths = FIRST_SCALE_TENTHS;
        while state.over_budget(max_size_kb) && state.scale_tenths > SCALE_LIMIT_TENTHS {
            let scaled = image.scaled_by_tenths(state.scale_tenths);
            let encoded = encoder.encode(scaled.as_rgb(), quality)?;
            state.record(Phase::Downscale, quality, &scaled, encoded);
            state.scale_tenths -= 1;
        }
    }

    Ok(SearchOutcome {
        result: CompressionResult {
            final_size_kb: state.last_size_kb,
            final_quality: state.current_quality,
            final_width: state.width,
            final_height: state.height,
        },
        bytes: state.last_encoded.bytes,
        attempts: state.attempts,
    })
}

fn midpoint(lower: u8, upper: u8) -> u8 {
    ((lower as u16 + upper as u16) / 2) as u8
}

/// Decode, search, and write the final bytes to `request.dest`.
pub fn compress_image<E>(request: &CompressionRequest, encoder: &E) -> Result<CompressionResult>
where
    E: ImageEncoder + ?Sized,
{
    let image = SourceImage::open(&request.source)?;

    let outcome = search(image, request.initial_quality, request.max_size_kb, encoder).map_err(
        |source| CompressError::Encode {
            path: request.source.clone(),
            source,
        },
    )?;

    write_output(&request.dest, &outcome.bytes)?;

    if !outcome.met_budget(request.max_size_kb) {
        warn!(
            "{} is {:.2} KB, over the {:.2} KB budget after {} attempts",
            request.file_name(),
            outcome.result.final_size_kb,
            request.max_size_kb,
            outcome.attempts.len()
        );
    }
    info!(
        "{}: {} encode attempts, kept q={} at {}x{}",
        request.file_name(),
        outcome.attempts.len(),
        outcome.result.final_quality,
        outcome.result.final_width,
        outcome.result.final_height
    );

    Ok(outcome.result)
}

fn write_output(dest: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(dest, bytes).map_err(|e| CompressError::filesystem(dest, e))
}
