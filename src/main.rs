use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use webp_compressor_rust::{compress_folder_with, CompressConfig, WebpEncoder};

/// Compress a folder of images to WebP under a size budget
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Folder with PNG, JPEG or WebP images
    input_dir: PathBuf,

    /// Folder for the .webp outputs (created if missing)
    output_dir: PathBuf,

    /// Quality of the first attempt (1-100)
    #[arg(long, default_value_t = 95, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Size budget per image, in KB
    #[arg(long, default_value_t = 100.0)]
    max_size_kb: f64,

    /// Images compressed in parallel
    #[arg(long, default_value_t = 4)]
    max_workers: usize,

    /// Log search steps
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = CompressConfig {
        quality: args.quality,
        max_size_kb: args.max_size_kb,
        max_workers: args.max_workers,
    };

    let start = Instant::now();
    let failed = AtomicUsize::new(0);
    let done = AtomicUsize::new(0);

    let result = compress_folder_with(
        &args.input_dir,
        &args.output_dir,
        &config,
        &WebpEncoder,
        |report| {
            done.fetch_add(1, Ordering::Relaxed);
            if report.outcome.is_ok() {
                println!("{}", report);
            } else {
                failed.fetch_add(1, Ordering::Relaxed);
                eprintln!("{}", report);
            }
        },
    );

    println!(
        "Processed {} images ({} failed) in {:.2?}",
        done.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed()
    );

    result
        .map(|_| ())
        .with_context(|| format!("Failed to compress {}", args.input_dir.display()))
}
