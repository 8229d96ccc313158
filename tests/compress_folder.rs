use std::fs;
use std::path::Path;
use std::sync::Mutex;

use image::{Rgb, RgbImage};
use tempfile::tempdir;
use webp_compressor_rust::{
    compress_folder, compress_folder_with, compress_image, CompressConfig, CompressError,
    CompressionRequest, WebpEncoder,
};

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 255) / width.max(1)) as u8,
            ((y * 255) / height.max(1)) as u8,
            128,
        ])
    })
}

fn write_png(path: &Path, image: &RgbImage) {
    image.save(path).unwrap();
}

#[test]
fn test_small_image_keeps_initial_quality() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("small.png");
    let dest = dir.path().join("small.webp");
    write_png(&source, &RgbImage::from_pixel(500, 400, Rgb([40, 90, 160])));

    let result = compress_image(&CompressionRequest::new(&source, &dest), &WebpEncoder).unwrap();

    assert_eq!(result.final_quality, 95);
    assert_eq!((result.final_width, result.final_height), (500, 400));
    assert!(result.final_size_kb <= 100.0);

    let written = fs::metadata(&dest).unwrap().len() as f64 / 1024.0;
    assert!((written - result.final_size_kb).abs() < 1e-9);

    let decoded = image::open(&dest).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (500, 400));
}

#[test]
fn test_oversized_image_is_shrunk_to_max_edge() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("wide.png");
    let dest = dir.path().join("wide.webp");
    write_png(&source, &RgbImage::from_pixel(2600, 1300, Rgb([200, 200, 200])));

    let result = compress_image(&CompressionRequest::new(&source, &dest), &WebpEncoder).unwrap();

    assert_eq!((result.final_width, result.final_height), (2048, 1024));
}

#[test]
fn test_corrupt_input_is_decode_error_without_output() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("broken.jpg");
    let dest = dir.path().join("broken.webp");
    fs::write(&source, b"definitely not a jpeg").unwrap();

    let err = compress_image(&CompressionRequest::new(&source, &dest), &WebpEncoder).unwrap_err();

    assert!(matches!(err, CompressError::Decode { .. }));
    assert_eq!(err.path(), Some(source.as_path()));
    assert!(!dest.exists());
}

#[test]
fn test_unwritable_destination_is_filesystem_error() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("ok.png");
    let dest = dir.path().join("missing").join("ok.webp");
    write_png(&source, &gradient(32, 32));

    let err = compress_image(&CompressionRequest::new(&source, &dest), &WebpEncoder).unwrap_err();

    assert!(matches!(err, CompressError::Filesystem { .. }));
}

#[test]
fn test_batch_with_one_corrupt_file_fails_late() {
    let input = tempdir().unwrap();
    let output = input.path().join("out");
    for i in 0..9 {
        write_png(&input.path().join(format!("img{}.png", i)), &gradient(64 + i, 48));
    }
    fs::write(input.path().join("img_corrupt.JPG"), b"\xff\xd8garbage").unwrap();
    fs::write(input.path().join("readme.txt"), b"ignored").unwrap();

    let seen = Mutex::new(Vec::new());
    let err = compress_folder_with(
        input.path(),
        &output,
        &CompressConfig::default(),
        &WebpEncoder,
        |report| seen.lock().unwrap().push(report.request.file_name()),
    )
    .unwrap_err();

    assert!(matches!(err, CompressError::Decode { .. }));
    assert!(err.path().unwrap().ends_with("img_corrupt.JPG"));
    assert_eq!(seen.lock().unwrap().len(), 10);

    for i in 0..9 {
        assert!(output.join(format!("img{}.webp", i)).is_file());
    }
    assert!(!output.join("img_corrupt.webp").exists());
    assert!(!output.join("readme.webp").exists());
}

#[test]
fn test_batch_success_with_existing_output_dir() {
    let input = tempdir().unwrap();
    let output = input.path().join("out");
    fs::create_dir(&output).unwrap();
    write_png(&input.path().join("a.png"), &gradient(120, 80));
    gradient(90, 60).save(input.path().join("b.jpeg")).unwrap();

    let config = CompressConfig {
        max_workers: 2,
        ..CompressConfig::default()
    };
    let results = compress_folder(input.path(), &output, &config).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!((results[0].final_width, results[0].final_height), (120, 80));
    assert_eq!((results[1].final_width, results[1].final_height), (90, 60));
    assert!(output.join("a.webp").is_file());
    assert!(output.join("b.webp").is_file());
}
