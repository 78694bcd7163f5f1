use std::{env, fs, path::PathBuf};

use image::ImageReader;
use log::LevelFilter;
use puzzle_scan::core::init_with_level;
use puzzle_scan::{extract_puzzle_from_image, PuzzleScanParams};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct CornerReport {
    image_path: String,
    top_left: [usize; 2],
    top_right: [usize; 2],
    bottom_left: [usize; 2],
    bottom_right: [usize; 2],
    rectified_size: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_with_level(LevelFilter::Debug)?;

    let image_path = parse_image_path();
    let img = ImageReader::open(&image_path)?.decode()?.to_luma8();

    let params = load_params()?;
    let result = extract_puzzle_from_image(&img, &params)?;

    let rectified = image::GrayImage::from_raw(
        result.rectified.width as u32,
        result.rectified.height as u32,
        result.rectified.data.clone(),
    )
    .ok_or("rectified buffer has inconsistent dimensions")?;
    rectified.save("rectified.png")?;

    let report = CornerReport {
        image_path: image_path.to_string_lossy().into_owned(),
        top_left: [result.corners.top_left.x, result.corners.top_left.y],
        top_right: [result.corners.top_right.x, result.corners.top_right.y],
        bottom_left: [result.corners.bottom_left.x, result.corners.bottom_left.y],
        bottom_right: [result.corners.bottom_right.x, result.corners.bottom_right.y],
        rectified_size: params.rectified_size,
    };
    fs::write("corners.json", serde_json::to_string_pretty(&report)?)?;
    println!("wrote rectified.png and corners.json");

    Ok(())
}

fn parse_image_path() -> PathBuf {
    env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("testdata/frame.png"))
}

/// Optional second argument: a JSON params file. Defaults otherwise.
fn load_params() -> Result<PuzzleScanParams, Box<dyn std::error::Error>> {
    match env::args().nth(2) {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(PuzzleScanParams::default()),
    }
}
