//! End-to-end pipeline: binarize, locate the region, refine corners,
//! rectify.

use serde::{Deserialize, Serialize};

use puzzle_scan_core::{
    binarize, puzzle_corners, warp_to_square, BinarizeError, BinarizeParams, BinaryMask,
    GrayImage, GrayImageView, Homography, RegionCorners, RegionError, WarpError,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the pipeline facade.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("invalid grayscale image buffer length (expected {expected} bytes, got {got})")]
    InvalidGrayBuffer { expected: usize, got: usize },

    #[error("invalid grayscale image dimensions (width={width}, height={height})")]
    InvalidGrayDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Binarize(#[from] BinarizeError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Warp(#[from] WarpError),
}

fn default_rectified_size() -> usize {
    900
}

/// Pipeline configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PuzzleScanParams {
    /// Local-contrast binarization settings.
    #[serde(default)]
    pub binarize: BinarizeParams,
    /// Side length of the rectified square output, in pixels.
    #[serde(default = "default_rectified_size")]
    pub rectified_size: usize,
}

impl Default for PuzzleScanParams {
    fn default() -> Self {
        Self {
            binarize: BinarizeParams::default(),
            rectified_size: default_rectified_size(),
        }
    }
}

/// One analyzed frame: mask, refined corners and the rectified view.
///
/// Everything is owned by the caller; nothing is shared between frames.
#[derive(Clone, Debug)]
pub struct PuzzleExtraction {
    pub mask: BinaryMask,
    pub corners: RegionCorners,
    pub rectified: GrayImage,
}

/// Run the full pipeline on one grayscale frame.
///
/// Any stage failure is recoverable: report it, skip the frame and feed the
/// next one.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(gray, params), fields(width = gray.width, height = gray.height))
)]
pub fn extract_puzzle(
    gray: &GrayImageView<'_>,
    params: &PuzzleScanParams,
) -> Result<PuzzleExtraction, ExtractError> {
    let mask = binarize(gray, &params.binarize)?;
    let corners = puzzle_corners(&mask)?;
    log::debug!(
        "puzzle corners: tl=({},{}) tr=({},{}) bl=({},{}) br=({},{})",
        corners.top_left.x,
        corners.top_left.y,
        corners.top_right.x,
        corners.top_right.y,
        corners.bottom_left.x,
        corners.bottom_left.y,
        corners.bottom_right.x,
        corners.bottom_right.y
    );
    let homography = Homography::from_corners(&corners, params.rectified_size)?;
    let rectified = warp_to_square(&mask.as_view(), &homography, params.rectified_size)?;
    Ok(PuzzleExtraction {
        mask,
        corners,
        rectified,
    })
}

/// Validate a raw grayscale buffer and wrap it as a view.
pub fn gray_view_from_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<GrayImageView<'_>, ExtractError> {
    let w = usize::try_from(width).ok();
    let h = usize::try_from(height).ok();
    let Some((w, h)) = w.zip(h) else {
        return Err(ExtractError::InvalidGrayDimensions { width, height });
    };
    let Some(expected) = w.checked_mul(h) else {
        return Err(ExtractError::InvalidGrayDimensions { width, height });
    };
    if pixels.len() != expected {
        return Err(ExtractError::InvalidGrayBuffer {
            expected,
            got: pixels.len(),
        });
    }
    Ok(GrayImageView {
        width: w,
        height: h,
        data: pixels,
    })
}

/// Run the pipeline on a raw grayscale `u8` buffer.
pub fn extract_puzzle_from_gray_u8(
    width: u32,
    height: u32,
    pixels: &[u8],
    params: &PuzzleScanParams,
) -> Result<PuzzleExtraction, ExtractError> {
    let view = gray_view_from_slice(width, height, pixels)?;
    extract_puzzle(&view, params)
}

/// Convert an `image::GrayImage` into the lightweight core view type.
#[cfg(feature = "image")]
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Run the pipeline on a decoded `image::GrayImage`.
#[cfg(feature = "image")]
pub fn extract_puzzle_from_image(
    img: &::image::GrayImage,
    params: &PuzzleScanParams,
) -> Result<PuzzleExtraction, ExtractError> {
    extract_puzzle(&gray_view(img), params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_length_is_validated() {
        let pixels = vec![0u8; 99];
        let err = gray_view_from_slice(10, 10, &pixels).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::InvalidGrayBuffer {
                expected: 100,
                got: 99
            }
        ));
    }

    #[test]
    fn featureless_frame_is_a_region_error() {
        let pixels = vec![128u8; 32 * 32];
        let err = extract_puzzle_from_gray_u8(32, 32, &pixels, &PuzzleScanParams::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Region(RegionError::NoRegionFound)
        ));
    }
}
