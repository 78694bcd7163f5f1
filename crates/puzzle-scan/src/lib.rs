//! High-level facade for the `puzzle-scan` workspace.
//!
//! Runs the full frame pipeline (local-adaptive binarization, largest
//! connected-region search, corner refinement, perspective rectification)
//! and returns freshly owned per-frame results. Frame acquisition and
//! everything downstream of the rectified image stay with the caller.
//!
//! ## Quickstart
//!
//! ```
//! use puzzle_scan::{extract_puzzle, PuzzleScanParams};
//! use puzzle_scan::core::GrayImageView;
//!
//! let pixels = vec![200u8; 64 * 64];
//! let frame = GrayImageView {
//!     width: 64,
//!     height: 64,
//!     data: &pixels,
//! };
//!
//! // A featureless frame has no puzzle; the error is recoverable and the
//! // frame is simply skipped.
//! let result = extract_puzzle(&frame, &PuzzleScanParams::default());
//! println!("found puzzle: {}", result.is_ok());
//! ```
//!
//! ## API map
//! - `puzzle_scan::core`: buffers, matrix algebra, binarization, region
//!   search and warping.
//! - `puzzle_scan::extract_puzzle`: end-to-end pipeline from a grayscale
//!   view or raw `u8` buffer.
//! - feature `image`: adapters from `image::GrayImage`.

pub use puzzle_scan_core as core;

pub use puzzle_scan_core::{BinarizeParams, BlurKind, RegionCorners};

mod extract;

pub use extract::{
    extract_puzzle, extract_puzzle_from_gray_u8, gray_view_from_slice, ExtractError,
    PuzzleExtraction, PuzzleScanParams,
};

#[cfg(feature = "image")]
pub use extract::{extract_puzzle_from_image, gray_view};
