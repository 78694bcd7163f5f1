//! Core pixel-buffer pipeline for locating a rectangular puzzle grid in a
//! noisy camera frame and producing a perspective-rectified view of it.
//!
//! The pipeline is purely computational: grayscale buffers in, a binary
//! mask, four corner coordinates and a rectified square buffer out. Frame
//! acquisition, display and anything downstream of the rectified image
//! (digit recognition, persistence) live in external collaborators.
//!
//! Every invocation returns freshly owned buffers, so calls are reentrant;
//! the expected driver invokes the pipeline at most once at a time per
//! physical buffer with a keep-only-latest backpressure policy.

mod binarize;
mod image;
mod logger;
mod matrix;
mod region;
mod warp;

pub use binarize::{
    binarize, box_blur, gaussian_blur, BinarizeError, BinarizeParams, BlurKind, SummedAreaTable,
};
pub use image::{BinaryMask, Coordinate, GrayImage, GrayImageView};
pub use matrix::{DenseMatrix, MatrixError};
pub use region::{
    largest_region, puzzle_corners, refine_corner, ConnectedRegion, RegionCorners, RegionError,
};
pub use warp::{warp_to_square, Homography, WarpError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
