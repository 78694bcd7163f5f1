//! Homography estimation from four corners and inverse-mapped resampling.
//!
//! The solve maps a fixed destination square back onto the four refined
//! source corners under the normalization `h[2][2] = 1`. With exactly four
//! correspondences the 8x8 system is exactly determined, yet it is solved
//! through the normal equations `h = (A'A)^-1 A' b` for uniformity with the
//! rest of the matrix machinery; this amplifies conditioning error and is a
//! known inefficiency kept on purpose.

use crate::image::{GrayImage, GrayImageView};
use crate::matrix::{DenseMatrix, MatrixError};
use crate::region::RegionCorners;

/// Warp failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WarpError {
    /// An inverse-mapped destination pixel fell outside the source buffer.
    #[error("destination pixel ({col}, {row}) maps to ({sx:.1}, {sy:.1}), outside the {width}x{height} source")]
    OutOfRange {
        col: usize,
        row: usize,
        sx: f64,
        sy: f64,
        width: usize,
        height: usize,
    },

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// 3x3 planar projective transform with the bottom-right entry fixed at 1.
///
/// Maps destination pixels of the rectified square back into source image
/// space (inverse mapping).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    h: [[f64; 3]; 3],
}

impl Homography {
    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self { h: rows }
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        self.h
    }

    /// Estimate the transform sending the `size`-sided destination square
    /// TL(0,0), TR(size,0), BL(0,size), BR(size,size) onto the four source
    /// corners.
    ///
    /// Collinear or coincident corners make the normal matrix singular and
    /// surface as [`MatrixError::ZeroPivot`].
    pub fn from_corners(corners: &RegionCorners, size: usize) -> Result<Self, WarpError> {
        let s = size as f64;
        let tl = (corners.top_left.x as f64, corners.top_left.y as f64);
        let tr = (corners.top_right.x as f64, corners.top_right.y as f64);
        let bl = (corners.bottom_left.x as f64, corners.bottom_left.y as f64);
        let br = (corners.bottom_right.x as f64, corners.bottom_right.y as f64);

        // Two rows per correspondence: the x equation over unknowns
        // (h00,h01,h02,h20,h21) and the y equation over (h10,h11,h12,h20,h21),
        // with the destination coordinates folded in as coefficients.
        let a = DenseMatrix::from_rows(&[
            [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            [s, 0.0, 1.0, 0.0, 0.0, 0.0, -s * tr.0, 0.0],
            [0.0, 0.0, 0.0, s, 0.0, 1.0, -s * tr.1, 0.0],
            [0.0, s, 1.0, 0.0, 0.0, 0.0, 0.0, -s * bl.0],
            [0.0, 0.0, 0.0, 0.0, s, 1.0, 0.0, -s * bl.1],
            [s, s, 1.0, 0.0, 0.0, 0.0, -s * br.0, -s * br.0],
            [0.0, 0.0, 0.0, s, s, 1.0, -s * br.1, -s * br.1],
        ]);
        let b = DenseMatrix::from_rows(&[
            [tl.0],
            [tl.1],
            [tr.0],
            [tr.1],
            [bl.0],
            [bl.1],
            [br.0],
            [br.1],
        ]);

        let at = a.transpose();
        let normal = at.mul(&a)?;
        let h = normal.inverse()?.mul(&at)?.mul(&b)?;

        Ok(Self {
            h: [
                [h.get(0, 0), h.get(1, 0), h.get(2, 0)],
                [h.get(3, 0), h.get(4, 0), h.get(5, 0)],
                [h.get(6, 0), h.get(7, 0), 1.0],
            ],
        })
    }

    /// Project a destination pixel `(col, row)` into source space, before
    /// truncation.
    #[inline]
    pub fn map_to_source(&self, col: usize, row: usize) -> (f64, f64) {
        let (col, row) = (col as f64, row as f64);
        let den = self.h[2][0] * col + self.h[2][1] * row + 1.0;
        let sx = (self.h[0][0] * col + self.h[0][1] * row + self.h[0][2]) / den;
        let sy = (self.h[1][0] * col + self.h[1][1] * row + self.h[1][2]) / den;
        (sx, sy)
    }
}

/// Tolerance for solver noise on corners lying exactly on the buffer edge.
const EDGE_EPS: f64 = 1e-6;

/// Floor toward negative infinity, snapping values within [`EDGE_EPS`] of
/// the valid `[0, limit)` range onto it.
///
/// The normal-equations solve leaves roughly 1e-13 of noise on the corner
/// coordinates; a corner sitting exactly on the border then maps a hair
/// below zero, and without the snap that floors to -1 and fails the whole
/// frame.
#[inline]
fn snap_floor(raw: f64, limit: usize) -> f64 {
    if (-EDGE_EPS..0.0).contains(&raw) {
        return 0.0;
    }
    let limit = limit as f64;
    if raw >= limit && raw < limit + EDGE_EPS {
        return limit - 1.0;
    }
    raw.floor()
}

/// Resample the source through the inverse mapping into a freshly owned
/// `size x size` buffer.
///
/// Source coordinates are floored toward negative infinity (after edge
/// snapping) and copied as-is (nearest-pixel, no interpolation). Any mapped
/// coordinate outside the source is an [`WarpError::OutOfRange`], never an
/// unchecked read.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(src, homography), fields(width = src.width, height = src.height))
)]
pub fn warp_to_square(
    src: &GrayImageView<'_>,
    homography: &Homography,
    size: usize,
) -> Result<GrayImage, WarpError> {
    let h = homography.to_array();
    let (w, ht) = (src.width, src.height);
    let mut out = GrayImage::new(size, size);
    for row in 0..size {
        // Row-constant terms hoisted out of the column loop.
        let rx = h[0][1] * row as f64 + h[0][2];
        let ry = h[1][1] * row as f64 + h[1][2];
        let rden = h[2][1] * row as f64 + 1.0;
        for col in 0..size {
            let den = h[2][0] * col as f64 + rden;
            let sx = snap_floor((h[0][0] * col as f64 + rx) / den, w);
            let sy = snap_floor((h[1][0] * col as f64 + ry) / den, ht);
            let inside = sx.is_finite()
                && sy.is_finite()
                && sx >= 0.0
                && sy >= 0.0
                && (sx as usize) < w
                && (sy as usize) < ht;
            if !inside {
                return Err(WarpError::OutOfRange {
                    col,
                    row,
                    sx,
                    sy,
                    width: w,
                    height: ht,
                });
            }
            out.data[row * size + col] = src.data[sy as usize * w + sx as usize];
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Coordinate;

    fn corners(tl: (usize, usize), tr: (usize, usize), bl: (usize, usize), br: (usize, usize)) -> RegionCorners {
        RegionCorners {
            top_left: Coordinate::new(tl.0, tl.1),
            top_right: Coordinate::new(tr.0, tr.1),
            bottom_left: Coordinate::new(bl.0, bl.1),
            bottom_right: Coordinate::new(br.0, br.1),
        }
    }

    #[test]
    fn square_corners_round_trip_within_a_pixel() {
        let size = 300usize;
        let c = corners((40, 30), (200, 35), (35, 180), (210, 190));
        let h = Homography::from_corners(&c, size).unwrap();

        let cases = [
            ((0, 0), (40.0, 30.0)),
            ((size, 0), (200.0, 35.0)),
            ((0, size), (35.0, 180.0)),
            ((size, size), (210.0, 190.0)),
        ];
        for ((col, row), (ex, ey)) in cases {
            let (sx, sy) = h.map_to_source(col, row);
            assert!(
                (sx - ex).abs() <= 1.0 && (sy - ey).abs() <= 1.0,
                "({col},{row}) mapped to ({sx},{sy}), expected ({ex},{ey})"
            );
        }
    }

    #[test]
    fn axis_aligned_region_warps_top_left_exactly() {
        let mut src = GrayImage::new(20, 20);
        for (i, v) in src.data.iter_mut().enumerate() {
            *v = (i % 251) as u8;
        }
        let c = corners((0, 0), (19, 0), (0, 19), (19, 19));
        let size = 20;
        let h = Homography::from_corners(&c, size).unwrap();
        let out = warp_to_square(&src.as_view(), &h, size).unwrap();
        assert_eq!(out.width, size);
        assert_eq!(out.height, size);
        assert_eq!(out.data[0], src.data[0]);
    }

    #[test]
    fn border_corner_solver_noise_snaps_into_bounds() {
        let mut src = GrayImage::new(8, 8);
        src.data[0] = 77;
        // Identity mapping with the kind of residue the solve leaves on a
        // region touching the frame border: (0,0) maps to -1e-13.
        let h = Homography::from_array([
            [1.0, 0.0, -1e-13],
            [0.0, 1.0, -1e-13],
            [0.0, 0.0, 1.0],
        ]);
        let out = warp_to_square(&src.as_view(), &h, 8).unwrap();
        assert_eq!(out.data[0], 77);
    }

    #[test]
    fn mapping_outside_the_source_is_an_error() {
        let src = GrayImage::new(10, 10);
        // Corners describe a region wider than the source buffer.
        let c = corners((0, 0), (25, 0), (0, 25), (25, 25));
        let h = Homography::from_corners(&c, 30).unwrap();
        let err = warp_to_square(&src.as_view(), &h, 30).unwrap_err();
        assert!(matches!(err, WarpError::OutOfRange { .. }), "{err:?}");
    }

    #[test]
    fn coincident_corners_are_a_singular_system() {
        let c = corners((0, 0), (0, 0), (0, 0), (0, 0));
        let err = Homography::from_corners(&c, 100).unwrap_err();
        assert!(
            matches!(err, WarpError::Matrix(MatrixError::ZeroPivot { .. })),
            "{err:?}"
        );
    }
}
