//! Local-adaptive binarization over a summed-area table.
//!
//! A pixel is foreground when it is darker than its local average by more
//! than a contrast threshold, which keeps thin dark grid lines and digits
//! against an unevenly lit background. The local average comes from an O(1)
//! box query over a prefix-sum table, or optionally from a fixed 5x5
//! edge-renormalized Gaussian kernel.

use serde::{Deserialize, Serialize};

use crate::image::{BinaryMask, GrayImage, GrayImageView};

/// Binarization failures.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarizeError {
    /// The blur window has no pixels to average, which can only happen for an
    /// empty source buffer: a clamped window over a non-empty buffer always
    /// keeps at least the center pixel.
    #[error("degenerate blur box: empty {width}x{height} source buffer")]
    DegenerateBox { width: usize, height: usize },
}

/// Blur used to estimate the local background intensity.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlurKind {
    /// Summed-area-table box average over a `2*radius+1` square window.
    #[default]
    Box,
    /// Fixed 5x5 Gaussian, renormalized by the in-bounds kernel weights at
    /// the buffer edges.
    Gaussian,
}

/// Local-contrast binarization settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BinarizeParams {
    /// Half-side of the local-average window, in pixels.
    pub radius: usize,
    /// Contrast cutoff: a pixel is foreground when the local average exceeds
    /// its raw intensity by more than this.
    pub threshold: u8,
    /// Blur backing the local average.
    #[serde(default)]
    pub blur: BlurKind,
}

impl Default for BinarizeParams {
    fn default() -> Self {
        Self {
            radius: 20,
            threshold: 20,
            blur: BlurKind::Box,
        }
    }
}

/// 2-D prefix-sum table enabling O(1) rectangle-sum queries.
///
/// `table[r][c]` is the sum of all intensities in `(0,0)..=(r,c)`, built
/// incrementally with inclusion-exclusion from the three already-computed
/// neighbors.
#[derive(Clone, Debug)]
pub struct SummedAreaTable {
    width: usize,
    data: Vec<u64>,
}

impl SummedAreaTable {
    pub fn build(src: &GrayImageView<'_>) -> Self {
        let (w, h) = (src.width, src.height);
        let mut data = vec![0u64; w * h];
        for row in 0..h {
            for col in 0..w {
                let idx = row * w + col;
                let mut sum = u64::from(src.data[idx]);
                if col > 0 {
                    sum += data[idx - 1];
                }
                if row > 0 {
                    sum += data[idx - w];
                }
                if row > 0 && col > 0 {
                    sum -= data[idx - w - 1];
                }
                data[idx] = sum;
            }
        }
        Self { width: w, data }
    }

    /// Sum over the inclusive rectangle `(r0,c0)..=(r1,c1)`.
    ///
    /// The four corner lookups sit one pixel inside the lower bounds; terms
    /// that would fall outside the table contribute zero. Additions come
    /// first so the intermediate never underflows.
    pub fn rect_sum(&self, r0: usize, c0: usize, r1: usize, c1: usize) -> u64 {
        let w = self.width;
        let mut add = self.data[r1 * w + c1];
        let mut sub = 0u64;
        if r0 > 0 {
            sub += self.data[(r0 - 1) * w + c1];
        }
        if c0 > 0 {
            sub += self.data[r1 * w + c0 - 1];
        }
        if r0 > 0 && c0 > 0 {
            add += self.data[(r0 - 1) * w + c0 - 1];
        }
        add - sub
    }
}

/// Box blur: every output pixel is the integer average of the clamped
/// `2*radius+1` square window around it.
pub fn box_blur(src: &GrayImageView<'_>, radius: usize) -> Result<GrayImage, BinarizeError> {
    if src.width == 0 || src.height == 0 {
        return Err(BinarizeError::DegenerateBox {
            width: src.width,
            height: src.height,
        });
    }
    let (w, h) = (src.width, src.height);
    let table = SummedAreaTable::build(src);
    let mut out = GrayImage::new(w, h);
    for row in 0..h {
        let r0 = row.saturating_sub(radius);
        let r1 = (row + radius).min(h - 1);
        for col in 0..w {
            let c0 = col.saturating_sub(radius);
            let c1 = (col + radius).min(w - 1);
            let count = ((r1 - r0 + 1) * (c1 - c0 + 1)) as u64;
            let average = table.rect_sum(r0, c0, r1, c1) / count;
            out.data[row * w + col] = average as u8;
        }
    }
    Ok(out)
}

/// 5x5 Gaussian weights, sigma ~1.0.
const GAUSS_KERNEL: [f32; 25] = [
    0.0030, 0.0133, 0.0219, 0.0133, 0.0030, //
    0.0133, 0.0596, 0.0983, 0.0596, 0.0133, //
    0.0219, 0.0983, 0.1621, 0.0983, 0.0219, //
    0.0133, 0.0596, 0.0983, 0.0596, 0.0133, //
    0.0030, 0.0133, 0.0219, 0.0133, 0.0030,
];
const GAUSS_SIDE: isize = 5;

/// Edge-aware Gaussian blur.
///
/// Where the kernel footprint extends past the buffer, the result is
/// renormalized by the sum of in-bounds weights so edge pixels are not
/// darkened by implicit zero padding.
pub fn gaussian_blur(src: &GrayImageView<'_>) -> Result<GrayImage, BinarizeError> {
    if src.width == 0 || src.height == 0 {
        return Err(BinarizeError::DegenerateBox {
            width: src.width,
            height: src.height,
        });
    }
    let (w, h) = (src.width as isize, src.height as isize);
    let mut out = GrayImage::new(src.width, src.height);
    for row in 0..h {
        for col in 0..w {
            let mut acc = 0.0f32;
            let mut weight = 0.0f32;
            for (k, &coeff) in GAUSS_KERNEL.iter().enumerate() {
                let y = row - GAUSS_SIDE / 2 + k as isize / GAUSS_SIDE;
                let x = col - GAUSS_SIDE / 2 + k as isize % GAUSS_SIDE;
                if y >= 0 && y < h && x >= 0 && x < w {
                    acc += f32::from(src.data[(y * w + x) as usize]) * coeff;
                    weight += coeff;
                }
            }
            out.data[(row * w + col) as usize] = (acc / weight) as u8;
        }
    }
    Ok(out)
}

/// Reduce a grayscale frame to a two-level mask by local contrast.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(src), fields(width = src.width, height = src.height))
)]
pub fn binarize(
    src: &GrayImageView<'_>,
    params: &BinarizeParams,
) -> Result<BinaryMask, BinarizeError> {
    let local = match params.blur {
        BlurKind::Box => box_blur(src, params.radius)?,
        BlurKind::Gaussian => gaussian_blur(src)?,
    };
    let (w, h) = (src.width, src.height);
    let mut mask = BinaryMask::new(w, h);
    let threshold = i16::from(params.threshold);
    let mut foreground = 0usize;
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let contrast = i16::from(local.data[idx]) - i16::from(src.data[idx]);
            if contrast > threshold {
                mask.set(x, y);
                foreground += 1;
            }
        }
    }
    log::debug!(
        "binarized {}x{} frame ({:?}, radius={}, threshold={}): {} foreground px",
        w,
        h,
        params.blur,
        params.radius,
        params.threshold,
        foreground
    );
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                img.data[y * width + x] = f(x, y);
            }
        }
        img
    }

    #[test]
    fn rect_sum_matches_brute_force() {
        let img = gray(9, 7, |x, y| ((x * 7 + y * 13) % 251) as u8);
        let table = SummedAreaTable::build(&img.as_view());
        for (r0, c0, r1, c1) in [(0, 0, 6, 8), (2, 3, 5, 7), (0, 4, 0, 4), (3, 0, 6, 2)] {
            let mut expected = 0u64;
            for r in r0..=r1 {
                for c in c0..=c1 {
                    expected += u64::from(img.data[r * 9 + c]);
                }
            }
            assert_eq!(table.rect_sum(r0, c0, r1, c1), expected);
        }
    }

    #[test]
    fn box_blur_of_uniform_buffer_is_identity() {
        for (w, h) in [(1, 1), (7, 3), (16, 16)] {
            for radius in [0usize, 1, 5, 40] {
                let img = gray(w, h, |_, _| 173);
                let blurred = box_blur(&img.as_view(), radius).unwrap();
                assert!(
                    blurred.data.iter().all(|&v| v == 173),
                    "radius {radius} on {w}x{h}"
                );
            }
        }
    }

    #[test]
    fn box_blur_rejects_empty_buffer() {
        let img = GrayImage::new(0, 5);
        assert_eq!(
            box_blur(&img.as_view(), 3),
            Err(BinarizeError::DegenerateBox {
                width: 0,
                height: 5
            })
        );
    }

    #[test]
    fn gaussian_blur_of_uniform_buffer_stays_uniform() {
        let img = gray(12, 9, |_, _| 200);
        let blurred = gaussian_blur(&img.as_view()).unwrap();
        // Renormalization keeps edges unchanged too, up to float truncation.
        assert!(blurred.data.iter().all(|&v| v.abs_diff(200) <= 1));
    }

    #[test]
    fn dark_line_on_light_background_is_foreground() {
        let img = gray(32, 32, |_, y| if y == 16 { 50 } else { 200 });
        let mask = binarize(&img.as_view(), &BinarizeParams::default()).unwrap();
        for x in 0..32 {
            assert!(mask.is_set(x, 16), "line pixel at x={x}");
            assert!(!mask.is_set(x, 2), "background pixel at x={x}");
        }
    }

    #[test]
    fn output_is_strictly_two_level() {
        let img = gray(20, 20, |x, y| ((x * y * 11) % 256) as u8);
        let mask = binarize(&img.as_view(), &BinarizeParams::default()).unwrap();
        assert!(mask
            .data()
            .iter()
            .all(|&v| v == 0 || v == BinaryMask::FOREGROUND));
    }
}
