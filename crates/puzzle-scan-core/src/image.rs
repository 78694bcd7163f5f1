//! Lightweight row-major pixel buffers shared across the pipeline.
//!
//! Dimensions are fixed at construction and indexing is plain `y * width + x`
//! slice access: callers are expected to stay within `width * height` bounds,
//! nothing here auto-clips.

/// Borrowed grayscale frame.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

/// Owned grayscale buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Zero-filled buffer of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    #[inline]
    pub fn as_view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

/// Integer pixel coordinate in image space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Coordinate {
    pub x: usize,
    pub y: usize,
}

impl Coordinate {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`.
    #[inline]
    pub fn manhattan(self, other: Coordinate) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Two-level mask produced by binarization.
///
/// Every byte is either 0 (background) or [`BinaryMask::FOREGROUND`]; region
/// extraction works on a private clone because the search destructively
/// clears visited pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl BinaryMask {
    /// All-ones sentinel marking a foreground pixel.
    pub const FOREGROUND: u8 = 0xFF;

    /// All-background mask of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] != 0
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize) {
        self.data[y * self.width + x] = Self::FOREGROUND;
    }

    #[inline]
    pub fn clear(&mut self, x: usize, y: usize) {
        self.data[y * self.width + x] = 0;
    }

    /// Raw bytes, row-major.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// View the mask as a grayscale buffer (0 / 0xFF), e.g. for warping.
    #[inline]
    pub fn as_view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_set_clear_round_trip() {
        let mut mask = BinaryMask::new(4, 3);
        assert!(!mask.is_set(2, 1));
        mask.set(2, 1);
        assert!(mask.is_set(2, 1));
        assert_eq!(mask.data()[1 * 4 + 2], BinaryMask::FOREGROUND);
        mask.clear(2, 1);
        assert!(!mask.is_set(2, 1));
    }

    #[test]
    fn manhattan_is_symmetric() {
        let a = Coordinate::new(3, 7);
        let b = Coordinate::new(10, 2);
        assert_eq!(a.manhattan(b), 12);
        assert_eq!(b.manhattan(a), 12);
    }
}
