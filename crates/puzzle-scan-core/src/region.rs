//! Largest-connected-region search over a binary mask.
//!
//! The puzzle is assumed to be the connected foreground region with the
//! largest bounding box, measured by half-perimeter. The search flood-fills
//! every region once over a private working copy of the mask, then refines
//! the winning bounding box's corners to actual foreground pixels.

use crate::image::{BinaryMask, Coordinate};

/// Region extraction failures.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionError {
    /// The mask holds no foreground pixel at all.
    #[error("no foreground region found in mask")]
    NoRegionFound,
}

/// Axis-aligned bounding box over the pixels visited by one flood fill.
///
/// Only the extremes are retained; no pixel list, area or true perimeter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectedRegion {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl ConnectedRegion {
    /// Inverted sentinel box that grows to fit as pixels are added.
    fn sentinel(width: usize, height: usize) -> Self {
        Self {
            min_x: width,
            min_y: height,
            max_x: 0,
            max_y: 0,
        }
    }

    fn add(&mut self, c: Coordinate) {
        self.min_x = self.min_x.min(c.x);
        self.max_x = self.max_x.max(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_y = self.max_y.max(c.y);
    }

    /// True while no pixel has been added (the box is still inverted).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// `2*(width + height)` of the bounding box, the cheap stand-in for
    /// region size. Only meaningful once at least one pixel was added.
    #[inline]
    pub fn half_perimeter(&self) -> usize {
        2 * (self.max_x - self.min_x) + 2 * (self.max_y - self.min_y)
    }
}

/// The four refined corners of the winning region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionCorners {
    pub top_left: Coordinate,
    pub top_right: Coordinate,
    pub bottom_left: Coordinate,
    pub bottom_right: Coordinate,
}

/// Strict-greater selection: `candidate` wins only when its half-perimeter
/// strictly exceeds the incumbent's. Equal or smaller never replaces, so
/// among ties the first region found stays.
fn beats(candidate: &ConnectedRegion, incumbent: Option<&ConnectedRegion>) -> bool {
    match incumbent {
        None => true,
        Some(best) => candidate.half_perimeter() > best.half_perimeter(),
    }
}

/// Drain one 8-connected region starting at `seed`, clearing every visited
/// pixel in `work` and folding coordinates into a bounding box.
fn flood_fill(work: &mut BinaryMask, seed: Coordinate) -> ConnectedRegion {
    let (w, h) = (work.width(), work.height());
    let mut region = ConnectedRegion::sentinel(w, h);
    let mut stack = vec![seed];
    work.clear(seed.x, seed.y);
    while let Some(coord) = stack.pop() {
        region.add(coord);
        let y0 = coord.y.saturating_sub(1);
        let y1 = (coord.y + 1).min(h - 1);
        let x0 = coord.x.saturating_sub(1);
        let x1 = (coord.x + 1).min(w - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                if work.is_set(x, y) {
                    stack.push(Coordinate::new(x, y));
                    // Cleared on push so a pixel is never queued twice.
                    work.clear(x, y);
                }
            }
        }
    }
    region
}

/// Scan the whole mask and return the region with the largest bounding-box
/// half-perimeter.
///
/// Works on a private clone; the caller's mask is left untouched.
pub fn largest_region(mask: &BinaryMask) -> Result<ConnectedRegion, RegionError> {
    let mut work = mask.clone();
    let (w, h) = (work.width(), work.height());
    let mut best: Option<ConnectedRegion> = None;
    let mut regions = 0usize;
    for y in 0..h {
        for x in 0..w {
            if work.is_set(x, y) {
                let region = flood_fill(&mut work, Coordinate::new(x, y));
                regions += 1;
                if beats(&region, best.as_ref()) {
                    best = Some(region);
                }
            }
        }
    }
    if let Some(ref region) = best {
        log::debug!(
            "kept region ({},{})-({},{}) of {} candidates",
            region.min_x,
            region.min_y,
            region.max_x,
            region.max_y,
            regions
        );
    }
    best.ok_or(RegionError::NoRegionFound)
}

fn scan_ray(
    mask: &BinaryMask,
    points: impl Iterator<Item = Coordinate>,
    nominal: Coordinate,
    closest: &mut Option<Coordinate>,
) {
    for p in points {
        if !mask.is_set(p.x, p.y) {
            continue;
        }
        let better = match *closest {
            None => true,
            Some(c) => p.manhattan(nominal) < c.manhattan(nominal),
        };
        if better {
            *closest = Some(p);
        }
    }
}

/// Find the foreground pixel nearest (by Manhattan distance) to one nominal
/// bounding-box corner.
///
/// Two rays are scanned from the corner inward: the row at the corner's
/// y-extreme and the column at the corner's x-extreme. The horizontal ray is
/// scanned first and only a strictly smaller distance replaces the running
/// best, so equidistant candidates resolve to the horizontal one. The box
/// itself need not have a foreground pixel exactly at its corner.
pub fn refine_corner(
    mask: &BinaryMask,
    region: &ConnectedRegion,
    nominal: Coordinate,
) -> Option<Coordinate> {
    let mut closest = None;
    let row = nominal.y;
    if nominal.x == region.min_x {
        let ray = (region.min_x..=region.max_x).map(|x| Coordinate::new(x, row));
        scan_ray(mask, ray, nominal, &mut closest);
    } else {
        let ray = (region.min_x..=region.max_x)
            .rev()
            .map(|x| Coordinate::new(x, row));
        scan_ray(mask, ray, nominal, &mut closest);
    }
    let col = nominal.x;
    if nominal.y == region.min_y {
        let ray = (region.min_y..=region.max_y).map(|y| Coordinate::new(col, y));
        scan_ray(mask, ray, nominal, &mut closest);
    } else {
        let ray = (region.min_y..=region.max_y)
            .rev()
            .map(|y| Coordinate::new(col, y));
        scan_ray(mask, ray, nominal, &mut closest);
    }
    closest
}

/// Locate the puzzle: largest region plus its four refined corners.
pub fn puzzle_corners(mask: &BinaryMask) -> Result<RegionCorners, RegionError> {
    let region = largest_region(mask)?;
    // A winning region has at least one pixel on each bounding-box edge, so
    // every ray scan hits a foreground pixel.
    let refine = |x, y| {
        refine_corner(mask, &region, Coordinate::new(x, y)).ok_or(RegionError::NoRegionFound)
    };
    Ok(RegionCorners {
        top_left: refine(region.min_x, region.min_y)?,
        top_right: refine(region.max_x, region.min_y)?,
        bottom_left: refine(region.min_x, region.max_y)?,
        bottom_right: refine(region.max_x, region.max_y)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with(width: usize, height: usize, pixels: &[(usize, usize)]) -> BinaryMask {
        let mut mask = BinaryMask::new(width, height);
        for &(x, y) in pixels {
            mask.set(x, y);
        }
        mask
    }

    fn fill_rect(mask: &mut BinaryMask, x0: usize, y0: usize, x1: usize, y1: usize) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                mask.set(x, y);
            }
        }
    }

    #[test]
    fn larger_half_perimeter_wins() {
        let mut mask = BinaryMask::new(40, 40);
        fill_rect(&mut mask, 0, 0, 10, 10);
        fill_rect(&mut mask, 20, 20, 25, 22);
        let region = largest_region(&mask).unwrap();
        assert_eq!((region.min_x, region.min_y), (0, 0));
        assert_eq!((region.max_x, region.max_y), (10, 10));
    }

    #[test]
    fn equal_regions_keep_the_first_found() {
        let mut mask = BinaryMask::new(30, 30);
        fill_rect(&mut mask, 10, 10, 13, 13);
        fill_rect(&mut mask, 1, 20, 4, 23);
        // (10,10) is reached first in the row-major scan; the equally sized
        // second square must not replace it.
        let region = largest_region(&mask).unwrap();
        assert_eq!((region.min_x, region.min_y), (10, 10));
    }

    #[test]
    fn diagonal_pixels_form_one_region() {
        let mask = mask_with(10, 10, &[(1, 1), (2, 2), (3, 3), (4, 4)]);
        let region = largest_region(&mask).unwrap();
        assert_eq!((region.min_x, region.min_y, region.max_x, region.max_y), (1, 1, 4, 4));
    }

    #[test]
    fn extraction_leaves_the_mask_intact() {
        let mut mask = BinaryMask::new(12, 12);
        fill_rect(&mut mask, 2, 2, 8, 8);
        let before = mask.clone();
        largest_region(&mask).unwrap();
        assert_eq!(mask, before);
    }

    #[test]
    fn winner_is_never_an_inverted_sentinel_box() {
        let inverted = ConnectedRegion {
            min_x: 10,
            min_y: 10,
            max_x: 0,
            max_y: 0,
        };
        assert!(inverted.is_empty());

        let mut mask = BinaryMask::new(12, 12);
        mask.set(3, 4);
        let region = largest_region(&mask).unwrap();
        assert!(!region.is_empty());
        assert_eq!(region.half_perimeter(), 0);
    }

    #[test]
    fn empty_mask_reports_no_region() {
        let mask = BinaryMask::new(16, 16);
        assert_eq!(largest_region(&mask), Err(RegionError::NoRegionFound));
        assert_eq!(puzzle_corners(&mask), Err(RegionError::NoRegionFound));
    }

    #[test]
    fn solid_rectangle_corners_are_exact() {
        let mut mask = BinaryMask::new(20, 16);
        fill_rect(&mut mask, 5, 4, 12, 9);
        let corners = puzzle_corners(&mask).unwrap();
        assert_eq!(corners.top_left, Coordinate::new(5, 4));
        assert_eq!(corners.top_right, Coordinate::new(12, 4));
        assert_eq!(corners.bottom_left, Coordinate::new(5, 9));
        assert_eq!(corners.bottom_right, Coordinate::new(12, 9));
    }

    #[test]
    fn hollow_border_corners_are_exact() {
        let mut mask = BinaryMask::new(30, 30);
        fill_rect(&mut mask, 3, 3, 24, 20);
        // Hollow out the interior; the border ring remains one 8-connected
        // region with the same bounding box.
        for y in 4..20 {
            for x in 4..24 {
                mask.clear(x, y);
            }
        }
        let corners = puzzle_corners(&mask).unwrap();
        assert_eq!(corners.top_left, Coordinate::new(3, 3));
        assert_eq!(corners.bottom_right, Coordinate::new(24, 20));
    }

    #[test]
    fn cross_shape_resolves_corner_ties_horizontally() {
        let mut mask = BinaryMask::new(12, 12);
        for i in 2..=8 {
            mask.set(i, 5);
            mask.set(5, i);
        }
        let region = largest_region(&mask).unwrap();
        let corner = refine_corner(&mask, &region, Coordinate::new(2, 2)).unwrap();
        // (5,2) on the horizontal ray and (2,5) on the vertical ray are both
        // at distance 3; the horizontal ray is scanned first and wins.
        assert_eq!(corner, Coordinate::new(5, 2));
    }
}
