//! Study-area rectangles and raster clipping

use crate::error::{Error, Result};
use crate::raster::{Raster, RasterElement};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle `[min_x, min_y, max_x, max_y]`, in the CRS of the
/// rasters it is applied to (lon/lat degrees for the Tangier jobs).
///
/// Serialises as a four-element array so configs read like
/// `"region": [-5.94, 35.64, -5.72, 35.84]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Region {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Region {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Tangier study area used by the C, K, LS and P factor jobs
    pub fn tangier() -> Self {
        Self::new(-5.94, 35.64, -5.72, 35.84)
    }

    /// Smaller Tangier box used by the rainfall (R factor) job
    pub fn tangier_rainfall() -> Self {
        Self::new(-5.9, 35.7, -5.7, 35.85)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Inclusive on all edges
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn intersects(&self, other: &Region) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Region) -> Region {
        Region::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Region from a STAC-style `[west, south, east, north]` slice
    pub fn from_bbox(bbox: &[f64]) -> Option<Self> {
        match bbox {
            [w, s, e, n] => Some(Self::new(*w, *s, *e, *n)),
            // 3D bbox: [w, s, zmin, e, n, zmax]
            [w, s, _, e, n, _] => Some(Self::new(*w, *s, *e, *n)),
            _ => None,
        }
    }
}

impl From<[f64; 4]> for Region {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Region> for [f64; 4] {
    fn from(r: Region) -> Self {
        [r.min_x, r.min_y, r.max_x, r.max_y]
    }
}

const EDGE_EPS: f64 = 1e-6;

/// Crop `raster` to the cells overlapping `region`.
///
/// Cells only partially covered by the rectangle are kept. The result keeps
/// the CRS and nodata of the input and gets a transform anchored at the new
/// upper-left cell.
pub fn clip<T: RasterElement>(raster: &Raster<T>, region: &Region) -> Result<Raster<T>> {
    let outside = || Error::RegionOutside {
        min_x: region.min_x,
        min_y: region.min_y,
        max_x: region.max_x,
        max_y: region.max_y,
    };

    let (col_a, row_a) = raster.geo_to_pixel(region.min_x, region.max_y);
    let (col_b, row_b) = raster.geo_to_pixel(region.max_x, region.min_y);
    if ![col_a, row_a, col_b, row_b].iter().all(|v| v.is_finite()) {
        return Err(outside());
    }

    // Edges landing within EDGE_EPS of a cell boundary snap to it, so
    // floating-point noise never adds a sliver row or column.
    let clamp = |v: f64, hi: usize| (v.max(0.0) as usize).min(hi);
    let (rows, cols) = raster.shape();
    let min_col = clamp((col_a.min(col_b) + EDGE_EPS).floor(), cols);
    let max_col = clamp((col_a.max(col_b) - EDGE_EPS).ceil(), cols);
    let min_row = clamp((row_a.min(row_b) + EDGE_EPS).floor(), rows);
    let max_row = clamp((row_a.max(row_b) - EDGE_EPS).ceil(), rows);

    if min_col >= max_col || min_row >= max_row {
        return Err(outside());
    }

    raster.window(min_row, min_col, max_row - min_row, max_col - min_col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;

    fn degree_grid() -> Raster<f64> {
        // 0.01 degree cells over [-6.0, 35.6] .. [-5.6, 35.9]
        let rows = 30;
        let cols = 40;
        let data = (0..rows * cols).map(|v| v as f64).collect();
        let mut r = Raster::from_vec(data, rows, cols).unwrap();
        r.set_transform(GeoTransform::new(-6.0, 35.9, 0.01, -0.01));
        r
    }

    #[test]
    fn test_union_of_tangier_boxes() {
        let both = Region::tangier().union(&Region::tangier_rainfall());
        assert_eq!(both, Region::new(-5.94, 35.64, -5.7, 35.85));
        assert_eq!(both.union(&Region::tangier()), both);
    }

    #[test]
    fn test_clip_to_tangier() {
        let raster = degree_grid();
        let clipped = clip(&raster, &Region::tangier()).unwrap();

        // 0.22 x 0.20 degrees at 0.01 resolution
        assert_eq!(clipped.cols(), 22);
        assert_eq!(clipped.rows(), 20);

        let (min_x, min_y, max_x, max_y) = clipped.bounds();
        assert!((min_x + 5.94).abs() < 1e-9);
        assert!((max_x + 5.72).abs() < 1e-9);
        assert!((min_y - 35.64).abs() < 1e-9);
        assert!((max_y - 35.84).abs() < 1e-9);
    }

    #[test]
    fn test_clip_partial_overlap_is_clamped() {
        let raster = degree_grid();
        let region = Region::new(-5.65, 35.5, -5.0, 35.7);
        let clipped = clip(&raster, &region).unwrap();
        assert_eq!(clipped.cols(), 5);
        assert_eq!(clipped.rows(), 10);
    }

    #[test]
    fn test_clip_outside_fails() {
        let raster = degree_grid();
        let region = Region::new(10.0, 10.0, 11.0, 11.0);
        assert!(matches!(clip(&raster, &region), Err(Error::RegionOutside { .. })));
    }

    #[test]
    fn test_array_conversion() {
        let arr: [f64; 4] = Region::tangier().into();
        assert_eq!(arr, [-5.94, 35.64, -5.72, 35.84]);
        assert_eq!(Region::from(arr), Region::tangier());
    }

    #[test]
    fn test_from_bbox() {
        assert_eq!(
            Region::from_bbox(&[-6.0, 35.0, -5.0, 36.0]),
            Some(Region::new(-6.0, 35.0, -5.0, 36.0))
        );
        assert_eq!(
            Region::from_bbox(&[-6.0, 35.0, 0.0, -5.0, 36.0, 100.0]),
            Some(Region::new(-6.0, 35.0, -5.0, 36.0))
        );
        assert!(Region::from_bbox(&[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_intersects_and_contains() {
        let a = Region::tangier();
        assert!(a.intersects(&Region::tangier_rainfall()));
        assert!(!a.intersects(&Region::new(0.0, 0.0, 1.0, 1.0)));
        assert!(a.contains(-5.8, 35.7));
        assert!(!a.is_empty());
        assert!(Region::new(1.0, 1.0, 1.0, 2.0).is_empty());
    }
}
