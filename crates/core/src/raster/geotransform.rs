//! Affine pixel <-> map coordinate transform

use serde::{Deserialize, Serialize};

/// Affine georeferencing of a raster grid.
///
/// ```text
/// x = origin_x + col * pixel_width  + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// North-up grids have zero rotation terms and a negative `pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X of the upper-left corner
    pub origin_x: f64,
    /// Y of the upper-left corner
    pub origin_y: f64,
    pub pixel_width: f64,
    /// Usually negative
    pub pixel_height: f64,
    pub row_rotation: f64,
    pub col_rotation: f64,
}

impl GeoTransform {
    /// North-up transform without rotation
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Map coordinates of the centre of pixel `(col, row)`
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Map coordinates of the upper-left corner of pixel `(col, row)`
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64, row as f64)
    }

    fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// Fractional pixel coordinates `(col, row)` of a map position.
    ///
    /// Returns NaNs for a degenerate (non-invertible) transform.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;
        if det.abs() < 1e-15 {
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;
        (col, row)
    }

    /// Cell size, assuming square pixels without rotation
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    pub fn is_north_up(&self) -> bool {
        self.row_rotation.abs() < 1e-12 && self.col_rotation.abs() < 1e-12 && self.pixel_height < 0.0
    }

    /// Extent `(min_x, min_y, max_x, max_y)` of a `width` x `height` grid
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let corners = [
            self.pixel_to_geo_corner(0, 0),
            self.pixel_to_geo_corner(width, 0),
            self.pixel_to_geo_corner(0, height),
            self.pixel_to_geo_corner(width, height),
        ];

        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }

    /// Transform of the sub-grid whose upper-left pixel is `(col, row)`
    pub fn shifted(&self, col: usize, row: usize) -> Self {
        let (origin_x, origin_y) = self.pixel_to_geo_corner(col, row);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_centre_inverse() {
        let gt = GeoTransform::new(-5.94, 35.84, 0.01, -0.01);

        let (x, y) = gt.pixel_to_geo(3, 7);
        assert_relative_eq!(x, -5.905, epsilon = 1e-12);
        assert_relative_eq!(y, 35.765, epsilon = 1e-12);

        let (col, row) = gt.geo_to_pixel(x, y);
        assert_relative_eq!(col, 3.5, epsilon = 1e-9);
        assert_relative_eq!(row, 7.5, epsilon = 1e-9);
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::new(0.0, 100.0, 2.0, -2.0);
        let (min_x, min_y, max_x, max_y) = gt.bounds(50, 25);

        assert_relative_eq!(min_x, 0.0);
        assert_relative_eq!(min_y, 50.0);
        assert_relative_eq!(max_x, 100.0);
        assert_relative_eq!(max_y, 100.0);
    }

    #[test]
    fn test_shifted_origin() {
        let gt = GeoTransform::new(10.0, 20.0, 0.5, -0.5);
        let sub = gt.shifted(4, 2);
        assert_relative_eq!(sub.origin_x, 12.0);
        assert_relative_eq!(sub.origin_y, 19.0);
        assert_eq!(sub.pixel_width, gt.pixel_width);
    }
}
