//! Inverse Distance Weighting (Shepard, 1968)
//!
//! `z(x, y) = Σ(w_i z_i) / Σ(w_i)` with `w_i = 1 / d_i^p`.

use super::SamplePoint;
use crate::maybe_rayon::*;
use rusle_core::raster::{GeoTransform, Raster};
use rusle_core::{Error, Region, Result, CRS};

#[derive(Debug, Clone)]
pub struct IdwParams {
    /// Distance exponent
    pub power: f64,
    /// Ignore points farther than this; `None` uses every point
    pub max_radius: Option<f64>,
    /// Use at most this many nearest points
    pub max_points: Option<usize>,
    /// Closer than this, a cell takes the point value directly
    pub snap_distance: f64,
    pub rows: usize,
    pub cols: usize,
    pub transform: GeoTransform,
    pub crs: Option<CRS>,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self {
            power: 2.0,
            max_radius: None,
            max_points: None,
            snap_distance: 1e-10,
            rows: 100,
            cols: 100,
            transform: GeoTransform::default(),
            crs: None,
        }
    }
}

impl IdwParams {
    /// Output grid covering `region` with square cells of `cell_size`
    /// (region units), in WGS84.
    pub fn over_region(region: &Region, cell_size: f64) -> Result<Self> {
        if !(cell_size > 0.0) || region.is_empty() {
            return Err(Error::InvalidParameter {
                name: "cell_size",
                value: cell_size.to_string(),
                reason: "need a positive cell size and a non-empty region".into(),
            });
        }
        let cols = ((region.width() / cell_size) - 1e-9).ceil().max(1.0) as usize;
        let rows = ((region.height() / cell_size) - 1e-9).ceil().max(1.0) as usize;
        Ok(Self {
            rows,
            cols,
            transform: GeoTransform::new(region.min_x, region.max_y, cell_size, -cell_size),
            crs: Some(CRS::wgs84()),
            ..Self::default()
        })
    }
}

/// Interpolate `points` onto the grid in `params`. Cells with no point in
/// range are NaN; points with a NaN value are ignored.
pub fn idw(points: &[SamplePoint], params: IdwParams) -> Result<Raster<f64>> {
    let points: Vec<SamplePoint> = points.iter().copied().filter(|p| !p.value.is_nan()).collect();
    if points.is_empty() {
        return Err(Error::Algorithm("IDW needs at least one valid sample point".into()));
    }

    let IdwParams { power, rows, cols, transform, .. } = params;
    let snap_sq = params.snap_distance * params.snap_distance;
    let max_radius_sq = params.max_radius.map(|r| r * r);
    let max_points = params.max_points.unwrap_or(usize::MAX);

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut candidates: Vec<(f64, f64)> = Vec::with_capacity(points.len());

            'cells: for (col, out) in row_data.iter_mut().enumerate() {
                let (cx, cy) = transform.pixel_to_geo(col, row);
                candidates.clear();
                for pt in &points {
                    let dsq = pt.dist_sq(cx, cy);
                    if dsq < snap_sq {
                        *out = pt.value;
                        continue 'cells;
                    }
                    if max_radius_sq.map_or(true, |max| dsq <= max) {
                        candidates.push((dsq, pt.value));
                    }
                }

                if candidates.len() > max_points {
                    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
                    candidates.truncate(max_points);
                }

                let (sum_w, sum_wz) = candidates.iter().fold((0.0, 0.0), |(sw, swz), &(dsq, z)| {
                    let w = 1.0 / dsq.sqrt().powf(power);
                    (sw + w, swz + w * z)
                });
                if sum_w > 0.0 {
                    *out = sum_wz / sum_w;
                }
            }
            row_data
        })
        .collect();

    let mut output = Raster::from_vec(data, rows, cols)?;
    output.set_transform(transform);
    output.set_crs(params.crs);
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corners() -> Vec<SamplePoint> {
        vec![
            SamplePoint::new(0.5, 9.5, 10.0),
            SamplePoint::new(9.5, 9.5, 20.0),
            SamplePoint::new(0.5, 0.5, 30.0),
            SamplePoint::new(9.5, 0.5, 40.0),
        ]
    }

    fn grid() -> IdwParams {
        IdwParams {
            rows: 10,
            cols: 10,
            transform: GeoTransform::new(0.0, 10.0, 1.0, -1.0),
            ..Default::default()
        }
    }

    #[test]
    fn cells_on_points_take_point_value() {
        let r = idw(&corners(), grid()).unwrap();
        assert_eq!(r.get(0, 0).unwrap(), 10.0);
        assert_eq!(r.get(9, 9).unwrap(), 40.0);
    }

    #[test]
    fn symmetric_centre_is_mean() {
        // Cell (4,4) centre (4.5, 5.5) is not equidistant; use a symmetric setup
        let pts = vec![SamplePoint::new(0.0, 5.0, 10.0), SamplePoint::new(10.0, 5.0, 30.0)];
        let params = IdwParams {
            rows: 1,
            cols: 1,
            transform: GeoTransform::new(4.5, 5.5, 1.0, -1.0),
            ..Default::default()
        };
        let r = idw(&pts, params).unwrap();
        assert!((r.get(0, 0).unwrap() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn radius_leaves_gaps() {
        let params = IdwParams { max_radius: Some(2.0), ..grid() };
        let r = idw(&corners(), params).unwrap();
        assert!(r.get(5, 5).unwrap().is_nan());
        assert!(!r.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn single_point_everywhere() {
        let r = idw(&[SamplePoint::new(5.0, 5.0, 42.0)], grid()).unwrap();
        assert!(r.data().iter().all(|v| (v - 42.0).abs() < 1e-12));
    }

    #[test]
    fn nan_points_dropped_and_empty_rejected() {
        assert!(idw(&[], grid()).is_err());
        assert!(idw(&[SamplePoint::new(1.0, 1.0, f64::NAN)], grid()).is_err());
    }

    #[test]
    fn grid_over_region() {
        let p = IdwParams::over_region(&Region::tangier_rainfall(), 0.01).unwrap();
        assert_eq!((p.rows, p.cols), (15, 20));
        assert_eq!(p.crs, Some(CRS::wgs84()));
        assert!(IdwParams::over_region(&Region::tangier_rainfall(), 0.0).is_err());
    }
}
