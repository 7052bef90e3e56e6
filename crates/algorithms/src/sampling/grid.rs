//! Regular point lattices and sampling at fixed coordinates

use super::{check_bands, values_at, NamedBand, Sample, SampleSet};
use rusle_core::{Error, Region, Result};

/// Inclusive arithmetic sequence from `start` to `end`.
fn sequence(start: f64, end: f64, step: f64) -> Vec<f64> {
    let count = ((end - start) / step + 1e-9).floor() as usize + 1;
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Lattice of `(lon, lat)` points over `region` spaced by `step`.
///
/// Both axes start at the region's minimum and include the maximum when it
/// falls on the lattice. Points are ordered by longitude first, then
/// latitude.
pub fn point_grid(region: &Region, step: f64) -> Result<Vec<(f64, f64)>> {
    if !(step > 0.0 && step.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "step",
            value: step.to_string(),
            reason: "must be positive".into(),
        });
    }
    if region.is_empty() {
        return Err(Error::InvalidParameter {
            name: "region",
            value: format!("{:?}", region),
            reason: "region has no area".into(),
        });
    }

    let lons = sequence(region.min_x, region.max_x, step);
    let lats = sequence(region.min_y, region.max_y, step);
    Ok(lons
        .iter()
        .flat_map(|&lon| lats.iter().map(move |&lat| (lon, lat)))
        .collect())
}

/// Nearest-pixel values of `bands` at each point.
///
/// Points outside the rasters, or on a cell where any band is nodata, are
/// skipped. Sample coordinates are the input point, not the cell centre.
pub fn sample_at_points(bands: &[NamedBand<'_>], points: &[(f64, f64)]) -> Result<SampleSet> {
    check_bands(bands)?;
    let reference = bands[0].1;

    let samples = points
        .iter()
        .enumerate()
        .filter_map(|(source, &(x, y))| {
            let (row, col) = reference.cell_at_geo(x, y)?;
            let values = values_at(bands, row, col)?;
            Some(Sample { source, x, y, values })
        })
        .collect();

    Ok(SampleSet {
        bands: bands.iter().map(|(name, _)| name.to_string()).collect(),
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusle_core::{GeoTransform, Raster};

    #[test]
    fn rainfall_grid_shape_and_order() {
        let pts = point_grid(&Region::tangier_rainfall(), 0.02).unwrap();
        // lon -5.9..=-5.7 -> 11 values, lat 35.7..35.85 -> 8 values
        assert_eq!(pts.len(), 11 * 8);
        assert!((pts[0].0 + 5.9).abs() < 1e-12 && (pts[0].1 - 35.7).abs() < 1e-12);
        assert!((pts[1].0 + 5.9).abs() < 1e-12 && (pts[1].1 - 35.72).abs() < 1e-9);
        assert!((pts[8].0 + 5.88).abs() < 1e-9);
        let last = pts[pts.len() - 1];
        assert!((last.0 + 5.7).abs() < 1e-9 && (last.1 - 35.84).abs() < 1e-9);
    }

    #[test]
    fn invalid_grid_inputs() {
        assert!(point_grid(&Region::tangier(), 0.0).is_err());
        assert!(point_grid(&Region::new(1.0, 1.0, 1.0, 2.0), 0.1).is_err());
    }

    #[test]
    fn nearest_pixel_sampling() {
        let mut r = Raster::from_vec((0..12).map(f64::from).collect(), 3, 4).unwrap();
        r.set_transform(GeoTransform::new(0.0, 3.0, 1.0, -1.0));
        r.set(2, 3, f64::NAN).unwrap();
        let pts = [(0.2, 2.9), (3.9, 0.1), (1.5, 1.5), (10.0, 1.0)];
        let set = sample_at_points(&[("v", &r)], &pts).unwrap();
        assert_eq!(set.bands, vec!["v"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.samples[0].values, vec![0.0]);
        assert_eq!(set.samples[1].values, vec![5.0]);
        assert_eq!((set.samples[1].x, set.samples[1].y), (1.5, 1.5));
        assert_eq!(set.samples[1].source, 2);
    }
}
