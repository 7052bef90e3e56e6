//! Normalized-difference spectral indices

use super::{build_output, check_dimensions};
use crate::maybe_rayon::*;
use rusle_core::raster::Raster;
use rusle_core::Result;

/// `(band_a - band_b) / (band_a + band_b)`
///
/// NaN where either band is nodata or the sum is zero.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;
    let (rows, cols) = band_a.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };
                if band_a.is_nodata(a) || band_b.is_nodata(b) {
                    continue;
                }
                let sum = a + b;
                if sum.abs() < 1e-10 {
                    continue;
                }
                *out = (a - b) / sum;
            }
            row_data
        })
        .collect();

    build_output(band_a, data)
}

/// Normalized Difference Vegetation Index, `(NIR - Red) / (NIR + Red)`.
///
/// For Sentinel-2 pass `B8` as `nir` and `B4` as `red`.
pub fn ndvi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, red)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn vegetated_pixel() {
        let nir = Raster::filled(3, 3, 0.5);
        let red = Raster::filled(3, 3, 0.1);
        let v = ndvi(&nir, &red).unwrap();
        assert_relative_eq!(v.get(1, 1).unwrap(), 0.4 / 0.6, epsilon = 1e-12);
    }

    #[test]
    fn zero_sum_and_nodata_are_nan() {
        let mut nir = Raster::filled(2, 2, 0.0);
        let red = Raster::filled(2, 2, 0.0);
        nir.set(0, 1, 0.3).unwrap();
        nir.set(1, 1, f64::NAN).unwrap();
        let v = ndvi(&nir, &red).unwrap();
        assert!(v.get(0, 0).unwrap().is_nan());
        assert_eq!(v.get(0, 1).unwrap(), 1.0);
        assert!(v.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let a = Raster::filled(2, 2, 1.0);
        let b = Raster::filled(2, 3, 1.0);
        assert!(normalized_difference(&a, &b).is_err());
    }
}
