//! Raster algebra
//!
//! Element-wise functions of one or many aligned rasters. A nodata
//! cell in any input yields NaN in the output.

use super::{build_output, check_dimensions};
use crate::maybe_rayon::*;
use rusle_core::raster::Raster;
use rusle_core::{Error, Result};

/// Apply `f` to every valid cell.
///
/// ```ignore
/// let depth_mm = band_math(&precip_m, |v| v * 1000.0)?;
/// ```
pub fn band_math<F>(raster: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    let (rows, cols) = raster.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let v = unsafe { raster.get_unchecked(row, col) };
                if !raster.is_nodata(v) {
                    *out = f(v);
                }
            }
            row_data
        })
        .collect();

    build_output(raster, data)
}

/// Apply `f` to the stacked values of `bands` at every cell.
///
/// `f` receives one value per band, in the order given. The first band
/// provides the georeferencing of the result.
pub fn band_math_n<F>(bands: &[&Raster<f64>], f: F) -> Result<Raster<f64>>
where
    F: Fn(&[f64]) -> f64 + Sync + Send,
{
    let Some(first) = bands.first() else {
        return Err(Error::Algorithm("band_math_n needs at least one band".into()));
    };
    for band in &bands[1..] {
        check_dimensions(first, band)?;
    }
    let (rows, cols) = first.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut values = vec![0.0; bands.len()];
            'cells: for (col, out) in row_data.iter_mut().enumerate() {
                for (slot, band) in values.iter_mut().zip(bands) {
                    let v = unsafe { band.get_unchecked(row, col) };
                    if band.is_nodata(v) {
                        continue 'cells;
                    }
                    *slot = v;
                }
                *out = f(&values);
            }
            row_data
        })
        .collect();

    build_output(first, data)
}
