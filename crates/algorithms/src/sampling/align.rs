//! Nearest-cell alignment of grids

use crate::maybe_rayon::*;
use rusle_core::raster::Raster;
use rusle_core::{Error, Result};

/// Resample `source` onto the grid of `template` by nearest cell.
///
/// Each template cell centre takes the value of the source cell containing
/// it. Centres outside the source, or on source nodata, become NaN.
pub fn align_nearest(source: &Raster<f64>, template: &Raster<f64>) -> Result<Raster<f64>> {
    if let (Some(a), Some(b)) = (source.crs(), template.crs()) {
        if !a.is_equivalent(b) {
            return Err(Error::CrsMismatch(b.identifier(), a.identifier()));
        }
    }

    let (rows, cols) = template.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = Vec::with_capacity(cols);
            for col in 0..cols {
                let (x, y) = template.pixel_to_geo(col, row);
                row_data.push(source.value_at_geo(x, y).unwrap_or(f64::NAN));
            }
            row_data
        })
        .collect();

    template.derive_f64(data)
}
