//! Thematic remapping
//!
//! [`remap`] maps exact integer codes (land-cover legends) to values.

use super::build_output;
use crate::maybe_rayon::*;
use rusle_core::raster::Raster;
use rusle_core::Result;
use std::collections::HashMap;

/// Exact-code lookup table
#[derive(Debug, Clone, Default)]
pub struct RemapParams {
    pub table: HashMap<i64, f64>,
    /// Value for codes missing from the table, and for nodata cells
    pub default_value: f64,
}

impl RemapParams {
    pub fn new(pairs: impl IntoIterator<Item = (i64, f64)>, default_value: f64) -> Self {
        Self {
            table: pairs.into_iter().collect(),
            default_value,
        }
    }
}

/// Replace each integer code by its table value.
///
/// Cell values are rounded to the nearest integer before lookup so codes
/// read from float rasters still match.
pub fn remap(raster: &Raster<f64>, params: &RemapParams) -> Result<Raster<f64>> {
    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![params.default_value; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let v = unsafe { raster.get_unchecked(row, col) };
                if raster.is_nodata(v) {
                    continue;
                }
                if let Some(mapped) = params.table.get(&(v.round() as i64)) {
                    *out = *mapped;
                }
            }
            row_data
        })
        .collect();

    build_output(raster, data)
}
