//! Temporal compositing of co-registered scenes

use super::{build_output, check_dimensions};
use crate::maybe_rayon::*;
use rusle_core::raster::Raster;
use rusle_core::{Error, Result};

/// Per-pixel median of the valid values across `scenes`.
///
/// Even counts average the two middle values. Pixels with no valid value
/// in any scene are NaN. All scenes must share the shape of the first,
/// which also provides the georeferencing.
pub fn median_composite(scenes: &[Raster<f64>]) -> Result<Raster<f64>> {
    let Some(first) = scenes.first() else {
        return Err(Error::Algorithm("median composite of an empty scene list".into()));
    };
    for scene in &scenes[1..] {
        check_dimensions(first, scene)?;
    }
    let (rows, cols) = first.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            let mut stack = Vec::with_capacity(scenes.len());
            for (col, out) in row_data.iter_mut().enumerate() {
                stack.clear();
                stack.extend(scenes.iter().filter_map(|s| {
                    let v = unsafe { s.get_unchecked(row, col) };
                    (!s.is_nodata(v)).then_some(v)
                }));
                *out = median(&mut stack);
            }
            row_data
        })
        .collect();

    build_output(first, data)
}

fn median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    values.sort_unstable_by(f64::total_cmp);
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
