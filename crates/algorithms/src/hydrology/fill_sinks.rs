//! Depression filling (Planchon & Darboux, 2001).
//!
//! The water surface W starts at +inf everywhere except on outlet cells
//! (grid border and cells touching nodata), then is lowered towards the
//! DEM in alternating raster sweeps until nothing changes. Every filled
//! cell ends up with a descending path to an outlet, which the D8 router
//! needs to accumulate flow across closed basins.
//!
//! Planchon, O., Darboux, F. (2001). A fast, simple and versatile algorithm
//! to fill the depressions of digital elevation models. Catena 46, 159-176.

use super::d8::{neighbour, DISTANCES};
use ndarray::Array2;
use rusle_core::raster::Raster;
use rusle_core::{Algorithm, Error, Result};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FillSinksParams {
    /// Minimum gradient imposed across filled flats, per unit of cell size.
    /// 0.0 leaves filled areas perfectly flat.
    pub min_slope: f64,
}

impl Default for FillSinksParams {
    fn default() -> Self {
        Self { min_slope: 0.01 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FillSinks;

impl Algorithm for FillSinks {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = FillSinksParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Fill Sinks"
    }

    fn description(&self) -> &'static str {
        "Fill DEM depressions with the Planchon-Darboux sweep"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        fill_sinks(&input, params)
    }
}

/// Fill every closed depression of `dem`. Nodata cells stay nodata (NaN).
pub fn fill_sinks(dem: &Raster<f64>, params: FillSinksParams) -> Result<Raster<f64>> {
    if params.min_slope < 0.0 || !params.min_slope.is_finite() {
        return Err(Error::InvalidParameter {
            name: "min_slope",
            value: params.min_slope.to_string(),
            reason: "must be a finite value >= 0".into(),
        });
    }

    let (rows, cols) = dem.shape();
    let epsilon = params.min_slope * dem.cell_size();
    let valid = |r: usize, c: usize| {
        let v = unsafe { dem.get_unchecked(r, c) };
        !dem.is_nodata(v)
    };

    let mut w = Array2::from_elem((rows, cols), f64::INFINITY);
    for row in 0..rows {
        for col in 0..cols {
            if !valid(row, col) {
                w[(row, col)] = f64::NAN;
                continue;
            }
            let on_edge = row == 0 || col == 0 || row + 1 == rows || col + 1 == cols;
            let near_void = (0..8).any(|idx| {
                neighbour(row, col, idx, rows, cols).is_some_and(|(r, c)| !valid(r, c))
            });
            if on_edge || near_void {
                w[(row, col)] = unsafe { dem.get_unchecked(row, col) };
            }
        }
    }

    let mut sweeps = 0usize;
    loop {
        sweeps += 1;
        let forward = sweeps % 2 == 1;
        let mut changed = false;
        for i in 0..rows {
            let row = if forward { i } else { rows - 1 - i };
            for j in 0..cols {
                let col = if forward { j } else { cols - 1 - j };
                changed |= lower_cell(dem, &mut w, row, col, epsilon);
            }
        }
        if !changed {
            break;
        }
    }
    debug!("fill_sinks converged after {} sweeps", sweeps);

    let mut output = dem.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = w;
    Ok(output)
}

/// One relaxation step of cell `(row, col)`; true when W changed.
#[inline]
fn lower_cell(dem: &Raster<f64>, w: &mut Array2<f64>, row: usize, col: usize, epsilon: f64) -> bool {
    let z = unsafe { dem.get_unchecked(row, col) };
    let current = w[(row, col)];
    if current.is_nan() || current <= z {
        return false;
    }

    let (rows, cols) = w.dim();
    let mut lowered = current;
    for (idx, dist) in DISTANCES.iter().enumerate() {
        let Some((nr, nc)) = neighbour(row, col, idx, rows, cols) else {
            continue;
        };
        let wn = w[(nr, nc)];
        if !wn.is_finite() {
            continue;
        }
        let spill = wn + epsilon * dist;
        if z >= spill {
            w[(row, col)] = z;
            return true;
        }
        if spill < lowered {
            lowered = spill;
        }
    }

    if lowered < current {
        w[(row, col)] = lowered;
        true
    } else {
        false
    }
}
