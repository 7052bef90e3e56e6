//! D8 flow direction
//!
//! Each cell drains to the neighbour with the steepest drop
//! (O'Callaghan & Mark, 1984). Codes follow the layout in [`super::d8`]:
//! `1..=8` for a downslope neighbour, [`PIT`] where no neighbour is lower
//! and [`NO_FLOW`] on nodata cells.

use super::d8::{neighbour, DISTANCES, NO_FLOW, PIT};
use crate::maybe_rayon::*;
use ndarray::Array2;
use rusle_core::raster::Raster;
use rusle_core::{Algorithm, Error, Result};

#[derive(Debug, Clone, Default)]
pub struct FlowDirection;

impl Algorithm for FlowDirection {
    type Input = Raster<f64>;
    type Output = Raster<u8>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Flow Direction (D8)"
    }

    fn description(&self) -> &'static str {
        "Steepest-descent D8 flow direction of a filled DEM"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        flow_direction(&input)
    }
}

/// D8 flow direction of `dem`, ideally after [`super::fill_sinks`].
///
/// Edge cells only look at neighbours inside the grid; water leaving the
/// grid is not routed. Ties keep the first direction in code order.
pub fn flow_direction(dem: &Raster<f64>) -> Result<Raster<u8>> {
    let (rows, cols) = dem.shape();
    let cell_size = dem.cell_size();

    let codes: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_codes = vec![NO_FLOW; cols];
            for (col, code) in row_codes.iter_mut().enumerate() {
                let z = unsafe { dem.get_unchecked(row, col) };
                if dem.is_nodata(z) {
                    continue;
                }

                let mut steepest = 0.0_f64;
                let mut best = PIT;
                for (idx, dist) in DISTANCES.iter().enumerate() {
                    let Some((nr, nc)) = neighbour(row, col, idx, rows, cols) else {
                        continue;
                    };
                    let zn = unsafe { dem.get_unchecked(nr, nc) };
                    if dem.is_nodata(zn) {
                        continue;
                    }
                    let drop = (z - zn) / (dist * cell_size);
                    if drop > steepest {
                        steepest = drop;
                        best = (idx + 1) as u8;
                    }
                }
                *code = best;
            }
            row_codes
        })
        .collect();

    let mut output = dem.with_same_meta::<u8>(rows, cols);
    output.set_nodata(Some(NO_FLOW));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), codes)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusle_core::GeoTransform;

    fn dem_from(f: impl Fn(usize, usize) -> f64) -> Raster<f64> {
        let mut dem = Raster::new(5, 5);
        dem.set_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0));
        for row in 0..5 {
            for col in 0..5 {
                dem.set(row, col, f(row, col)).unwrap();
            }
        }
        dem
    }

    #[test]
    fn eastward_slope_flows_east() {
        let fdir = flow_direction(&dem_from(|_, c| (5 - c) as f64 * 10.0)).unwrap();
        assert_eq!(fdir.get(2, 2).unwrap(), 1);
    }

    #[test]
    fn southward_slope_flows_south() {
        let fdir = flow_direction(&dem_from(|r, _| (5 - r) as f64 * 10.0)).unwrap();
        assert_eq!(fdir.get(2, 2).unwrap(), 7);
    }

    #[test]
    fn diagonal_wins_when_steeper() {
        // Drop of 30 to the SE over sqrt(2) beats 10 to E or S.
        let fdir = flow_direction(&dem_from(|r, c| {
            if r == 3 && c == 3 {
                0.0
            } else {
                30.0 - 2.0 * (r + c) as f64
            }
        }))
        .unwrap();
        assert_eq!(fdir.get(2, 2).unwrap(), 8);
    }

    #[test]
    fn pit_and_nodata_codes() {
        let mut dem = dem_from(|r, c| {
            let dr = r as f64 - 2.0;
            let dc = c as f64 - 2.0;
            dr * dr + dc * dc
        });
        dem.set(0, 0, f64::NAN).unwrap();
        let fdir = flow_direction(&dem).unwrap();
        assert_eq!(fdir.get(2, 2).unwrap(), PIT);
        assert_eq!(fdir.get(0, 0).unwrap(), NO_FLOW);
        assert_eq!(fdir.nodata(), Some(NO_FLOW));
    }
}
