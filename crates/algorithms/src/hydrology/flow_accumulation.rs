//! D8 flow accumulation
//!
//! Counts the cells draining through each cell by walking the flow graph
//! in topological order (Kahn's algorithm on in-degrees), so every cell is
//! visited once regardless of grid orientation.

use super::d8::{downstream, NO_FLOW};
use ndarray::Array2;
use rusle_core::raster::Raster;
use rusle_core::{Algorithm, Error, Result};

#[derive(Debug, Clone, Default)]
pub struct FlowAccumulation;

impl Algorithm for FlowAccumulation {
    type Input = Raster<u8>;
    type Output = Raster<f64>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Flow Accumulation"
    }

    fn description(&self) -> &'static str {
        "Upstream cell count from D8 flow direction"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        flow_accumulation(&input)
    }
}

/// Number of upstream cells draining into each cell, excluding the cell
/// itself. Headwater cells are 0, [`NO_FLOW`] cells are NaN.
pub fn flow_accumulation(flow_dir: &Raster<u8>) -> Result<Raster<f64>> {
    let (rows, cols) = flow_dir.shape();
    let code_at = |r: usize, c: usize| unsafe { flow_dir.get_unchecked(r, c) };

    let mut in_degree = Array2::<u32>::zeros((rows, cols));
    for row in 0..rows {
        for col in 0..cols {
            if let Some(next) = downstream(row, col, code_at(row, col), rows, cols) {
                in_degree[next] += 1;
            }
        }
    }

    let mut acc = Array2::<f64>::zeros((rows, cols));
    let mut stack: Vec<(usize, usize)> = in_degree
        .indexed_iter()
        .filter(|&(_, &n)| n == 0)
        .map(|(idx, _)| idx)
        .collect();

    while let Some((row, col)) = stack.pop() {
        let Some(next) = downstream(row, col, code_at(row, col), rows, cols) else {
            continue;
        };
        acc[next] += acc[(row, col)] + 1.0;
        in_degree[next] -= 1;
        if in_degree[next] == 0 {
            stack.push(next);
        }
    }

    for ((row, col), value) in acc.indexed_iter_mut() {
        if code_at(row, col) == NO_FLOW {
            *value = f64::NAN;
        }
    }

    let mut output = flow_dir.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = acc;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrology::d8::PIT;

    fn directions(codes: Vec<u8>, rows: usize, cols: usize) -> Raster<u8> {
        Raster::from_vec(codes, rows, cols).unwrap()
    }

    #[test]
    fn row_flowing_east_counts_upstream_cells() {
        let fdir = directions(vec![1, 1, 1, 1, PIT], 1, 5);
        let acc = flow_accumulation(&fdir).unwrap();
        let got: Vec<f64> = acc.data().iter().copied().collect();
        assert_eq!(got, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn converging_branches_add_up() {
        // Two columns drain south into row 2, which drains east.
        #[rustfmt::skip]
        let fdir = directions(vec![
            7, 7, PIT,
            7, 7, PIT,
            1, 1, PIT,
        ], 3, 3);
        let acc = flow_accumulation(&fdir).unwrap();
        assert_eq!(acc.get(2, 0).unwrap(), 2.0);
        assert_eq!(acc.get(2, 1).unwrap(), 5.0);
        assert_eq!(acc.get(2, 2).unwrap(), 6.0);
        assert_eq!(acc.get(0, 2).unwrap(), 0.0);
    }

    #[test]
    fn no_flow_cells_are_nan() {
        let fdir = directions(vec![NO_FLOW, 1, PIT], 1, 3);
        let acc = flow_accumulation(&fdir).unwrap();
        assert!(acc.get(0, 0).unwrap().is_nan());
        assert_eq!(acc.get(0, 2).unwrap(), 1.0);
    }
}
