//! D8 neighbourhood shared by the hydrology routines.
//!
//! Direction codes:
//! ```text
//!   4  3  2
//!   5  0  1
//!   6  7  8
//! ```

/// `(row, col)` offsets indexed by `code - 1` (1=E, 2=NE, ..., 8=SE).
pub(crate) const OFFSETS: [(isize, isize); 8] = [
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Distance to each neighbour in cell units.
pub(crate) const DISTANCES: [f64; 8] = [
    1.0,
    std::f64::consts::SQRT_2,
    1.0,
    std::f64::consts::SQRT_2,
    1.0,
    std::f64::consts::SQRT_2,
    1.0,
    std::f64::consts::SQRT_2,
];

/// Pit or flat cell: no downslope neighbour.
pub const PIT: u8 = 0;

/// Cell outside the DEM footprint (nodata elevation).
pub const NO_FLOW: u8 = 255;

/// Neighbour of `(row, col)` in direction index `idx`, if inside the grid.
#[inline]
pub(crate) fn neighbour(
    row: usize,
    col: usize,
    idx: usize,
    rows: usize,
    cols: usize,
) -> Option<(usize, usize)> {
    let (dr, dc) = OFFSETS[idx];
    let nr = row as isize + dr;
    let nc = col as isize + dc;
    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
        None
    } else {
        Some((nr as usize, nc as usize))
    }
}

/// Downstream cell of `(row, col)` for a direction code.
#[inline]
pub(crate) fn downstream(
    row: usize,
    col: usize,
    code: u8,
    rows: usize,
    cols: usize,
) -> Option<(usize, usize)> {
    match code {
        1..=8 => neighbour(row, col, (code - 1) as usize, rows, cols),
        _ => None,
    }
}
