//! Annual soil loss `A = R * K * LS * C * P`

use crate::imagery::band_math_n;
use rusle_core::raster::Raster;
use rusle_core::Result;

/// Product of the five factor grids. Every grid must share the shape of
/// `r`; nodata in any factor gives NaN.
pub fn soil_loss(
    r: &Raster<f64>,
    k: &Raster<f64>,
    ls: &Raster<f64>,
    c: &Raster<f64>,
    p: &Raster<f64>,
) -> Result<Raster<f64>> {
    band_math_n(&[r, k, ls, c, p], |v| v.iter().product())
}
