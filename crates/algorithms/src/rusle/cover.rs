//! Cover-management factor (C) from NDVI

use crate::imagery::band_math;
use rusle_core::raster::Raster;
use rusle_core::Result;

/// NDVI to C transfer function
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoverEquation {
    /// `C = c_max * exp(-alpha * NDVI)`
    ExpNdvi { alpha: f64, c_max: f64 },
}

impl Default for CoverEquation {
    fn default() -> Self {
        CoverEquation::ExpNdvi {
            alpha: 2.0,
            c_max: 1.0,
        }
    }
}

impl CoverEquation {
    pub fn evaluate(&self, ndvi: f64) -> f64 {
        match *self {
            CoverEquation::ExpNdvi { alpha, c_max } => c_max * (-alpha * ndvi).exp(),
        }
    }

    /// Human-readable form, for logs
    pub fn describe(&self) -> String {
        match self {
            CoverEquation::ExpNdvi { alpha, c_max } => {
                format!("C = C_max * exp(-alpha * NDVI), alpha={}, C_max={}", alpha, c_max)
            }
        }
    }
}

/// C grid from an NDVI grid
pub fn c_factor(ndvi: &Raster<f64>, equation: &CoverEquation) -> Result<Raster<f64>> {
    band_math(ndvi, |v| equation.evaluate(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bare_and_vegetated() {
        let eq = CoverEquation::default();
        assert_eq!(eq.evaluate(0.0), 1.0);
        assert_relative_eq!(eq.evaluate(0.8), (-1.6_f64).exp(), epsilon = 1e-12);
        assert!(eq.evaluate(-0.2) > 1.0);
    }

    #[test]
    fn raster_keeps_nodata() {
        let mut ndvi = Raster::filled(2, 2, 0.5);
        ndvi.set(0, 0, f64::NAN).unwrap();
        let c = c_factor(&ndvi, &CoverEquation::ExpNdvi { alpha: 1.0, c_max: 0.5 }).unwrap();
        assert!(c.get(0, 0).unwrap().is_nan());
        assert_relative_eq!(c.get(1, 1).unwrap(), 0.5 * (-0.5_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn description_names_parameters() {
        assert!(CoverEquation::default().describe().contains("alpha=2"));
    }
}
