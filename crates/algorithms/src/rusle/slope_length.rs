//! Slope length and steepness (LS)
//!
//! `L = (λ / 22.13)^m` with the slope length λ approximated by the upslope
//! contributing length `A * cell_size`, where `A` counts the contributing
//! cells including the cell itself. The exponent `m` (and the steepness
//! exponent `n`) depends on the slope class of the cell.
//!
//! Slope classes and the percent-sine steepness read the slope grid in its
//! [`SlopeInput`] unit. With [`SlopeInput::DegreesX100`] that is slope in
//! degrees times 100, the grid a `Terrain.slope(dem) * 100` expression
//! produces.

use crate::imagery::{band_math, band_math_n};
use crate::terrain::{slope, SlopeParams, SlopeUnits};
use rusle_core::raster::Raster;
use rusle_core::{Error, Result};

/// Length of the RUSLE unit plot (m)
pub const UNIT_PLOT_LENGTH: f64 = 22.13;

/// Sine of the 9 % unit plot slope
pub const UNIT_PLOT_SINE: f64 = 0.0896;

/// Unit of the slope grid fed to [`ls_factor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlopeInput {
    /// Slope angle in degrees, multiplied by 100
    #[default]
    DegreesX100,
    /// `100 * tan(β)`
    Percent,
}

impl SlopeInput {
    /// Slope angle β (radians) of a value in this unit
    pub fn angle(self, value: f64) -> f64 {
        match self {
            SlopeInput::DegreesX100 => (value / 100.0).to_radians(),
            SlopeInput::Percent => (value / 100.0).atan(),
        }
    }
}

/// Slope grid of `dem` in the `input` unit, with per-row ground spacing on
/// lon/lat DEMs.
pub fn ls_slope(dem: &Raster<f64>, input: SlopeInput) -> Result<Raster<f64>> {
    match input {
        SlopeInput::Percent => slope(dem, SlopeParams::for_dem(dem, SlopeUnits::Percent)),
        SlopeInput::DegreesX100 => {
            let degrees = slope(dem, SlopeParams::for_dem(dem, SlopeUnits::Degrees))?;
            band_math(&degrees, |v| v * 100.0)
        }
    }
}

/// Slope classes by slope value, bounds at 1, 3 and 5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeClass {
    /// below 1; also used where slope is undefined
    Gentle,
    /// 1 to 3 inclusive
    Moderate,
    /// above 3 up to 5
    Strong,
    /// above 5
    Steep,
}

impl SlopeClass {
    pub fn of(slope: f64) -> Self {
        if slope > 5.0 {
            SlopeClass::Steep
        } else if slope > 3.0 {
            SlopeClass::Strong
        } else if slope >= 1.0 {
            SlopeClass::Moderate
        } else {
            // NaN falls through every comparison
            SlopeClass::Gentle
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// How steepness enters the LS product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LsFormula {
    /// `sin(slope / 9)^n`, the slope value over 9 taken as radians
    #[default]
    PercentSine,
    /// `(sin β / 0.0896)^n` (Moore & Burch, 1986)
    MooreBurch,
}

#[derive(Debug, Clone)]
pub struct LsParams {
    /// Slope-length exponent per [`SlopeClass`]
    pub m: [f64; 4],
    /// Steepness exponent per [`SlopeClass`]
    pub n: [f64; 4],
    /// Ground size of one cell (m)
    pub cell_size: f64,
    pub formula: LsFormula,
    pub slope_input: SlopeInput,
}

impl Default for LsParams {
    fn default() -> Self {
        Self {
            m: [0.2, 0.3, 0.4, 0.5],
            n: [1.0, 1.0, 1.0, 1.0],
            cell_size: 30.0,
            formula: LsFormula::PercentSine,
            slope_input: SlopeInput::DegreesX100,
        }
    }
}

impl LsParams {
    /// LS for one cell from its slope (in `slope_input` units) and
    /// upstream cell count.
    pub fn evaluate(&self, slope: f64, flow_acc: f64) -> f64 {
        if slope.is_nan() || flow_acc.is_nan() {
            return f64::NAN;
        }
        let class = SlopeClass::of(slope).index();
        let length = (flow_acc + 1.0) * self.cell_size / UNIT_PLOT_LENGTH;
        let steepness = match self.formula {
            LsFormula::PercentSine => (slope / 9.0).sin(),
            LsFormula::MooreBurch => self.slope_input.angle(slope).sin() / UNIT_PLOT_SINE,
        };
        length.powf(self.m[class]) * steepness.powf(self.n[class])
    }
}

/// LS grid from the slope grid (see [`ls_slope`]) and D8 flow
/// accumulation of the same DEM.
pub fn ls_factor(
    slope: &Raster<f64>,
    flow_acc: &Raster<f64>,
    params: &LsParams,
) -> Result<Raster<f64>> {
    if !(params.cell_size > 0.0) {
        return Err(Error::InvalidParameter {
            name: "cell_size",
            value: params.cell_size.to_string(),
            reason: "must be positive".into(),
        });
    }
    band_math_n(&[slope, flow_acc], |v| params.evaluate(v[0], v[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn class_boundaries() {
        assert_eq!(SlopeClass::of(0.99), SlopeClass::Gentle);
        assert_eq!(SlopeClass::of(1.0), SlopeClass::Moderate);
        assert_eq!(SlopeClass::of(3.0), SlopeClass::Moderate);
        assert_eq!(SlopeClass::of(3.01), SlopeClass::Strong);
        assert_eq!(SlopeClass::of(5.0), SlopeClass::Strong);
        assert_eq!(SlopeClass::of(5.01), SlopeClass::Steep);
        assert_eq!(SlopeClass::of(f64::NAN), SlopeClass::Gentle);
    }

    #[test]
    fn percent_sine_default() {
        let p = LsParams::default();
        // 4 % slope (class Strong, m = 0.4), 9 upstream cells
        let expected = (10.0 * 30.0 / 22.13_f64).powf(0.4) * (4.0_f64 / 9.0).sin();
        assert_relative_eq!(p.evaluate(4.0, 9.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn moore_burch_at_unit_plot_is_one() {
        let p = LsParams {
            formula: LsFormula::MooreBurch,
            cell_size: 22.13,
            slope_input: SlopeInput::Percent,
            ..LsParams::default()
        };
        // 9 % slope on a single-cell 22.13 m plot
        let ls = p.evaluate(9.0, 0.0);
        assert_relative_eq!(ls, 9.0_f64.atan2(100.0).sin() / UNIT_PLOT_SINE, epsilon = 1e-12);
        assert!((ls - 1.0).abs() < 0.01);
    }

    #[test]
    fn moore_burch_reads_degrees_x100() {
        let p = LsParams {
            formula: LsFormula::MooreBurch,
            cell_size: 22.13,
            ..LsParams::default()
        };
        // 5.14° is a 9 % slope
        let beta = 9.0_f64.atan2(100.0);
        let ls = p.evaluate(beta.to_degrees() * 100.0, 0.0);
        assert_relative_eq!(ls, beta.sin() / UNIT_PLOT_SINE, epsilon = 1e-12);
    }

    /// A 1° plane is class Steep with `sin(100 / 9)` in degree units, but
    /// class Moderate with `sin(1.75 / 9)` in true percent.
    #[test]
    fn slope_grid_units() {
        let cell = 10.0;
        let rise = 1.0_f64.to_radians().tan() * cell;
        let mut dem = Raster::new(5, 5);
        dem.set_transform(rusle_core::GeoTransform::new(0.0, 50.0, cell, -cell));
        for row in 0..5 {
            for col in 0..5 {
                dem.set(row, col, rise * col as f64).unwrap();
            }
        }

        let deg = ls_slope(&dem, SlopeInput::DegreesX100).unwrap();
        let pct = ls_slope(&dem, SlopeInput::Percent).unwrap();
        let s_deg = deg.get(2, 2).unwrap();
        let s_pct = pct.get(2, 2).unwrap();
        assert_relative_eq!(s_deg, 100.0, epsilon = 1e-9);
        assert_relative_eq!(s_pct, 100.0 * 1.0_f64.to_radians().tan(), epsilon = 1e-9);
        assert_eq!(SlopeClass::of(s_deg), SlopeClass::Steep);
        assert_eq!(SlopeClass::of(s_pct), SlopeClass::Moderate);

        let p = LsParams::default();
        let expected = (30.0 / 22.13_f64).powf(0.5) * (100.0_f64 / 9.0).sin();
        assert_relative_eq!(p.evaluate(s_deg, 0.0), expected, epsilon = 1e-9);
        assert!(deg.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn nan_inputs_propagate() {
        let p = LsParams::default();
        assert!(p.evaluate(f64::NAN, 3.0).is_nan());
        assert!(p.evaluate(2.0, f64::NAN).is_nan());
    }

    #[test]
    fn raster_form() {
        let slope = Raster::filled(3, 3, 2.0);
        let acc = Raster::filled(3, 3, 0.0);
        let ls = ls_factor(&slope, &acc, &LsParams::default()).unwrap();
        let expected = (30.0 / 22.13_f64).powf(0.3) * (2.0_f64 / 9.0).sin();
        assert_relative_eq!(ls.get(1, 1).unwrap(), expected, epsilon = 1e-12);

        let bad = LsParams { cell_size: 0.0, ..LsParams::default() };
        assert!(ls_factor(&slope, &acc, &bad).is_err());
    }
}
