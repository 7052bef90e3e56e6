//! Soil erodibility (K) from texture and organic carbon
//!
//! Williams (1995) EPIC equation:
//!
//! ```text
//! f_csand = 0.2 + 0.3 exp(-0.256 SAN (1 - SIL/100))
//! f_cl-si = (SIL / (CLA + SIL))^0.3
//! f_orgc  = 1 - 0.25 C / (C + exp(3.72 - 2.95 C))
//! f_hisand = 1 - 0.7 SN1 / (SN1 + exp(-5.51 + 22.9 SN1)),  SN1 = 1 - SAN/100
//! K = f_csand f_cl-si f_orgc f_hisand
//! ```
//!
//! with SAN, SIL, CLA and C in percent. K comes out in US customary units
//! (t ac h / (100 ac ft tonf in)); multiply by 0.1317 for
//! t ha h / (ha MJ mm).

use crate::imagery::band_math_n;
use rusle_core::raster::Raster;
use rusle_core::Result;

/// US customary to SI conversion of K
pub const K_US_TO_SI: f64 = 0.1317;

/// Divisors turning stored grid values into percent.
///
/// SoilGrids stores texture in g/kg and organic carbon in dg/kg.
#[derive(Debug, Clone, Copy)]
pub struct SoilUnits {
    pub texture_divisor: f64,
    pub soc_divisor: f64,
}

impl Default for SoilUnits {
    fn default() -> Self {
        Self {
            texture_divisor: 10.0,
            soc_divisor: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WilliamsParams {
    pub units: SoilUnits,
    /// Report K in SI units rather than US customary
    pub si_units: bool,
}

impl Default for WilliamsParams {
    fn default() -> Self {
        Self {
            units: SoilUnits::default(),
            si_units: true,
        }
    }
}

/// K for one location from raw grid values.
///
/// NaN when any input is NaN, percentages fall outside 0..=100, organic
/// carbon is negative or silt + clay is zero.
pub fn k_factor(sand: f64, silt: f64, clay: f64, soc: f64, params: &WilliamsParams) -> f64 {
    let san = sand / params.units.texture_divisor;
    let sil = silt / params.units.texture_divisor;
    let cla = clay / params.units.texture_divisor;
    let c = soc / params.units.soc_divisor;

    let pct = 0.0..=100.0;
    if !(pct.contains(&san) && pct.contains(&sil) && pct.contains(&cla)) || !(c >= 0.0) {
        return f64::NAN;
    }
    if sil + cla <= 0.0 {
        return f64::NAN;
    }

    let f_csand = 0.2 + 0.3 * (-0.256 * san * (1.0 - sil / 100.0)).exp();
    let f_clsi = (sil / (cla + sil)).powf(0.3);
    let f_orgc = 1.0 - 0.25 * c / (c + (3.72 - 2.95 * c).exp());
    let sn1 = 1.0 - san / 100.0;
    let f_hisand = 1.0 - 0.7 * sn1 / (sn1 + (-5.51 + 22.9 * sn1).exp());

    let k = f_csand * f_clsi * f_orgc * f_hisand;
    if params.si_units {
        k * K_US_TO_SI
    } else {
        k
    }
}

/// K over aligned sand, silt, clay and organic carbon grids.
pub fn k_factor_raster(
    sand: &Raster<f64>,
    silt: &Raster<f64>,
    clay: &Raster<f64>,
    soc: &Raster<f64>,
    params: &WilliamsParams,
) -> Result<Raster<f64>> {
    band_math_n(&[sand, silt, clay, soc], |v| {
        k_factor(v[0], v[1], v[2], v[3], params)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn us() -> WilliamsParams {
        WilliamsParams {
            si_units: false,
            ..WilliamsParams::default()
        }
    }

    #[test]
    fn loam_by_hand() {
        // 40 % sand, 40 % silt, 20 % clay, 1 % organic carbon
        let (san, sil, cla, c) = (40.0_f64, 40.0_f64, 20.0_f64, 1.0_f64);
        let f1 = 0.2 + 0.3 * (-0.256 * san * (1.0 - sil / 100.0)).exp();
        let f2 = (sil / (cla + sil)).powf(0.3);
        let f3 = 1.0 - 0.25 * c / (c + (3.72 - 2.95 * c).exp());
        let sn1 = 1.0 - san / 100.0;
        let f4 = 1.0 - 0.7 * sn1 / (sn1 + (-5.51 + 22.9 * sn1).exp());
        let expected = f1 * f2 * f3 * f4;

        // SoilGrids encoding: g/kg and dg/kg
        let k = k_factor(400.0, 400.0, 200.0, 100.0, &us());
        assert_relative_eq!(k, expected, epsilon = 1e-12);
        assert!(k > 0.1 && k < 0.5, "loam K {} out of the usual range", k);

        let k_si = k_factor(400.0, 400.0, 200.0, 100.0, &WilliamsParams::default());
        assert_relative_eq!(k_si, expected * K_US_TO_SI, epsilon = 1e-12);
    }

    #[test]
    fn more_carbon_lowers_k() {
        let low = k_factor(400.0, 400.0, 200.0, 50.0, &us());
        let high = k_factor(400.0, 400.0, 200.0, 400.0, &us());
        assert!(high < low);
    }

    #[test]
    fn invalid_inputs_are_nan() {
        let p = us();
        assert!(k_factor(f64::NAN, 400.0, 200.0, 100.0, &p).is_nan());
        assert!(k_factor(1000.0, 0.0, 0.0, 100.0, &p).is_nan());
        assert!(k_factor(400.0, 400.0, 200.0, -1.0, &p).is_nan());
        assert!(k_factor(1200.0, 400.0, 200.0, 100.0, &p).is_nan());
    }

    #[test]
    fn raster_matches_scalar() {
        let sand = Raster::filled(2, 2, 400.0);
        let silt = Raster::filled(2, 2, 400.0);
        let clay = Raster::filled(2, 2, 200.0);
        let mut soc = Raster::filled(2, 2, 100.0);
        soc.set(1, 1, f64::NAN).unwrap();
        let p = WilliamsParams::default();
        let k = k_factor_raster(&sand, &silt, &clay, &soc, &p).unwrap();
        assert_relative_eq!(k.get(0, 0).unwrap(), k_factor(400.0, 400.0, 200.0, 100.0, &p));
        assert!(k.get(1, 1).unwrap().is_nan());
    }
}
