//! Slope from DEMs
//!
//! Horn (1981) third-order finite difference over the 3x3 window:
//!
//! ```text
//! a b c
//! d e f
//! g h i
//! ```
//!
//! dz/dx = ((c + 2f + i) - (a + 2d + g)) / (8 * dx)
//! dz/dy = ((g + 2h + i) - (a + 2b + c)) / (8 * dy)
//!
//! On lon/lat grids `dx` shrinks with the cosine of latitude, so spacing
//! is evaluated per row (see [`GridSpacing::Geographic`]).

use crate::maybe_rayon::*;
use ndarray::Array2;
use rusle_core::raster::Raster;
use rusle_core::{Algorithm, Error, Result};

/// Units for slope output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlopeUnits {
    #[default]
    Degrees,
    /// `100 * tan(slope)`
    Percent,
    Radians,
}

/// How cell size turns into ground distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridSpacing {
    /// Square cells of `cell_size * z_factor` in the elevation unit
    #[default]
    Planar,
    /// Lon/lat cells with elevations in metres. East-west and north-south
    /// spacing are taken on the WGS84 ellipsoid at each row's latitude.
    Geographic,
}

#[derive(Debug, Clone)]
pub struct SlopeParams {
    pub units: SlopeUnits,
    /// Multiplier turning the raster cell size into the elevation unit.
    /// Only used with [`GridSpacing::Planar`].
    pub z_factor: f64,
    pub spacing: GridSpacing,
}

impl Default for SlopeParams {
    fn default() -> Self {
        Self {
            units: SlopeUnits::Degrees,
            z_factor: 1.0,
            spacing: GridSpacing::Planar,
        }
    }
}

impl SlopeParams {
    pub fn percent() -> Self {
        Self {
            units: SlopeUnits::Percent,
            ..Self::default()
        }
    }

    pub fn geographic(units: SlopeUnits) -> Self {
        Self {
            units,
            spacing: GridSpacing::Geographic,
            ..Self::default()
        }
    }

    /// Planar for projected DEMs, geographic for lon/lat ones.
    pub fn for_dem(dem: &Raster<f64>, units: SlopeUnits) -> Self {
        if dem.crs().is_some_and(|c| c.is_geographic()) {
            Self::geographic(units)
        } else {
            Self {
                units,
                ..Self::default()
            }
        }
    }
}

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// East-west and north-south ground size (m) of a `d_lon` x `d_lat` degree
/// cell centred on `latitude_deg`.
pub fn ground_spacing(latitude_deg: f64, d_lon: f64, d_lat: f64) -> (f64, f64) {
    let e2 = 2.0 * WGS84_F - WGS84_F * WGS84_F;
    let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();
    let w = 1.0 - e2 * sin_lat * sin_lat;
    // prime vertical and meridian radii of curvature
    let n = WGS84_A / w.sqrt();
    let m = WGS84_A * (1.0 - e2) / w.powf(1.5);
    (
        (n * cos_lat * d_lon.to_radians()).abs(),
        (m * d_lat.to_radians()).abs(),
    )
}

#[derive(Debug, Clone, Default)]
pub struct Slope;

impl Algorithm for Slope {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = SlopeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Slope"
    }

    fn description(&self) -> &'static str {
        "Horn slope of a DEM"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        slope(&input, params)
    }
}

/// Slope of every interior cell; border cells and cells with a nodata
/// neighbour are NaN.
pub fn slope(dem: &Raster<f64>, params: SlopeParams) -> Result<Raster<f64>> {
    if !(params.z_factor > 0.0 && params.z_factor.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "z_factor",
            value: params.z_factor.to_string(),
            reason: "must be positive".into(),
        });
    }

    let (rows, cols) = dem.shape();
    let tf = dem.transform();
    let planar = dem.cell_size() * params.z_factor;

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            if row == 0 || row + 1 >= rows {
                return row_data;
            }
            let (dx, dy) = match params.spacing {
                GridSpacing::Planar => (planar, planar),
                GridSpacing::Geographic => {
                    let lat = tf.origin_y + (row as f64 + 0.5) * tf.pixel_height;
                    ground_spacing(lat, tf.pixel_width, tf.pixel_height)
                }
            };

            for col in 1..cols.saturating_sub(1) {
                let mut w = [0.0_f64; 9];
                let mut complete = true;
                for (k, v) in w.iter_mut().enumerate() {
                    let z = unsafe { dem.get_unchecked(row + k / 3 - 1, col + k % 3 - 1) };
                    if dem.is_nodata(z) {
                        complete = false;
                        break;
                    }
                    *v = z;
                }
                if !complete {
                    continue;
                }

                let [a, b, c, d, _, f, g, h, i] = w;
                let dz_dx = ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / (8.0 * dx);
                let dz_dy = ((g + 2.0 * h + i) - (a + 2.0 * b + c)) / (8.0 * dy);
                let rise = (dz_dx * dz_dx + dz_dy * dz_dy).sqrt();

                row_data[col] = match params.units {
                    SlopeUnits::Degrees => rise.atan().to_degrees(),
                    SlopeUnits::Percent => rise * 100.0,
                    SlopeUnits::Radians => rise.atan(),
                };
            }
            row_data
        })
        .collect();

    let mut output = dem.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), output_data)
        .map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}
