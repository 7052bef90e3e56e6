//! RUSLE factor models
//!
//! Soil loss is estimated as `A = R * K * LS * C * P`:
//!
//! | factor | module | input |
//! |---|---|---|
//! | R | [`rainfall`] | hourly precipitation series |
//! | K | [`soil`] | sand, silt, clay and organic carbon grids |
//! | LS | [`slope_length`] | slope and flow accumulation grids |
//! | C | [`cover`] | NDVI grid |
//! | P | [`support`] | land-cover class grid |
//!
//! Each module exposes a scalar form (used on sample tables) and a raster
//! form built on it.

pub mod cover;
pub mod rainfall;
pub mod slope_length;
pub mod soil;
pub mod soil_loss;
pub mod support;

pub use cover::{c_factor, CoverEquation};
pub use rainfall::{r_factor, segment_storms, HourlySeries, RainfallParams, Storm};
pub use slope_length::{ls_factor, ls_slope, LsFormula, LsParams, SlopeClass, SlopeInput};
pub use soil::{k_factor, k_factor_raster, SoilUnits, WilliamsParams};
pub use soil_loss::soil_loss;
pub use support::{p_factor, LandCover, SupportTable};
