//! # RUSLE Algorithms
//!
//! Raster algorithms behind the five RUSLE factors.
//!
//! ## Categories
//!
//! - **terrain**: Horn slope
//! - **hydrology**: sink filling, D8 flow direction and accumulation
//! - **imagery**: NDVI, band math, code remapping, median composites
//! - **interpolation**: IDW
//! - **sampling**: point lattices, nearest-pixel and seeded random sampling
//! - **rusle**: R, K, LS, C and P models and the soil loss product

pub mod hydrology;
pub mod imagery;
pub mod interpolation;
pub(crate) mod maybe_rayon;
pub mod rusle;
pub mod sampling;
pub mod terrain;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::hydrology::{
        fill_sinks, flow_accumulation, flow_direction, FillSinks, FillSinksParams,
        FlowAccumulation, FlowDirection,
    };
    pub use crate::imagery::{
        band_math, band_math_n, median_composite, ndvi, normalized_difference, remap,
        RemapParams,
    };
    pub use crate::interpolation::{idw, IdwParams, SamplePoint};
    pub use crate::rusle::{
        c_factor, k_factor, k_factor_raster, ls_factor, ls_slope, p_factor, r_factor,
        segment_storms, soil_loss, CoverEquation, HourlySeries, LandCover, LsFormula, LsParams,
        RainfallParams, SlopeInput, SoilUnits, SupportTable, WilliamsParams,
    };
    pub use crate::sampling::{
        align_nearest, point_grid, random_sample, sample_at_points, Sample, SampleParams,
        SampleSet,
    };
    pub use crate::terrain::{slope, GridSpacing, Slope, SlopeParams, SlopeUnits};
    pub use rusle_core::prelude::*;
}
