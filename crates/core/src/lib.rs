//! # RUSLE Core
//!
//! Shared building blocks for the RUSLE factor workspace.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced 2D grid
//! - `GeoTransform`: affine pixel/geographic mapping
//! - `CRS`: coordinate reference system identifier
//! - `Region`: lon/lat study-area rectangle and raster clipping
//! - Native GeoTIFF reading and writing

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod region;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement, RasterStatistics};
pub use region::Region;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::region::Region;
    pub use crate::Algorithm;
}

/// A named raster transformation with typed parameters.
///
/// The terrain and hydrology steps behind the LS factor implement this.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Short display name
    fn name(&self) -> &'static str;

    /// One-line description
    fn description(&self) -> &'static str;

    /// Run the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Run with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
