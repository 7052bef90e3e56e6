//! Pixel-wise operations on imagery and thematic rasters
//!
//! - Normalized difference and NDVI
//! - Band math over one or many aligned rasters
//! - Exact-code remapping
//! - Per-pixel median compositing of scene stacks

mod band_math;
mod composite;
mod indices;
mod reclassify;

pub use band_math::{band_math, band_math_n};
pub use composite::median_composite;
pub use indices::{ndvi, normalized_difference};
pub use reclassify::{remap, RemapParams};

use rusle_core::raster::Raster;
use rusle_core::Result;

pub(crate) fn check_dimensions(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
    a.ensure_same_shape(b)
}

/// Wrap row-major `data` in a raster carrying the georeferencing of
/// `template`, with NaN as nodata.
pub(crate) fn build_output(template: &Raster<f64>, data: Vec<f64>) -> Result<Raster<f64>> {
    template.derive_f64(data)
}
