//! Terrain derivatives of DEMs

mod slope;

pub use slope::{ground_spacing, slope, GridSpacing, Slope, SlopeParams, SlopeUnits};
