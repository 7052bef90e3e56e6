//! Point sampling of aligned rasters
//!
//! - [`point_grid`]: regular lon/lat lattice over a region
//! - [`sample_at_points`]: nearest-pixel values at given coordinates
//! - [`random_sample`]: seeded random draw of valid pixels
//! - [`align_nearest`]: nearest-cell resampling onto another grid
//!
//! Results are [`SampleSet`]s: one named column per band plus the
//! coordinates of each sample, ready to be written as a table.

mod align;
mod grid;
mod random;

pub use align::align_nearest;
pub use grid::{point_grid, sample_at_points};
pub use random::{random_sample, SampleParams};

use rusle_core::raster::Raster;
use rusle_core::{Error, Result};

/// One sampled location
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Index of the input point, or row-major cell index for pixel draws
    pub source: usize,
    pub x: f64,
    pub y: f64,
    /// One value per band, in [`SampleSet::bands`] order
    pub values: Vec<f64>,
}

/// Samples sharing a band layout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    pub bands: Vec<String>,
    pub samples: Vec<Sample>,
}

impl SampleSet {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Position of `band` in the value vectors
    pub fn band_index(&self, band: &str) -> Option<usize> {
        self.bands.iter().position(|b| b == band)
    }

    /// All values of `band`, in sample order
    pub fn column(&self, band: &str) -> Option<Vec<f64>> {
        let idx = self.band_index(band)?;
        Some(self.samples.iter().map(|s| s.values[idx]).collect())
    }

    /// Add a derived band computed from each sample's existing values.
    pub fn push_band<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[f64]) -> f64,
    {
        for sample in &mut self.samples {
            let v = f(&sample.values);
            sample.values.push(v);
        }
        self.bands.push(name.into());
    }
}

/// A raster with the column name it is sampled under
pub type NamedBand<'a> = (&'a str, &'a Raster<f64>);

fn check_bands(bands: &[NamedBand<'_>]) -> Result<()> {
    let Some((_, first)) = bands.first() else {
        return Err(Error::Algorithm("sampling needs at least one band".into()));
    };
    for (_, band) in &bands[1..] {
        first.ensure_same_shape(band)?;
    }
    Ok(())
}

/// Values of every band at `(row, col)`, `None` if any is nodata.
fn values_at(bands: &[NamedBand<'_>], row: usize, col: usize) -> Option<Vec<f64>> {
    bands
        .iter()
        .map(|(_, r)| {
            let v = unsafe { r.get_unchecked(row, col) };
            (!r.is_nodata(v)).then_some(v)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_band_is_appended() {
        let mut set = SampleSet {
            bands: vec!["a".into(), "b".into()],
            samples: vec![
                Sample { source: 0, x: 0.0, y: 0.0, values: vec![1.0, 2.0] },
                Sample { source: 1, x: 1.0, y: 0.0, values: vec![3.0, 4.0] },
            ],
        };
        set.push_band("sum", |v| v[0] + v[1]);
        assert_eq!(set.bands, vec!["a", "b", "sum"]);
        assert_eq!(set.column("sum"), Some(vec![3.0, 7.0]));
        assert_eq!(set.column("c"), None);
    }
}
