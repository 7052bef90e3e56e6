//! Seeded random draws of valid pixels
//!
//! Draws are reproducible for a given seed and returned in row-major order.

use super::{check_bands, values_at, NamedBand, Sample, SampleSet};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusle_core::Result;

#[derive(Debug, Clone)]
pub struct SampleParams {
    /// Upper bound on the number of samples
    pub num_pixels: usize,
    pub seed: u64,
}

impl Default for SampleParams {
    fn default() -> Self {
        Self {
            num_pixels: 5000,
            seed: 0,
        }
    }
}

/// Draw up to `num_pixels` distinct cells that are valid in every band.
///
/// The draw is reproducible for a given seed. Samples come out in
/// row-major order at cell centres.
pub fn random_sample(bands: &[NamedBand<'_>], params: SampleParams) -> Result<SampleSet> {
    check_bands(bands)?;
    let reference = bands[0].1;
    let (rows, cols) = reference.shape();

    let candidates: Vec<(usize, Vec<f64>)> = (0..rows * cols)
        .filter_map(|idx| values_at(bands, idx / cols, idx % cols).map(|v| (idx, v)))
        .collect();

    let amount = params.num_pixels.min(candidates.len());
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut picked = rand::seq::index::sample(&mut rng, candidates.len(), amount).into_vec();
    picked.sort_unstable();

    let mut candidates: Vec<Option<(usize, Vec<f64>)>> = candidates.into_iter().map(Some).collect();
    let samples = picked
        .into_iter()
        .filter_map(|i| candidates[i].take())
        .map(|(source, values)| {
            let (x, y) = reference.pixel_to_geo(source % cols, source / cols);
            Sample { source, x, y, values }
        })
        .collect();

    Ok(SampleSet {
        bands: bands.iter().map(|(name, _)| name.to_string()).collect(),
        samples,
    })
}
