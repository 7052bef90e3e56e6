use super::{finish, image_task, log_range, table_task, Factor, JobSummary};
use crate::config::RusleConfig;
use crate::table::Table;
use anyhow::{Context, Result};
use rusle_algorithms::rusle::{k_factor, k_factor_raster};
use rusle_algorithms::sampling::random_sample;
use rusle_core::io::read_geotiff;
use rusle_core::region::clip;
use rusle_core::{Raster, Region};
use std::path::{Path, PathBuf};
use tracing::info;

/// Topsoil grids in SoilGrids units (g/kg texture, dg/kg organic carbon)
#[derive(Debug, Clone)]
pub struct SoilGrids {
    pub sand: PathBuf,
    pub silt: PathBuf,
    pub clay: PathBuf,
    pub soc: PathBuf,
}

fn load_clipped(path: &Path, region: &Region) -> Result<Raster<f64>> {
    let raster: Raster<f64> =
        read_geotiff(path).with_context(|| format!("Failed to read {}", path.display()))?;
    clip(&raster, region).with_context(|| format!("Failed to clip {}", path.display()))
}

/// K factor from sand, silt, clay and organic carbon grids.
pub fn k_factor_job(
    config: &RusleConfig,
    grids: &SoilGrids,
    output_dir: &Path,
) -> Result<JobSummary> {
    let sc = &config.soil;
    let sand = load_clipped(&grids.sand, &config.region)?;
    let silt = load_clipped(&grids.silt, &config.region)?;
    let clay = load_clipped(&grids.clay, &config.region)?;
    let soc = load_clipped(&grids.soc, &config.region)?;
    let (rows, cols) = sand.shape();
    info!("Soil grids clipped to {} x {}", cols, rows);

    let params = sc.williams_params();
    let k = k_factor_raster(&sand, &silt, &clay, &soc, &params)?;
    let range = log_range("K factor", &k);

    let mut samples = random_sample(
        &[
            (sc.bands[0].as_str(), &sand),
            (sc.bands[1].as_str(), &silt),
            (sc.bands[2].as_str(), &clay),
            (sc.bands[3].as_str(), &soc),
        ],
        sc.export.sample_params(),
    )?;
    samples.push_band("K_Factor", |v| k_factor(v[0], v[1], v[2], v[3], &params));
    info!("Sampled {} soil locations", samples.len());

    let tasks = vec![
        table_task(&sc.export, "", "", Table::from_samples(&samples)),
        image_task(&sc.k_export, "_raster", "_Raster_GeoTIFF", k)?,
    ];
    finish(Factor::K, range, output_dir, tasks)
}
