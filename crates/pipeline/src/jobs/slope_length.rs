use super::{finish, image_task, log_range, table_task, Factor, JobSummary};
use crate::config::RusleConfig;
use crate::table::Table;
use anyhow::{Context, Result};
use rusle_algorithms::hydrology::{
    fill_sinks, flow_accumulation, flow_direction, FillSinksParams,
};
use rusle_algorithms::rusle::{ls_factor, ls_slope};
use rusle_algorithms::sampling::random_sample;
use rusle_core::io::read_geotiff;
use rusle_core::region::clip;
use rusle_core::Raster;
use std::path::Path;
use tracing::{debug, info};

/// LS factor from a DEM.
///
/// Flow routing runs on the sink-filled DEM, slope on the DEM as read.
/// Both use the full input extent; the LS grid is clipped afterwards.
pub fn ls_factor_job(
    config: &RusleConfig,
    dem_path: &Path,
    output_dir: &Path,
) -> Result<JobSummary> {
    let lc = &config.slope_length;
    let dem: Raster<f64> = read_geotiff(dem_path)
        .with_context(|| format!("Failed to read DEM {}", dem_path.display()))?;
    let (rows, cols) = dem.shape();
    info!("DEM: {} x {}, cell size {}", cols, rows, dem.cell_size());

    let filled = fill_sinks(
        &dem,
        FillSinksParams {
            min_slope: lc.fill_min_slope,
        },
    )?;
    let directions = flow_direction(&filled)?;
    let accumulation = flow_accumulation(&directions)?;
    debug!("Flow accumulation done");

    let params = lc.ls_params();
    let slope_grid = ls_slope(&dem, params.slope_input)?;
    debug!("Slope input: {:?}", params.slope_input);

    let ls = ls_factor(&slope_grid, &accumulation, &params)?;
    let ls = clip(&ls, &config.region).context("Failed to clip LS to the region")?;
    let range = log_range("LS factor", &ls);

    let samples = random_sample(&[("LS_Factor", &ls)], lc.export.sample_params())?;
    info!("Sampled {} LS cells", samples.len());

    let tasks = vec![
        table_task(&lc.export, "", "", Table::from_samples(&samples)),
        image_task(&lc.export, "_raster", "_Raster_GeoTIFF", ls)?,
    ];
    finish(Factor::LS, range, output_dir, tasks)
}
