use super::{finish, image_task, log_range, table_task, Factor, JobSummary};
use crate::config::RusleConfig;
use crate::table::Table;
use anyhow::{Context, Result};
use rusle_algorithms::imagery::{median_composite, ndvi};
use rusle_algorithms::rusle::c_factor;
use rusle_algorithms::sampling::random_sample;
use rusle_catalog::{parse_date, ImageCollection};
use rusle_core::region::clip;
use std::path::Path;
use tracing::info;

/// C factor from a catalog of Sentinel-2 surface reflectance scenes.
pub fn c_factor_job(config: &RusleConfig, catalog: &Path, output_dir: &Path) -> Result<JobSummary> {
    let cc = &config.cover;
    let collection = ImageCollection::from_file(catalog)
        .with_context(|| format!("Failed to load catalog {}", catalog.display()))?
        .filter_bounds(&config.region)
        .filter_date(parse_date(&cc.start)?, parse_date(&cc.end)?)
        .filter_lt(&cc.cloud_property, cc.cloud_threshold)
        .require_non_empty()?;
    info!(
        "{}: {} scenes with {} < {}",
        collection.name(),
        collection.len(),
        cc.cloud_property,
        cc.cloud_threshold
    );

    let nir = median_composite(&collection.load_all(&cc.nir_band)?)?;
    let red = median_composite(&collection.load_all(&cc.red_band)?)?;
    let nir = clip(&nir, &config.region).context("Failed to clip composite to the region")?;
    let red = clip(&red, &config.region).context("Failed to clip composite to the region")?;

    let index = ndvi(&nir, &red)?;
    log_range("NDVI", &index);

    let equation = cc.cover_equation();
    info!("{}", equation.describe());
    let c = c_factor(&index, &equation)?;
    let range = log_range("C factor", &c);

    let samples = random_sample(&[("C_Factor", &c)], cc.export.sample_params())?;
    info!("Sampled {} C cells", samples.len());

    let tasks = vec![
        image_task(&cc.export, "_raster", "_Raster_GeoTIFF", c)?,
        table_task(&cc.export, "_sampled", "_Sampled_CSV", Table::from_samples(&samples)),
    ];
    finish(Factor::C, range, output_dir, tasks)
}
