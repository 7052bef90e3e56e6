use super::{finish, image_task, log_range, table_task, Factor, JobSummary};
use crate::config::RusleConfig;
use crate::table::Table;
use anyhow::{Context, Result};
use rusle_algorithms::rusle::p_factor;
use rusle_algorithms::sampling::random_sample;
use rusle_catalog::{parse_date, CatalogError, ImageCollection};
use rusle_core::region::clip;
use std::path::Path;
use tracing::info;

/// P factor from a catalog of yearly land-cover maps.
pub fn p_factor_job(config: &RusleConfig, catalog: &Path, output_dir: &Path) -> Result<JobSummary> {
    let pc = &config.support;
    let (start, end) = pc.period();
    let collection = ImageCollection::from_file(catalog)
        .with_context(|| format!("Failed to load catalog {}", catalog.display()))?
        .filter_bounds(&config.region)
        .filter_date(parse_date(&start)?, parse_date(&end)?)
        .sort_by_datetime();
    let item = collection
        .first()
        .ok_or_else(|| CatalogError::EmptyCollection(collection.name().to_string()))?;
    info!("Land cover {}: {}", pc.year, item.id);

    let lulc = collection.load_band(item, &pc.band)?;
    let lulc = clip(&lulc, &config.region).context("Failed to clip land cover to the region")?;

    let table = pc.support_table()?;
    let p = p_factor(&lulc, &table)?;
    let range = log_range("P factor", &p);

    let samples = random_sample(&[("P_Factor", &p)], pc.export.sample_params())?;
    info!("Sampled {} P cells", samples.len());

    let tasks = vec![
        image_task(&pc.export, "_raster", "_Raster_GeoTIFF", p)?,
        table_task(&pc.export, "_sampled", "_Sampled_CSV", Table::from_samples(&samples)),
    ];
    finish(Factor::P, range, output_dir, tasks)
}
