use super::{finish, image_task, log_range, table_task, Factor, JobSummary};
use crate::config::RusleConfig;
use crate::table::Table;
use anyhow::{bail, Context, Result};
use rusle_algorithms::interpolation::{idw, IdwParams, SamplePoint};
use rusle_algorithms::rusle::{r_factor, HourlySeries};
use rusle_algorithms::sampling::{point_grid, sample_at_points};
use rusle_catalog::{parse_date, ImageCollection};
use std::path::Path;
use tracing::{debug, info};

/// R factor from a catalog of hourly precipitation rasters.
///
/// Writes the hourly time series sampled on the point lattice, the R value
/// of every point and an interpolated R grid. The grid spans the rainfall
/// region and the study region so soil loss has R wherever the other
/// factors are defined.
pub fn r_factor_job(config: &RusleConfig, catalog: &Path, output_dir: &Path) -> Result<JobSummary> {
    let rc = &config.rainfall;
    let start = parse_date(&rc.start)?;
    let end = parse_date(&rc.end)?;

    let collection = ImageCollection::from_file(catalog)
        .with_context(|| format!("Failed to load catalog {}", catalog.display()))?
        .filter_bounds(&rc.region)
        .filter_date(start, end)
        .sort_by_datetime()
        .require_non_empty()?;
    info!(
        "{}: {} hourly images between {} and {}",
        collection.name(),
        collection.len(),
        rc.start,
        rc.end
    );

    let points = point_grid(&rc.region, rc.grid_step)?;
    info!("Sampling {} points every {}°", points.len(), rc.grid_step);

    let series = collection.load_series(&rc.band)?;
    let mut hourly = Table::new([rc.band.as_str(), "date", "longitude", "latitude"]);
    // Tiles sharing an hour are mosaicked; the series is sorted so they are
    // adjacent.
    let mut timestamps = Vec::with_capacity(series.len());
    let mut hour_of = Vec::with_capacity(series.len());
    for (time, _) in &series {
        if timestamps.last() != Some(time) {
            timestamps.push(*time);
        }
        hour_of.push(timestamps.len() - 1);
    }
    if timestamps.len() < series.len() {
        debug!("Merged {} images into {} hours", series.len(), timestamps.len());
    }
    // depths[point][hour], NaN where the point was not sampled
    let mut depths = vec![vec![f64::NAN; timestamps.len()]; points.len()];

    for ((time, raster), &hour) in series.iter().zip(&hour_of) {
        let sampled = sample_at_points(&[(rc.band.as_str(), raster)], &points)?;
        let date = time.format(&rc.date_format).to_string();
        for s in &sampled.samples {
            let slot = &mut depths[s.source][hour];
            // first tile covering the point wins
            if !slot.is_nan() {
                continue;
            }
            *slot = s.values[0];
            hourly.push_row(vec![
                s.values[0].to_string(),
                date.clone(),
                s.x.to_string(),
                s.y.to_string(),
            ])?;
        }
    }
    debug!("{} hourly rows", hourly.len());

    let params = rc.storm_params();
    let mut r_table = Table::new(["R_Factor", "longitude", "latitude"]);
    let mut r_points = Vec::with_capacity(points.len());
    for (&(x, y), d) in points.iter().zip(&depths) {
        if d.iter().all(|v| v.is_nan()) {
            continue;
        }
        let record = HourlySeries::from_metres(timestamps.clone(), d)?;
        let r = r_factor(&record, &params);
        r_table.push_row(vec![r.to_string(), x.to_string(), y.to_string()])?;
        r_points.push(SamplePoint::new(x, y, r));
    }
    if r_points.is_empty() {
        bail!("No precipitation samples fall inside the rainfall region");
    }

    let extent = rc.region.union(&config.region);
    let grid = IdwParams {
        power: rc.idw_power,
        ..IdwParams::over_region(&extent, rc.idw_cell_size)?
    };
    let r_grid = idw(&r_points, grid)?;
    let range = log_range("R factor", &r_grid);

    let tasks = vec![
        table_task(&rc.export, "", "", hourly),
        table_task(&rc.r_export, "_points", "_Points_CSV", r_table),
        image_task(&rc.r_export, "_raster", "_Raster_GeoTIFF", r_grid)?,
    ];
    finish(Factor::R, range, output_dir, tasks)
}
