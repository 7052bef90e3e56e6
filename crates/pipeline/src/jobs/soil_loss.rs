use super::{finish, image_task, log_range, Factor, JobSummary};
use crate::config::RusleConfig;
use anyhow::{Context, Result};
use rusle_algorithms::rusle::soil_loss;
use rusle_algorithms::sampling::align_nearest;
use rusle_core::io::read_geotiff;
use rusle_core::Raster;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Factor grids to multiply into soil loss
#[derive(Debug, Clone)]
pub struct FactorRasters {
    pub r: PathBuf,
    pub k: PathBuf,
    pub ls: PathBuf,
    pub c: PathBuf,
    pub p: PathBuf,
}

/// Annual soil loss `A = R * K * LS * C * P`.
///
/// Factor grids come at their own resolutions. All of them are brought onto
/// the finest grid by nearest cell before the product.
pub fn soil_loss_job(
    config: &RusleConfig,
    factors: &FactorRasters,
    output_dir: &Path,
) -> Result<JobSummary> {
    let named = [
        ("R", &factors.r),
        ("K", &factors.k),
        ("LS", &factors.ls),
        ("C", &factors.c),
        ("P", &factors.p),
    ];
    let mut grids = Vec::with_capacity(named.len());
    for (name, path) in named {
        let raster: Raster<f64> = read_geotiff(path)
            .with_context(|| format!("Failed to read {} grid {}", name, path.display()))?;
        grids.push((name, raster));
    }

    let template_idx = grids
        .iter()
        .enumerate()
        .min_by(|a, b| a.1 .1.cell_size().total_cmp(&b.1 .1.cell_size()))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let template = grids[template_idx].1.clone();
    info!(
        "Soil loss on the {} grid ({} x {})",
        grids[template_idx].0,
        template.cols(),
        template.rows()
    );

    let mut aligned = Vec::with_capacity(grids.len());
    for (i, (name, raster)) in grids.into_iter().enumerate() {
        if i == template_idx {
            aligned.push(raster);
            continue;
        }
        debug!("Aligning {} grid", name);
        let grid = align_nearest(&raster, &template)
            .with_context(|| format!("Failed to align the {} grid", name))?;
        aligned.push(grid);
    }

    let a = soil_loss(&aligned[0], &aligned[1], &aligned[2], &aligned[3], &aligned[4])?;
    let range = log_range("Soil loss", &a);

    let export = &config.soil_loss.export;
    let tasks = vec![image_task(export, "_raster", "_Raster_GeoTIFF", a)?];
    finish(Factor::SoilLoss, range, output_dir, tasks)
}
