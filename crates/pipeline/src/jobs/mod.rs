//! Factor jobs
//!
//! Every job runs the same short sequence: load inputs, compute the factor,
//! clip it to the region, log its range, sample it and export the results.
//! Exports run as background tasks; a job returns once they have all
//! finished.

mod cover;
mod rainfall;
mod slope_length;
mod soil;
mod soil_loss;
mod support;

pub use cover::c_factor_job;
pub use rainfall::r_factor_job;
pub use slope_length::ls_factor_job;
pub use soil::{k_factor_job, SoilGrids};
pub use soil_loss::{soil_loss_job, FactorRasters};
pub use support::p_factor_job;

use crate::config::{ExportConfig, RusleConfig};
use crate::export::{ExportTask, TaskMonitor, TaskReport};
use crate::table::Table;
use anyhow::{Context, Result};
use rusle_core::Raster;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factor {
    R,
    K,
    LS,
    C,
    P,
    SoilLoss,
}

impl Factor {
    pub fn name(self) -> &'static str {
        match self {
            Factor::R => "R factor",
            Factor::K => "K factor",
            Factor::LS => "LS factor",
            Factor::C => "C factor",
            Factor::P => "P factor",
            Factor::SoilLoss => "Soil loss",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one job
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub factor: Factor,
    /// Range of the exported factor grid; `None` when it has no valid cell
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub outputs: Vec<TaskReport>,
}

impl JobSummary {
    /// The exported factor grid, if the job wrote one
    pub fn raster_path(&self) -> Option<&Path> {
        self.outputs
            .iter()
            .map(|r| r.path.as_path())
            .find(|p| p.extension().is_some_and(|e| e == "tif"))
    }
}

/// Log the value range of `raster` for quality checks.
pub(crate) fn log_range(label: &str, raster: &Raster<f64>) -> (Option<f64>, Option<f64>) {
    match raster.min_max() {
        Some((min, max)) => {
            info!("{} range: min={:.4}, max={:.4}", label, min, max);
            (Some(min), Some(max))
        }
        None => {
            warn!("{}: no valid pixels", label);
            (None, None)
        }
    }
}

pub(crate) fn image_task(
    export: &ExportConfig,
    file_suffix: &str,
    task_suffix: &str,
    raster: Raster<f64>,
) -> Result<ExportTask> {
    Ok(ExportTask::Image {
        description: export.task_name(task_suffix),
        folder: export.folder.clone(),
        file_name_prefix: export.file_name(file_suffix),
        raster,
        crs: export.target_crs()?,
        cloud_optimized: export.cloud_optimized,
    })
}

pub(crate) fn table_task(
    export: &ExportConfig,
    file_suffix: &str,
    task_suffix: &str,
    table: Table,
) -> ExportTask {
    ExportTask::Table {
        description: export.task_name(task_suffix),
        folder: export.folder.clone(),
        file_name_prefix: export.file_name(file_suffix),
        table,
    }
}

/// Submit `tasks`, wait for them and wrap up the job.
pub(crate) fn finish(
    factor: Factor,
    range: (Option<f64>, Option<f64>),
    output_dir: &Path,
    tasks: Vec<ExportTask>,
) -> Result<JobSummary> {
    let mut monitor = TaskMonitor::new(output_dir);
    for task in tasks {
        monitor.submit(task);
    }
    let outputs = monitor
        .wait_all()
        .with_context(|| format!("{} export failed", factor))?;
    Ok(JobSummary {
        factor,
        min: range.0,
        max: range.1,
        outputs,
    })
}

/// Path from the command line, else from the config, else an error.
pub fn resolve_input(cli: Option<PathBuf>, config: Option<&Path>, name: &str) -> Result<PathBuf> {
    cli.or_else(|| config.map(Path::to_path_buf)).with_context(|| {
        format!(
            "No {} given; pass it on the command line or set inputs.{} in the config",
            name, name
        )
    })
}

/// Run the five factor jobs with the inputs named in `config.inputs`, then
/// combine their grids into soil loss.
pub fn run_all(config: &RusleConfig, output_dir: &Path) -> Result<Vec<JobSummary>> {
    let inputs = &config.inputs;
    let r = r_factor_job(
        config,
        &resolve_input(None, inputs.precipitation_catalog.as_deref(), "precipitation_catalog")?,
        output_dir,
    )?;
    let soil = SoilGrids {
        sand: resolve_input(None, inputs.sand.as_deref(), "sand")?,
        silt: resolve_input(None, inputs.silt.as_deref(), "silt")?,
        clay: resolve_input(None, inputs.clay.as_deref(), "clay")?,
        soc: resolve_input(None, inputs.soc.as_deref(), "soc")?,
    };
    let k = k_factor_job(config, &soil, output_dir)?;
    let dem = resolve_input(None, inputs.dem.as_deref(), "dem")?;
    let ls = ls_factor_job(config, &dem, output_dir)?;
    let c = c_factor_job(
        config,
        &resolve_input(None, inputs.scene_catalog.as_deref(), "scene_catalog")?,
        output_dir,
    )?;
    let p = p_factor_job(
        config,
        &resolve_input(None, inputs.landcover_catalog.as_deref(), "landcover_catalog")?,
        output_dir,
    )?;

    let raster = |s: &JobSummary| -> Result<PathBuf> {
        s.raster_path()
            .map(Path::to_path_buf)
            .with_context(|| format!("{} job wrote no raster", s.factor))
    };
    let factors = FactorRasters {
        r: raster(&r)?,
        k: raster(&k)?,
        ls: raster(&ls)?,
        c: raster(&c)?,
        p: raster(&p)?,
    };
    let a = soil_loss_job(config, &factors, output_dir)?;
    Ok(vec![r, k, ls, c, p, a])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_path_wins_over_config() {
        let configured = Some(PathBuf::from("inputs/dem.tif"));
        let picked = resolve_input(Some("cli/dem.tif".into()), configured.as_deref(), "dem");
        assert_eq!(picked.unwrap(), PathBuf::from("cli/dem.tif"));
        let picked = resolve_input(None, configured.as_deref(), "dem");
        assert_eq!(picked.unwrap(), PathBuf::from("inputs/dem.tif"));

        let err = resolve_input(None, None, "dem").unwrap_err();
        assert!(err.to_string().contains("inputs.dem"));
    }
}
