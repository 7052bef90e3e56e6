//! Background export tasks
//!
//! Each [`ExportTask`] runs on its own thread and reports progress as
//! [`TaskEvent`]s over a channel. [`TaskMonitor`] starts tasks and waits for
//! all of them, the local counterpart of submitting export jobs and polling
//! their status.

use crate::table::Table;
use anyhow::{anyhow, bail, Context, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use rusle_core::io::{write_geotiff, GeoTiffOptions};
use rusle_core::{Raster, CRS};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One output file to produce
#[derive(Debug, Clone)]
pub enum ExportTask {
    Image {
        description: String,
        folder: String,
        file_name_prefix: String,
        raster: Raster<f64>,
        /// Declared CRS of the output; must match the raster's when it has one
        crs: Option<CRS>,
        cloud_optimized: bool,
    },
    Table {
        description: String,
        folder: String,
        file_name_prefix: String,
        table: Table,
    },
}

/// Status updates sent by running tasks
#[derive(Debug, Clone)]
pub enum TaskEvent {
    Started {
        description: String,
    },
    Completed {
        description: String,
        path: PathBuf,
        elapsed: Duration,
    },
    Failed {
        description: String,
        error: String,
    },
}

/// A finished export
#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport {
    pub description: String,
    pub path: PathBuf,
    pub elapsed: Duration,
}

impl ExportTask {
    pub fn description(&self) -> &str {
        match self {
            ExportTask::Image { description, .. } | ExportTask::Table { description, .. } => {
                description
            }
        }
    }

    /// `<root>/<folder>/<prefix>.tif` or `.csv`
    pub fn target(&self, root: &Path) -> PathBuf {
        let (folder, prefix, ext) = match self {
            ExportTask::Image {
                folder,
                file_name_prefix,
                ..
            } => (folder, file_name_prefix, "tif"),
            ExportTask::Table {
                folder,
                file_name_prefix,
                ..
            } => (folder, file_name_prefix, "csv"),
        };
        root.join(folder).join(format!("{}.{}", prefix, ext))
    }

    /// Write the output synchronously.
    pub fn run(&self, root: &Path) -> Result<PathBuf> {
        let path = self.target(root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        match self {
            ExportTask::Image {
                raster,
                crs,
                cloud_optimized,
                ..
            } => {
                let mut raster = raster.clone();
                match (raster.crs(), crs) {
                    (Some(have), Some(want)) if !have.is_equivalent(want) => {
                        bail!(
                            "Raster is in {}, export requested {}; reprojection is not supported",
                            have,
                            want
                        );
                    }
                    (None, Some(want)) => raster.set_crs(Some(want.clone())),
                    _ => {}
                }
                if *cloud_optimized {
                    debug!("Cloud-optimized layout requested; writing a striped GeoTIFF");
                }
                let options = GeoTiffOptions {
                    cloud_optimized: *cloud_optimized,
                };
                write_geotiff(&raster, &path, Some(options))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
            ExportTask::Table { table, .. } => table.write_csv(&path)?,
        }
        Ok(path)
    }

    /// Run on a background thread, reporting through `tx`.
    pub fn start(self, root: PathBuf, tx: Sender<TaskEvent>) -> JoinHandle<()> {
        std::thread::spawn(move || {
            let description = self.description().to_string();
            let _ = tx.send(TaskEvent::Started {
                description: description.clone(),
            });
            let start = Instant::now();
            let outcome = catch_unwind(AssertUnwindSafe(|| self.run(&root)))
                .unwrap_or_else(|_| Err(anyhow!("export panicked")));
            match outcome {
                Ok(path) => {
                    let _ = tx.send(TaskEvent::Completed {
                        description,
                        path,
                        elapsed: start.elapsed(),
                    });
                }
                Err(e) => {
                    let _ = tx.send(TaskEvent::Failed {
                        description,
                        error: format!("{:#}", e),
                    });
                }
            }
        })
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Starts export tasks under one output directory and collects their
/// outcome.
pub struct TaskMonitor {
    root: PathBuf,
    tx: Sender<TaskEvent>,
    rx: Receiver<TaskEvent>,
    handles: Vec<JoinHandle<()>>,
}

impl TaskMonitor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            root: root.into(),
            tx,
            rx,
            handles: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn submit(&mut self, task: ExportTask) {
        info!("Export task started: {}", task.description());
        let handle = task.start(self.root.clone(), self.tx.clone());
        self.handles.push(handle);
    }

    pub fn pending(&self) -> usize {
        self.handles.len()
    }

    /// Block until every submitted task has finished. Fails if any failed,
    /// after all of them have run. A thread that dies without reporting
    /// counts as failed.
    pub fn wait_all(&mut self) -> Result<Vec<TaskReport>> {
        let expected = self.handles.len();
        let mut reports = Vec::with_capacity(expected);
        let mut failures = Vec::new();
        let mut finished = 0;

        while finished < expected {
            let event = match self.rx.recv_timeout(POLL_INTERVAL) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => {
                    // all threads gone and nothing left to read
                    if self.handles.iter().all(|h| h.is_finished()) && self.rx.is_empty() {
                        break;
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    bail!(
                        "Export channel closed with {} task(s) outstanding",
                        expected - finished
                    );
                }
            };
            match event {
                TaskEvent::Started { description } => debug!("{}: running", description),
                TaskEvent::Completed {
                    description,
                    path,
                    elapsed,
                } => {
                    info!("{}: completed in {:.2?} -> {}", description, elapsed, path.display());
                    reports.push(TaskReport {
                        description,
                        path,
                        elapsed,
                    });
                    finished += 1;
                }
                TaskEvent::Failed { description, error } => {
                    warn!("{}: failed: {}", description, error);
                    failures.push(format!("{}: {}", description, error));
                    finished += 1;
                }
            }
        }

        let mut panicked = 0;
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                panicked += 1;
            }
        }
        let silent = expected - finished;
        if silent > 0 {
            warn!("{} export thread(s) stopped without reporting", silent);
            let reason = if panicked > 0 { "panicked" } else { "stopped without reporting" };
            failures.extend((0..silent).map(|_| format!("export thread {}", reason)));
        }

        if !failures.is_empty() {
            bail!("{} export task(s) failed: {}", failures.len(), failures.join("; "));
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusle_core::io::read_geotiff;
    use rusle_core::GeoTransform;

    fn grid() -> Raster<f64> {
        let mut r = Raster::from_vec(vec![0.1, 0.2, 0.3, 0.4], 2, 2).unwrap();
        r.set_transform(GeoTransform::new(-5.94, 35.84, 0.01, -0.01));
        r
    }

    fn image(crs: Option<CRS>) -> ExportTask {
        ExportTask::Image {
            description: "C_Factor_Tangier_Raster_GeoTIFF".into(),
            folder: "EarthEngineOutputs".into(),
            file_name_prefix: "C_Factor_Tangier_raster".into(),
            raster: grid(),
            crs,
            cloud_optimized: false,
        }
    }

    #[test]
    fn target_paths() {
        let root = Path::new("/out");
        assert_eq!(
            image(None).target(root),
            PathBuf::from("/out/EarthEngineOutputs/C_Factor_Tangier_raster.tif")
        );
        let table = ExportTask::Table {
            description: "t".into(),
            folder: String::new(),
            file_name_prefix: "Tangier_Precipitation_with_Coords".into(),
            table: Table::new(["a"]),
        };
        assert_eq!(
            table.target(root),
            PathBuf::from("/out/Tangier_Precipitation_with_Coords.csv")
        );
    }

    #[test]
    fn monitor_collects_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = TaskMonitor::new(dir.path());
        monitor.submit(image(Some(CRS::wgs84())));
        let mut table = Table::new(["C_Factor", "longitude", "latitude"]);
        table
            .push_row(vec!["0.5".into(), "-5.9".into(), "35.8".into()])
            .unwrap();
        monitor.submit(ExportTask::Table {
            description: "C_Factor_Tangier_Sampled_CSV".into(),
            folder: "EarthEngineOutputs".into(),
            file_name_prefix: "C_Factor_Tangier_sampled".into(),
            table,
        });
        assert_eq!(monitor.pending(), 2);

        let reports = monitor.wait_all().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(monitor.pending(), 0);
        for report in &reports {
            assert!(report.path.exists());
        }

        let path = dir.path().join("EarthEngineOutputs/C_Factor_Tangier_raster.tif");
        let written: Raster<f64> = read_geotiff(path).unwrap();
        assert_eq!(written.crs().and_then(|c| c.epsg()), Some(4326));
    }

    #[test]
    fn dead_thread_fails_instead_of_hanging() {
        let dir = tempfile::tempdir().unwrap();
        let mut monitor = TaskMonitor::new(dir.path());
        monitor.submit(image(None));
        let tx = monitor.tx.clone();
        monitor.handles.push(std::thread::spawn(move || {
            let _ = tx.send(TaskEvent::Started {
                description: "Soil_Loss_Tangier_Raster_GeoTIFF".into(),
            });
            panic!("writer crashed");
        }));

        let err = monitor.wait_all().unwrap_err().to_string();
        assert!(err.contains("1 export task(s) failed"), "{}", err);
        assert!(err.contains("panicked"), "{}", err);
        assert_eq!(monitor.pending(), 0);
        assert!(dir.path().join("EarthEngineOutputs/C_Factor_Tangier_raster.tif").exists());
    }

    #[test]
    fn crs_conflict_fails_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = image(Some(CRS::wgs84()));
        if let ExportTask::Image { raster, .. } = &mut task {
            raster.set_crs(Some(CRS::from_epsg(32630)));
        }
        let mut monitor = TaskMonitor::new(dir.path());
        monitor.submit(task);
        let err = monitor.wait_all().unwrap_err();
        assert!(err.to_string().contains("1 export task(s) failed"));
    }
}
