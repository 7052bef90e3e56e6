//! # RUSLE Pipeline
//!
//! Factor jobs for the RUSLE erosion model and the plumbing around them:
//!
//! - [`config`]: region, dates, formula choices and export targets
//! - [`table`]: sampled rows ready for CSV export
//! - [`export`]: background GeoTIFF/CSV export tasks and their monitor
//! - [`jobs`]: one job per factor plus the soil loss product

pub mod config;
pub mod export;
pub mod jobs;
pub mod table;

pub use config::RusleConfig;
pub use export::{ExportTask, TaskEvent, TaskMonitor, TaskReport};
pub use jobs::{Factor, JobSummary};
pub use table::Table;
