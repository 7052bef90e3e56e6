//! rusle CLI - RUSLE erosion factors for the Tangier region

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rusle_core::io::read_geotiff;
use rusle_core::Raster;
use rusle_pipeline::jobs::{self, resolve_input, FactorRasters, JobSummary, SoilGrids};
use rusle_pipeline::RusleConfig;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rusle")]
#[command(author, version, about = "RUSLE erosion factors for Tangier", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration; defaults reproduce the Tangier setup
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory receiving all exports
    #[arg(short, long, global = true, default_value = "output")]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Print the effective configuration as JSON
    Config,
    /// Rainfall erosivity from hourly precipitation
    RFactor {
        /// STAC catalog of hourly precipitation rasters
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Soil erodibility from SoilGrids texture and organic carbon
    KFactor {
        #[arg(long)]
        sand: Option<PathBuf>,
        #[arg(long)]
        silt: Option<PathBuf>,
        #[arg(long)]
        clay: Option<PathBuf>,
        /// Soil organic carbon
        #[arg(long)]
        soc: Option<PathBuf>,
    },
    /// Slope length-steepness from a DEM
    LsFactor {
        #[arg(long)]
        dem: Option<PathBuf>,
    },
    /// Cover management from Sentinel-2 NDVI
    CFactor {
        /// STAC catalog of surface reflectance scenes
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Support practice from land cover
    PFactor {
        /// STAC catalog of land-cover maps
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Multiply factor grids into annual soil loss
    SoilLoss {
        #[arg(long)]
        r: PathBuf,
        #[arg(long)]
        k: PathBuf,
        #[arg(long)]
        ls: PathBuf,
        #[arg(long)]
        c: PathBuf,
        #[arg(long)]
        p: PathBuf,
    },
    /// Run every factor job with the configured inputs, then soil loss
    All,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn load_config(path: Option<&Path>) -> Result<RusleConfig> {
    match path {
        Some(path) => {
            let config = RusleConfig::from_json_file(path)?;
            info!("Configuration: {}", path.display());
            Ok(config)
        }
        None => Ok(RusleConfig::default()),
    }
}

fn done(summary: &JobSummary, elapsed: Duration) {
    for output in &summary.outputs {
        println!("{} saved to: {}", output.description, output.path.display());
    }
    if let (Some(min), Some(max)) = (summary.min, summary.max) {
        println!("  {} range: {:.4} - {:.4}", summary.factor, min, max);
    }
    println!("  Processing time: {:.2?}", elapsed);
}

fn run_job<F>(label: &str, job: F) -> Result<()>
where
    F: FnOnce() -> Result<JobSummary>,
{
    let pb = spinner(&format!("Computing {}...", label));
    let start = Instant::now();
    let result = job();
    pb.finish_and_clear();
    let summary = result.with_context(|| format!("{} job failed", label))?;
    done(&summary, start.elapsed());
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let out = cli.output_dir.as_path();
    let inputs = &config.inputs;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let pb = spinner("Reading raster...");
            let raster: Raster<f64> = read_geotiff(&input).context("Failed to read raster")?;
            pb.finish_and_clear();
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len() as f64
            );
        }

        Commands::Config => {
            println!("{}", config.to_json_pretty()?);
        }

        // ── Factors ──────────────────────────────────────────────────
        Commands::RFactor { catalog } => {
            let catalog = resolve_input(
                catalog,
                inputs.precipitation_catalog.as_deref(),
                "precipitation_catalog",
            )?;
            run_job("R factor", || jobs::r_factor_job(&config, &catalog, out))?;
        }

        Commands::KFactor {
            sand,
            silt,
            clay,
            soc,
        } => {
            let grids = SoilGrids {
                sand: resolve_input(sand, inputs.sand.as_deref(), "sand")?,
                silt: resolve_input(silt, inputs.silt.as_deref(), "silt")?,
                clay: resolve_input(clay, inputs.clay.as_deref(), "clay")?,
                soc: resolve_input(soc, inputs.soc.as_deref(), "soc")?,
            };
            run_job("K factor", || jobs::k_factor_job(&config, &grids, out))?;
        }

        Commands::LsFactor { dem } => {
            let dem = resolve_input(dem, inputs.dem.as_deref(), "dem")?;
            run_job("LS factor", || jobs::ls_factor_job(&config, &dem, out))?;
        }

        Commands::CFactor { catalog } => {
            let catalog = resolve_input(catalog, inputs.scene_catalog.as_deref(), "scene_catalog")?;
            run_job("C factor", || jobs::c_factor_job(&config, &catalog, out))?;
        }

        Commands::PFactor { catalog } => {
            let catalog =
                resolve_input(catalog, inputs.landcover_catalog.as_deref(), "landcover_catalog")?;
            run_job("P factor", || jobs::p_factor_job(&config, &catalog, out))?;
        }

        Commands::SoilLoss { r, k, ls, c, p } => {
            let factors = FactorRasters { r, k, ls, c, p };
            run_job("soil loss", || jobs::soil_loss_job(&config, &factors, out))?;
        }

        Commands::All => {
            let pb = spinner("Running all factor jobs...");
            let start = Instant::now();
            let result = jobs::run_all(&config, out);
            pb.finish_and_clear();
            let summaries = result?;
            for summary in &summaries {
                println!("{}:", summary.factor);
                for output in &summary.outputs {
                    println!("  {} saved to: {}", output.description, output.path.display());
                }
            }
            println!("Processing time: {:.2?}", start.elapsed());
        }
    }

    Ok(())
}
