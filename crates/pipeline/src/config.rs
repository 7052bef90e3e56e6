//! Job configuration
//!
//! [`RusleConfig::default`] reproduces the Tangier setup. A JSON file can
//! override any part of it; missing fields keep their defaults.

use anyhow::{bail, Context, Result};
use rusle_algorithms::rusle::{
    CoverEquation, LandCover, LsFormula, LsParams, RainfallParams, SlopeInput, SoilUnits,
    SupportTable, WilliamsParams,
};
use rusle_algorithms::sampling::SampleParams;
use rusle_catalog::parse_date;
use rusle_core::{Region, CRS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RusleConfig {
    /// Area of interest for the K, LS, C and P jobs
    pub region: Region,
    pub inputs: InputsConfig,
    pub rainfall: RainfallConfig,
    pub soil: SoilConfig,
    pub slope_length: SlopeLengthConfig,
    pub cover: CoverConfig,
    pub support: SupportConfig,
    pub soil_loss: SoilLossConfig,
}

impl Default for RusleConfig {
    fn default() -> Self {
        Self {
            region: Region::tangier(),
            inputs: InputsConfig::default(),
            rainfall: RainfallConfig::default(),
            soil: SoilConfig::default(),
            slope_length: SlopeLengthConfig::default(),
            cover: CoverConfig::default(),
            support: SupportConfig::default(),
            soil_loss: SoilLossConfig::default(),
        }
    }
}

impl RusleConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        check_region("region", &self.region)?;
        self.rainfall.validate()?;
        self.soil.validate()?;
        self.slope_length.validate()?;
        self.cover.validate()?;
        self.support.validate()?;
        self.soil_loss.export.validate("soil_loss.export")?;
        Ok(())
    }
}

fn check_region(name: &str, region: &Region) -> Result<()> {
    if region.is_empty() || !region.width().is_finite() || !region.height().is_finite() {
        bail!("{}: empty or invalid region {:?}", name, <[f64; 4]>::from(*region));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value.is_finite()) {
        bail!("{} must be positive, got {}", name, value);
    }
    Ok(())
}

fn check_period(name: &str, start: &str, end: &str) -> Result<()> {
    let s = parse_date(start).with_context(|| format!("{}: bad start date", name))?;
    let e = parse_date(end).with_context(|| format!("{}: bad end date", name))?;
    if s >= e {
        bail!("{}: start {} is not before end {}", name, start, end);
    }
    Ok(())
}

/// Input locations used by `rusle all`. Command-line paths take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputsConfig {
    /// STAC catalog of hourly precipitation rasters
    pub precipitation_catalog: Option<PathBuf>,
    pub sand: Option<PathBuf>,
    pub silt: Option<PathBuf>,
    pub clay: Option<PathBuf>,
    pub soc: Option<PathBuf>,
    pub dem: Option<PathBuf>,
    /// STAC catalog of Sentinel-2 surface reflectance scenes
    pub scene_catalog: Option<PathBuf>,
    /// STAC catalog of yearly land-cover maps
    pub landcover_catalog: Option<PathBuf>,
}

/// Where and how one export lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Task name shown in progress reports
    pub description: String,
    /// Sub-folder of the output directory; empty for the root
    pub folder: String,
    pub file_name_prefix: String,
    /// Target CRS, e.g. `EPSG:4326`; `None` keeps the input CRS
    pub crs: Option<String>,
    pub cloud_optimized: bool,
    /// Upper bound on sampled rows
    pub num_pixels: usize,
    pub seed: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            description: String::new(),
            folder: String::new(),
            file_name_prefix: String::new(),
            crs: None,
            cloud_optimized: false,
            num_pixels: 5000,
            seed: 0,
        }
    }
}

impl ExportConfig {
    fn new(folder: &str, prefix: &str) -> Self {
        Self {
            description: prefix.to_string(),
            folder: folder.to_string(),
            file_name_prefix: prefix.to_string(),
            ..Self::default()
        }
    }

    fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    fn with_crs(mut self, crs: &str) -> Self {
        self.crs = Some(crs.to_string());
        self
    }

    fn with_num_pixels(mut self, n: usize) -> Self {
        self.num_pixels = n;
        self
    }

    pub fn sample_params(&self) -> SampleParams {
        SampleParams {
            num_pixels: self.num_pixels,
            seed: self.seed,
        }
    }

    pub fn target_crs(&self) -> Result<Option<CRS>> {
        match &self.crs {
            None => Ok(None),
            Some(s) => CRS::parse(s)
                .map(Some)
                .with_context(|| format!("Unrecognised CRS '{}'", s)),
        }
    }

    /// `<prefix><suffix>`, e.g. `C_Factor_Tangier_raster`
    pub fn file_name(&self, suffix: &str) -> String {
        format!("{}{}", self.file_name_prefix, suffix)
    }

    /// Task name for a derived output, e.g. `C_Factor_Tangier_Raster_GeoTIFF`
    pub fn task_name(&self, suffix: &str) -> String {
        let base = if self.description.is_empty() {
            &self.file_name_prefix
        } else {
            &self.description
        };
        format!("{}{}", base, suffix)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.file_name_prefix.trim().is_empty() {
            bail!("{}: file_name_prefix is empty", name);
        }
        if Path::new(&self.folder).is_absolute() || self.folder.contains("..") {
            bail!("{}: folder must be relative to the output directory", name);
        }
        if self.num_pixels == 0 {
            bail!("{}: num_pixels must be at least 1", name);
        }
        self.target_crs().with_context(|| name.to_string())?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RainfallConfig {
    pub region: Region,
    /// Inclusive
    pub start: String,
    /// Exclusive
    pub end: String,
    /// Precipitation asset key, in metres
    pub band: String,
    /// Spacing of the sampling lattice (degrees)
    pub grid_step: f64,
    /// `date` column format of the time-series table
    pub date_format: String,
    pub gap_hours: usize,
    pub gap_max_mm: f64,
    pub erosive_min_mm: f64,
    pub erosive_peak_mm: f64,
    pub peak_factor: f64,
    /// Cell size of the interpolated R grid (degrees)
    pub idw_cell_size: f64,
    pub idw_power: f64,
    /// Hourly time-series table
    pub export: ExportConfig,
    /// Per-point R table and interpolated R grid
    pub r_export: ExportConfig,
}

impl Default for RainfallConfig {
    fn default() -> Self {
        let storms = RainfallParams::default();
        Self {
            region: Region::tangier_rainfall(),
            start: "2024-07-01".into(),
            end: "2025-03-01".into(),
            band: "total_precipitation_hourly".into(),
            grid_step: 0.02,
            date_format: "%Y-%m-%d %H:%M".into(),
            gap_hours: storms.gap_hours,
            gap_max_mm: storms.gap_max_mm,
            erosive_min_mm: storms.erosive_min_mm,
            erosive_peak_mm: storms.erosive_peak_mm,
            peak_factor: storms.peak_factor,
            idw_cell_size: 0.01,
            idw_power: 2.0,
            export: ExportConfig::new("", "Tangier_Precipitation_with_Coords"),
            r_export: ExportConfig::new("EarthEngineOutputs", "R_Factor_Tangier")
                .with_crs("EPSG:4326"),
        }
    }
}

impl RainfallConfig {
    pub fn storm_params(&self) -> RainfallParams {
        RainfallParams {
            gap_hours: self.gap_hours,
            gap_max_mm: self.gap_max_mm,
            erosive_min_mm: self.erosive_min_mm,
            erosive_peak_mm: self.erosive_peak_mm,
            peak_factor: self.peak_factor,
        }
    }

    fn validate(&self) -> Result<()> {
        check_region("rainfall.region", &self.region)?;
        check_period("rainfall", &self.start, &self.end)?;
        check_positive("rainfall.grid_step", self.grid_step)?;
        check_positive("rainfall.gap_max_mm", self.gap_max_mm)?;
        check_positive("rainfall.erosive_min_mm", self.erosive_min_mm)?;
        check_positive("rainfall.erosive_peak_mm", self.erosive_peak_mm)?;
        check_positive("rainfall.peak_factor", self.peak_factor)?;
        check_positive("rainfall.idw_cell_size", self.idw_cell_size)?;
        check_positive("rainfall.idw_power", self.idw_power)?;
        if self.gap_hours == 0 {
            bail!("rainfall.gap_hours must be at least 1");
        }
        if self.band.is_empty() {
            bail!("rainfall.band is empty");
        }
        self.export.validate("rainfall.export")?;
        self.r_export.validate("rainfall.r_export")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoilConfig {
    /// Column names of sand, silt, clay and organic carbon
    pub bands: [String; 4],
    pub texture_divisor: f64,
    pub soc_divisor: f64,
    /// Report K in t ha h ha⁻¹ MJ⁻¹ mm⁻¹ instead of US units
    pub si_units: bool,
    /// Sampled soil table
    pub export: ExportConfig,
    /// K grid
    pub k_export: ExportConfig,
}

impl Default for SoilConfig {
    fn default() -> Self {
        let units = SoilUnits::default();
        Self {
            bands: [
                "sand_0-5cm_mean".into(),
                "silt_0-5cm_mean".into(),
                "clay_0-5cm_mean".into(),
                "soc_0-5cm_mean".into(),
            ],
            texture_divisor: units.texture_divisor,
            soc_divisor: units.soc_divisor,
            si_units: true,
            export: ExportConfig::new("EarthEngineExports", "soil_data_tangier")
                .with_description("Soil_Data_Tangier")
                .with_num_pixels(1000),
            k_export: ExportConfig::new("EarthEngineExports", "K_Factor_Tangier"),
        }
    }
}

impl SoilConfig {
    pub fn williams_params(&self) -> WilliamsParams {
        WilliamsParams {
            units: SoilUnits {
                texture_divisor: self.texture_divisor,
                soc_divisor: self.soc_divisor,
            },
            si_units: self.si_units,
        }
    }

    fn validate(&self) -> Result<()> {
        check_positive("soil.texture_divisor", self.texture_divisor)?;
        check_positive("soil.soc_divisor", self.soc_divisor)?;
        if self.bands.iter().any(|b| b.is_empty()) {
            bail!("soil.bands must all be named");
        }
        self.export.validate("soil.export")?;
        self.k_export.validate("soil.k_export")
    }
}

/// Steepness term of the LS equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LsFormulaKind {
    #[default]
    PercentSine,
    MooreBurch,
}

impl From<LsFormulaKind> for LsFormula {
    fn from(kind: LsFormulaKind) -> Self {
        match kind {
            LsFormulaKind::PercentSine => LsFormula::PercentSine,
            LsFormulaKind::MooreBurch => LsFormula::MooreBurch,
        }
    }
}

/// Unit of the slope grid behind the slope classes and steepness term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlopeInputKind {
    /// Slope in degrees times 100
    #[default]
    DegreesX100,
    /// `100 * tan(slope)`
    Percent,
}

impl From<SlopeInputKind> for SlopeInput {
    fn from(kind: SlopeInputKind) -> Self {
        match kind {
            SlopeInputKind::DegreesX100 => SlopeInput::DegreesX100,
            SlopeInputKind::Percent => SlopeInput::Percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlopeLengthConfig {
    /// Ground cell size (m)
    pub cell_size: f64,
    /// Slope-length exponent per slope class
    pub m: [f64; 4],
    /// Steepness exponent per slope class
    pub n: [f64; 4],
    pub formula: LsFormulaKind,
    pub slope_input: SlopeInputKind,
    /// Gradient imposed across filled depressions
    pub fill_min_slope: f64,
    pub export: ExportConfig,
}

impl Default for SlopeLengthConfig {
    fn default() -> Self {
        let ls = LsParams::default();
        Self {
            cell_size: ls.cell_size,
            m: ls.m,
            n: ls.n,
            formula: LsFormulaKind::default(),
            slope_input: SlopeInputKind::default(),
            fill_min_slope: 0.01,
            export: ExportConfig::new("EarthEngineExports", "ls_factor_tangier_corrected")
                .with_description("LS_Factor_Tangier_Corrected"),
        }
    }
}

impl SlopeLengthConfig {
    pub fn ls_params(&self) -> LsParams {
        LsParams {
            m: self.m,
            n: self.n,
            cell_size: self.cell_size,
            formula: self.formula.into(),
            slope_input: self.slope_input.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        check_positive("slope_length.cell_size", self.cell_size)?;
        if self.m.iter().chain(&self.n).any(|v| !v.is_finite() || *v < 0.0) {
            bail!("slope_length exponents must be finite and non-negative");
        }
        if !(self.fill_min_slope >= 0.0 && self.fill_min_slope.is_finite()) {
            bail!("slope_length.fill_min_slope must be >= 0");
        }
        self.export.validate("slope_length.export")
    }
}

/// NDVI to C transfer function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverEquationKind {
    #[default]
    ExpNdvi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverConfig {
    pub start: String,
    pub end: String,
    /// Scene property compared against `cloud_threshold`
    pub cloud_property: String,
    /// Scenes with `cloud_property < cloud_threshold` are kept (%)
    pub cloud_threshold: f64,
    pub nir_band: String,
    pub red_band: String,
    pub equation: CoverEquationKind,
    pub alpha: f64,
    pub c_max: f64,
    pub export: ExportConfig,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            start: "2023-06-01".into(),
            end: "2025-03-01".into(),
            cloud_property: "CLOUDY_PIXEL_PERCENTAGE".into(),
            cloud_threshold: 5.0,
            nir_band: "B8".into(),
            red_band: "B4".into(),
            equation: CoverEquationKind::ExpNdvi,
            alpha: 2.0,
            c_max: 1.0,
            export: ExportConfig::new("EarthEngineOutputs", "C_Factor_Tangier")
                .with_crs("EPSG:4326"),
        }
    }
}

impl CoverConfig {
    pub fn cover_equation(&self) -> CoverEquation {
        match self.equation {
            CoverEquationKind::ExpNdvi => CoverEquation::ExpNdvi {
                alpha: self.alpha,
                c_max: self.c_max,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        check_period("cover", &self.start, &self.end)?;
        if !(0.0..=100.0).contains(&self.cloud_threshold) {
            bail!("cover.cloud_threshold must be within 0..=100, got {}", self.cloud_threshold);
        }
        check_positive("cover.c_max", self.c_max)?;
        if !self.alpha.is_finite() {
            bail!("cover.alpha must be finite");
        }
        self.export.validate("cover.export")
    }
}

/// How P is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportMethod {
    #[default]
    LulcBased,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupportConfig {
    pub method: SupportMethod,
    /// Land-cover map year
    pub year: i32,
    pub band: String,
    /// Class code → land-cover category name
    pub classes: BTreeMap<i64, String>,
    /// Land-cover category name → P
    pub values: BTreeMap<String, f64>,
    /// P for unlisted codes and nodata
    pub default_value: f64,
    pub export: ExportConfig,
}

impl Default for SupportConfig {
    fn default() -> Self {
        let table = SupportTable::copernicus_lulc();
        Self {
            method: SupportMethod::LulcBased,
            year: 2019,
            band: "discrete_classification".into(),
            classes: table
                .classes
                .iter()
                .map(|(&code, cover)| (code, cover.name().to_string()))
                .collect(),
            values: table
                .values
                .iter()
                .map(|(cover, &p)| (cover.name().to_string(), p))
                .collect(),
            default_value: table.default_value,
            export: ExportConfig::new("EarthEngineOutputs", "P_Factor_Tangier")
                .with_crs("EPSG:4326"),
        }
    }
}

impl SupportConfig {
    pub fn support_table(&self) -> Result<SupportTable> {
        let cover = |name: &str| {
            LandCover::from_name(name)
                .with_context(|| format!("Unknown land-cover class '{}'", name))
        };
        let classes: BTreeMap<i64, LandCover> = self
            .classes
            .iter()
            .map(|(&code, name)| -> Result<(i64, LandCover)> { Ok((code, cover(name)?)) })
            .collect::<Result<_>>()?;
        let values: BTreeMap<LandCover, f64> = self
            .values
            .iter()
            .map(|(name, &p)| -> Result<(LandCover, f64)> { Ok((cover(name)?, p)) })
            .collect::<Result<_>>()?;
        Ok(SupportTable {
            classes,
            values,
            default_value: self.default_value,
        })
    }

    /// `[year-01-01, year-12-31)`, as the land-cover query has always used it
    pub fn period(&self) -> (String, String) {
        (format!("{}-01-01", self.year), format!("{}-12-31", self.year))
    }

    fn validate(&self) -> Result<()> {
        self.support_table()?;
        if self.values.values().any(|p| !(0.0..=1.0).contains(p)) {
            bail!("support.values must be within 0..=1");
        }
        let (start, end) = self.period();
        check_period("support", &start, &end)?;
        self.export.validate("support.export")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoilLossConfig {
    pub export: ExportConfig,
}

impl Default for SoilLossConfig {
    fn default() -> Self {
        Self {
            export: ExportConfig::new("EarthEngineOutputs", "Soil_Loss_Tangier"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RusleConfig::default();
        config.validate().unwrap();
        assert_eq!(config.cover.export.num_pixels, 5000);
        assert_eq!(config.soil.export.num_pixels, 1000);
        assert_eq!(config.support.period(), ("2019-01-01".to_string(), "2019-12-31".to_string()));
        assert_eq!(config.support.support_table().unwrap(), SupportTable::copernicus_lulc());
    }

    #[test]
    fn json_round_trip_and_partial_override() {
        let config = RusleConfig::default();
        let text = config.to_json_pretty().unwrap();
        let back: RusleConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);

        let partial: RusleConfig =
            serde_json::from_str(r#"{"cover": {"alpha": 1.5}, "region": [-6.0, 35.0, -5.0, 36.0]}"#)
                .unwrap();
        assert_eq!(partial.cover.alpha, 1.5);
        assert_eq!(partial.cover.nir_band, "B8");
        assert_eq!(partial.region, Region::new(-6.0, 35.0, -5.0, 36.0));
    }

    #[test]
    fn unknown_method_names_are_rejected() {
        let parse = |json: &str| serde_json::from_str::<RusleConfig>(json);
        assert!(parse(r#"{"cover": {"equation": "linear"}}"#).is_err());
        assert!(parse(r#"{"support": {"method": "terraces"}}"#).is_err());
        let ls = parse(r#"{"slope_length": {"formula": "moore_burch"}}"#).unwrap();
        assert_eq!(ls.slope_length.ls_params().formula, LsFormula::MooreBurch);
        assert_eq!(ls.slope_length.ls_params().slope_input, SlopeInput::DegreesX100);

        let pct = parse(r#"{"slope_length": {"slope_input": "percent"}}"#).unwrap();
        assert_eq!(pct.slope_length.ls_params().slope_input, SlopeInput::Percent);
        assert!(parse(r#"{"slope_length": {"slope_input": "radians"}}"#).is_err());
    }

    #[test]
    fn validation_catches_bad_ranges() {
        let mut config = RusleConfig::default();
        config.cover.start = "2025-03-01".into();
        assert!(config.validate().is_err());

        let mut config = RusleConfig::default();
        config.rainfall.grid_step = 0.0;
        assert!(config.validate().is_err());

        let mut config = RusleConfig::default();
        config.support.classes.insert(200, "glacier".into());
        assert!(config.validate().is_err());

        let mut config = RusleConfig::default();
        config.cover.export.folder = "../outside".into();
        assert!(config.validate().is_err());
    }
}
