//! Rainfall-runoff erosivity (R) from hourly precipitation
//!
//! Storms are cut out of the hourly record, each erosive storm contributes
//! its energy-intensity product EI, and R is the yearly mean of the summed
//! EI (MJ mm ha⁻¹ h⁻¹ yr⁻¹).
//!
//! Unit energy follows Brown & Foster (1987) as used by RUSLE2:
//! `e = 0.29 (1 - 0.72 exp(-0.05 i))` MJ ha⁻¹ mm⁻¹ for intensity `i` in
//! mm h⁻¹. With hourly data the peak hourly intensity stands in for I30,
//! scaled by `peak_factor`.

use chrono::{DateTime, Duration, Utc};
use rusle_core::{Error, Result};

const HOURS_PER_YEAR: f64 = 365.25 * 24.0;

/// Hourly precipitation at one location
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourlySeries {
    /// Start of each hour, strictly increasing
    pub timestamps: Vec<DateTime<Utc>>,
    /// Depth fallen in each hour (mm); NaN counts as dry
    pub depths_mm: Vec<f64>,
}

impl HourlySeries {
    pub fn new(timestamps: Vec<DateTime<Utc>>, depths_mm: Vec<f64>) -> Result<Self> {
        if timestamps.len() != depths_mm.len() {
            return Err(Error::InvalidParameter {
                name: "depths_mm",
                value: depths_mm.len().to_string(),
                reason: format!("expected one depth per timestamp ({})", timestamps.len()),
            });
        }
        if timestamps.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidParameter {
                name: "timestamps",
                value: format!("{} entries", timestamps.len()),
                reason: "timestamps must be strictly increasing".into(),
            });
        }
        Ok(Self { timestamps, depths_mm })
    }

    /// Series from depths in metres, as stored by ERA5-Land.
    pub fn from_metres(timestamps: Vec<DateTime<Utc>>, depths_m: &[f64]) -> Result<Self> {
        Self::new(timestamps, depths_m.iter().map(|d| d * 1000.0).collect())
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Span covered by the record, counting the last hour in full.
    pub fn span_hours(&self) -> f64 {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(first), Some(last)) => (*last - *first).num_seconds() as f64 / 3600.0 + 1.0,
            _ => 0.0,
        }
    }

    /// Depths on a gap-free hourly axis starting at the first timestamp.
    /// Missing hours and NaN depths are 0.
    fn dense(&self) -> Vec<f64> {
        let Some(&first) = self.timestamps.first() else {
            return Vec::new();
        };
        let mut dense = vec![0.0; self.span_hours().round() as usize];
        for (t, d) in self.timestamps.iter().zip(&self.depths_mm) {
            let idx = (*t - first).num_hours() as usize;
            if let Some(slot) = dense.get_mut(idx) {
                if d.is_finite() && *d > 0.0 {
                    *slot += d;
                }
            }
        }
        dense
    }
}

#[derive(Debug, Clone)]
pub struct RainfallParams {
    /// Length of the dry spell separating two storms (h)
    pub gap_hours: usize,
    /// A spell counts as dry when its total is below this depth (mm)
    pub gap_max_mm: f64,
    /// Storms at least this deep are erosive (mm)
    pub erosive_min_mm: f64,
    /// Storms with an hour at least this deep are erosive (mm)
    pub erosive_peak_mm: f64,
    /// Multiplier turning the peak hourly intensity into I30
    pub peak_factor: f64,
}

impl Default for RainfallParams {
    fn default() -> Self {
        Self {
            gap_hours: 6,
            gap_max_mm: 1.27,
            erosive_min_mm: 12.7,
            erosive_peak_mm: 6.35,
            peak_factor: 1.0,
        }
    }
}

/// One rainfall event
#[derive(Debug, Clone, PartialEq)]
pub struct Storm {
    pub start: DateTime<Utc>,
    /// Hourly depths from the first to the last wet hour (mm)
    pub depths_mm: Vec<f64>,
}

impl Storm {
    pub fn depth(&self) -> f64 {
        self.depths_mm.iter().sum()
    }

    pub fn peak(&self) -> f64 {
        self.depths_mm.iter().copied().fold(0.0, f64::max)
    }

    pub fn duration_hours(&self) -> usize {
        self.depths_mm.len()
    }

    pub fn is_erosive(&self, params: &RainfallParams) -> bool {
        self.depth() >= params.erosive_min_mm || self.peak() >= params.erosive_peak_mm
    }

    /// Total kinetic energy (MJ ha⁻¹)
    pub fn energy(&self) -> f64 {
        self.depths_mm.iter().map(|&d| unit_energy(d) * d).sum()
    }

    /// Energy times maximum intensity (MJ mm ha⁻¹ h⁻¹)
    pub fn ei(&self, params: &RainfallParams) -> f64 {
        self.energy() * self.peak() * params.peak_factor
    }
}

/// Unit rainfall energy (MJ ha⁻¹ mm⁻¹) at intensity `i` (mm h⁻¹)
pub fn unit_energy(i: f64) -> f64 {
    0.29 * (1.0 - 0.72 * (-0.05 * i).exp())
}

/// Split `series` into storms.
///
/// A storm starts at a wet hour and ends before the first window of
/// `gap_hours` hours whose total stays below `gap_max_mm`. Rain inside that
/// window starts the next storm. A window running past the end of the
/// record does not split.
pub fn segment_storms(series: &HourlySeries, params: &RainfallParams) -> Vec<Storm> {
    let dense = series.dense();
    let Some(&origin) = series.timestamps.first() else {
        return Vec::new();
    };
    let gap = params.gap_hours.max(1);
    let n = dense.len();

    let mut storms = Vec::new();
    let mut i = 0;
    while i < n {
        if dense[i] <= 0.0 {
            i += 1;
            continue;
        }
        let start = i;
        let mut last_wet = i;
        let mut j = i + 1;
        while j < n {
            if j + gap <= n && dense[j..j + gap].iter().sum::<f64>() < params.gap_max_mm {
                break;
            }
            if dense[j] > 0.0 {
                last_wet = j;
            }
            j += 1;
        }
        storms.push(Storm {
            start: origin + Duration::hours(start as i64),
            depths_mm: dense[start..=last_wet].to_vec(),
        });
        i = j;
    }
    storms
}

/// Mean annual erosivity of `series`: the EI of erosive storms summed and
/// divided by the record length in years. Empty series give 0.
pub fn r_factor(series: &HourlySeries, params: &RainfallParams) -> f64 {
    let span = series.span_hours();
    if span <= 0.0 {
        return 0.0;
    }
    let total_ei: f64 = segment_storms(series, params)
        .iter()
        .filter(|s| s.is_erosive(params))
        .map(|s| s.ei(params))
        .sum();
    total_ei / (span / HOURS_PER_YEAR)
}
