//! Coordinate reference system identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference system, identified by EPSG code or WKT text.
///
/// Only identification is modelled here; no reprojection is performed.
/// Every input to a factor job must already share the region's CRS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    epsg: Option<u32>,
    wkt: Option<String>,
}

impl CRS {
    /// CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            wkt: None,
        }
    }

    /// CRS from WKT text
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            epsg: None,
            wkt: Some(wkt.into()),
        }
    }

    /// WGS84 geographic (EPSG:4326), the CRS of every factor export
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Parse identifiers of the form `EPSG:4326` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        let (prefix, code) = trimmed.split_once(':')?;
        if !prefix.eq_ignore_ascii_case("epsg") {
            return None;
        }
        code.trim().parse().ok().map(Self::from_epsg)
    }

    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Whether coordinates are angular (degrees).
    ///
    /// EPSG geographic 2D systems live in the 4001..=4999 block.
    pub fn is_geographic(&self) -> bool {
        match self.epsg {
            Some(code) => (4001..=4999).contains(&code),
            None => self
                .wkt
                .as_deref()
                .map(|w| w.trim_start().starts_with("GEOGCS") || w.trim_start().starts_with("GEOGCRS"))
                .unwrap_or(false),
        }
    }

    /// Whether two CRS definitions refer to the same system
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }
        false
    }

    /// Short identifier used in logs and reports
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            let head: String = wkt.chars().take(50).collect();
            return format!("WKT:{}", head);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::wgs84()
    }
}
