//! Support-practice factor (P) from land cover
//!
//! Land-cover codes are grouped into broad [`LandCover`] categories and
//! each category carries a P value. Codes outside the table, and nodata,
//! get P = 0.

use crate::imagery::{remap, RemapParams};
use rusle_core::raster::Raster;
use rusle_core::Result;
use std::collections::BTreeMap;
use std::fmt;

/// Broad land-cover categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LandCover {
    Forest,
    Grassland,
    Cropland,
    Urban,
    Water,
    Shrubland,
    Bare,
}

impl LandCover {
    pub const ALL: [LandCover; 7] = [
        LandCover::Forest,
        LandCover::Grassland,
        LandCover::Cropland,
        LandCover::Urban,
        LandCover::Water,
        LandCover::Shrubland,
        LandCover::Bare,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LandCover::Forest => "forest",
            LandCover::Grassland => "grassland",
            LandCover::Cropland => "cropland",
            LandCover::Urban => "urban",
            LandCover::Water => "water",
            LandCover::Shrubland => "shrubland",
            LandCover::Bare => "bare",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for LandCover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Class code → category and category → P value
#[derive(Debug, Clone, PartialEq)]
pub struct SupportTable {
    pub classes: BTreeMap<i64, LandCover>,
    pub values: BTreeMap<LandCover, f64>,
    /// P for unlisted codes and nodata
    pub default_value: f64,
}

impl SupportTable {
    /// Copernicus Global Land Service discrete classification (100 m)
    pub fn copernicus_lulc() -> Self {
        use LandCover::*;
        let mut classes = BTreeMap::new();
        classes.insert(10, Cropland);
        classes.insert(20, Cropland);
        classes.insert(30, Grassland);
        for code in (40..=110).step_by(10) {
            classes.insert(code, Forest);
        }
        classes.insert(120, Shrubland);
        classes.insert(130, Shrubland);
        classes.insert(140, Grassland);
        classes.insert(160, Urban);
        classes.insert(170, Bare);
        classes.insert(180, Water);

        Self {
            classes,
            values: Self::default_values(),
            default_value: 0.0,
        }
    }

    pub fn default_values() -> BTreeMap<LandCover, f64> {
        use LandCover::*;
        [
            (Forest, 0.1),
            (Grassland, 0.3),
            (Cropland, 0.6),
            (Urban, 0.9),
            (Water, 0.01),
            (Shrubland, 0.4),
            (Bare, 1.0),
        ]
        .into_iter()
        .collect()
    }

    /// P for one class code
    pub fn value_of(&self, code: i64) -> f64 {
        self.classes
            .get(&code)
            .and_then(|cover| self.values.get(cover))
            .copied()
            .unwrap_or(self.default_value)
    }

    fn remap_params(&self) -> RemapParams {
        RemapParams::new(
            self.classes.keys().map(|&code| (code, self.value_of(code))),
            self.default_value,
        )
    }
}

impl Default for SupportTable {
    fn default() -> Self {
        Self::copernicus_lulc()
    }
}

/// P grid from a land-cover class grid
pub fn p_factor(lulc: &Raster<f64>, table: &SupportTable) -> Result<Raster<f64>> {
    remap(lulc, &table.remap_params())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copernicus_codes() {
        let t = SupportTable::copernicus_lulc();
        assert_eq!(t.value_of(10), 0.6);
        assert_eq!(t.value_of(20), 0.6);
        assert_eq!(t.value_of(30), 0.3);
        assert_eq!(t.value_of(40), 0.1);
        assert_eq!(t.value_of(110), 0.1);
        assert_eq!(t.value_of(120), 0.4);
        assert_eq!(t.value_of(140), 0.3);
        assert_eq!(t.value_of(160), 0.9);
        assert_eq!(t.value_of(170), 1.0);
        assert_eq!(t.value_of(180), 0.01);
        assert_eq!(t.value_of(150), 0.0);
        assert_eq!(t.value_of(200), 0.0);
    }

    #[test]
    fn raster_with_nodata() {
        let lulc = Raster::from_vec(vec![10.0, 50.0, 180.0, 0.0, f64::NAN, 255.0], 2, 3).unwrap();
        let p = p_factor(&lulc, &SupportTable::default()).unwrap();
        let got: Vec<f64> = p.data().iter().copied().collect();
        assert_eq!(got, vec![0.6, 0.1, 0.01, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn names_round_trip() {
        for cover in LandCover::ALL {
            assert_eq!(LandCover::from_name(cover.name()), Some(cover));
        }
        assert_eq!(LandCover::from_name("wetland"), None);
    }
}
