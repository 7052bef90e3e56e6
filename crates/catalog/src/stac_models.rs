//! STAC (SpatioTemporal Asset Catalog) data types.
//!
//! Serde models for the ItemCollection files that describe the scenes
//! available to each factor job: acquisition datetime, footprint bbox,
//! cloud-cover properties and the per-band GeoTIFF assets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A STAC Item Collection (GeoJSON FeatureCollection).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItemCollection {
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<StacItem>,

    /// Collection identifier, e.g. `"ECMWF/ERA5_LAND/HOURLY"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<StacLink>,
}

impl StacItemCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A single STAC Item (GeoJSON Feature): one scene.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItem {
    #[serde(rename = "type")]
    pub type_: String,

    pub id: String,

    /// Footprint `[west, south, east, north]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    pub properties: StacItemProperties,

    #[serde(default)]
    pub assets: HashMap<String, StacAsset>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<StacLink>,
}

impl StacItem {
    pub fn asset(&self, key: &str) -> Option<&StacAsset> {
        self.assets.get(key)
    }

    /// Numeric property lookup.
    ///
    /// `eo:cloud_cover` maps to the modelled field; any other name is read
    /// from the extra properties (for example Sentinel-2's
    /// `CLOUDY_PIXEL_PERCENTAGE`).
    pub fn numeric_property(&self, name: &str) -> Option<f64> {
        if name == "eo:cloud_cover" {
            return self.properties.eo_cloud_cover;
        }
        self.properties.extra.get(name).and_then(|v| v.as_f64())
    }
}

/// STAC Item properties.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StacItemProperties {
    /// RFC 3339 datetime of acquisition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    /// Cloud cover percentage (EO extension).
    #[serde(rename = "eo:cloud_cover", default, skip_serializing_if = "Option::is_none")]
    pub eo_cloud_cover: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// All other properties.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A STAC Asset: one band file of a scene.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacAsset {
    /// Path or `file://` URL, relative paths resolve against the catalog file.
    pub href: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

/// A STAC Link.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacLink {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}
