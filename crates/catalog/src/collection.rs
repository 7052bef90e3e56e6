//! Filterable image collections backed by a STAC ItemCollection file.

use crate::error::{CatalogError, Result};
use crate::stac_models::{StacItem, StacItemCollection};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusle_core::io::read_geotiff;
use rusle_core::{Raster, Region};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parse a `YYYY-MM-DD` date as midnight UTC.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| CatalogError::InvalidDate(s.to_string()))
}

/// A set of scenes that can be narrowed down and read band by band.
///
/// Filters consume and return the collection so queries chain the same way
/// an image collection query does:
///
/// ```ignore
/// let scenes = ImageCollection::from_file("s2.json")?
///     .filter_bounds(&Region::tangier())
///     .filter_date(start, end)
///     .filter_lt("CLOUDY_PIXEL_PERCENTAGE", 5.0);
/// ```
#[derive(Debug, Clone)]
pub struct ImageCollection {
    name: String,
    items: Vec<StacItem>,
    base_dir: PathBuf,
}

impl ImageCollection {
    /// Load an ItemCollection JSON file. Relative asset hrefs resolve
    /// against the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let collection: StacItemCollection = serde_json::from_str(&text)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let name = collection
            .id
            .clone()
            .unwrap_or_else(|| path.display().to_string());
        debug!("loaded {} items from {}", collection.len(), path.display());
        Ok(Self::from_item_collection(name, collection, base_dir))
    }

    pub fn from_item_collection(
        name: impl Into<String>,
        collection: StacItemCollection,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            items: collection.features,
            base_dir: base_dir.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn items(&self) -> &[StacItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&StacItem> {
        self.items.first()
    }

    /// Keep items whose footprint intersects `region`. Items without a
    /// usable bbox are kept.
    pub fn filter_bounds(mut self, region: &Region) -> Self {
        let before = self.items.len();
        self.items.retain(|item| {
            item.bbox
                .as_deref()
                .and_then(Region::from_bbox)
                .map_or(true, |footprint| footprint.intersects(region))
        });
        debug!("{}: filter_bounds kept {}/{}", self.name, self.items.len(), before);
        self
    }

    /// Keep items acquired in `[start, end)`. Items with a missing or
    /// unparseable datetime are dropped.
    pub fn filter_date(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let before = self.items.len();
        self.items.retain(|item| match item_datetime(item) {
            Ok(dt) => dt >= start && dt < end,
            Err(_) => false,
        });
        debug!("{}: filter_date kept {}/{}", self.name, self.items.len(), before);
        self
    }

    /// Keep items whose numeric `property` is strictly below `value`.
    pub fn filter_lt(mut self, property: &str, value: f64) -> Self {
        let before = self.items.len();
        self.items
            .retain(|item| item.numeric_property(property).is_some_and(|v| v < value));
        debug!(
            "{}: filter_lt({} < {}) kept {}/{}",
            self.name,
            property,
            value,
            self.items.len(),
            before
        );
        self
    }

    /// Order by acquisition time; items without a datetime go last.
    pub fn sort_by_datetime(mut self) -> Self {
        self.items
            .sort_by_key(|item| item_datetime(item).map_or(DateTime::<Utc>::MAX_UTC, |d| d));
        self
    }

    /// Fail with [`CatalogError::EmptyCollection`] when no item is left.
    pub fn require_non_empty(self) -> Result<Self> {
        if self.items.is_empty() {
            return Err(CatalogError::EmptyCollection(self.name));
        }
        Ok(self)
    }

    /// Filesystem path of an asset href.
    pub fn resolve_href(&self, href: &str) -> PathBuf {
        let stripped = href.strip_prefix("file://").unwrap_or(href);
        let path = Path::new(stripped);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Read the asset `key` of `item` as a `f64` raster.
    pub fn load_band(&self, item: &StacItem, key: &str) -> Result<Raster<f64>> {
        let asset = item.asset(key).ok_or_else(|| CatalogError::MissingAsset {
            item: item.id.clone(),
            asset: key.to_string(),
        })?;
        let path = self.resolve_href(&asset.href);
        debug!("reading {} of {} from {}", key, item.id, path.display());
        Ok(read_geotiff(&path)?)
    }

    /// Read asset `key` of every item, paired with its acquisition time and
    /// ordered chronologically.
    pub fn load_series(&self, key: &str) -> Result<Vec<(DateTime<Utc>, Raster<f64>)>> {
        let mut series = self
            .items
            .iter()
            .map(|item| Ok((item_datetime(item)?, self.load_band(item, key)?)))
            .collect::<Result<Vec<_>>>()?;
        series.sort_by_key(|(dt, _)| *dt);
        Ok(series)
    }

    /// Read asset `key` of every item in collection order.
    pub fn load_all(&self, key: &str) -> Result<Vec<Raster<f64>>> {
        self.items.iter().map(|item| self.load_band(item, key)).collect()
    }
}

/// Acquisition time of an item.
///
/// Accepts RFC 3339 and offset-less `YYYY-MM-DDTHH:MM:SS` (read as UTC).
pub fn item_datetime(item: &StacItem) -> Result<DateTime<Utc>> {
    let value = item
        .properties
        .datetime
        .as_deref()
        .ok_or_else(|| CatalogError::MissingDatetime(item.id.clone()))?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.and_utc())
        .map_err(|_| CatalogError::InvalidDatetime {
            item: item.id.clone(),
            value: value.to_string(),
        })
}
