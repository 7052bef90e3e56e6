//! # RUSLE Catalog
//!
//! Scene discovery for the factor jobs. A catalog is a STAC ItemCollection
//! (GeoJSON FeatureCollection) on disk whose assets point at local
//! GeoTIFFs: Sentinel-2 surface reflectance scenes for the C factor,
//! ERA5-Land hourly precipitation for the R factor and yearly land-cover
//! maps for the P factor.
//!
//! [`ImageCollection`] narrows a catalog down by bounds, acquisition date
//! and numeric properties such as cloud cover, then loads asset bands as
//! rasters.

pub mod collection;
pub mod error;
pub mod stac_models;

pub use collection::{item_datetime, parse_date, ImageCollection};
pub use error::{CatalogError, Result};
pub use stac_models::{StacAsset, StacItem, StacItemCollection, StacItemProperties, StacLink};
