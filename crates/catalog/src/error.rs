//! Error types for catalog access.

use thiserror::Error;

/// Errors produced while reading or querying a catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("item {item} has no asset named {asset}")]
    MissingAsset { item: String, asset: String },

    #[error("item {0} has no datetime")]
    MissingDatetime(String),

    #[error("item {item}: cannot parse datetime {value:?}")]
    InvalidDatetime { item: String, value: String },

    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("no scenes left in {0} after filtering")]
    EmptyCollection(String),

    #[error("core error: {0}")]
    Core(#[from] rusle_core::Error),
}

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
