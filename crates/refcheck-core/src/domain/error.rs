//! Catalog-level error taxonomy.
//!
//! Every variant here is fatal for a run: without a readable catalog there
//! is nothing to test.

use std::path::PathBuf;

/// Errors produced while reading the track catalog or exercise metadata.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid metadata for exercise {slug}: {reason}")]
    InvalidMetadata { slug: String, reason: String },
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
