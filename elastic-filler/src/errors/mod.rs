//! Error types for the filler.

use leads_indexer_repository::SearchIndexError;
use thiserror::Error;

/// Errors that can occur while starting or running the filler.
#[derive(Error, Debug)]
pub enum FillerError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A search-engine call failed.
    #[error("Search index error: {0}")]
    SearchIndex(#[from] SearchIndexError),

    /// No category could be copied.
    #[error("Fill failed: {0}")]
    FillFailed(String),
}

impl FillerError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a fill failed error.
    pub fn fill_failed(msg: impl Into<String>) -> Self {
        Self::FillFailed(msg.into())
    }
}
