//! Error types for the leads upload pipeline.

use std::path::PathBuf;

use leads_indexer_repository::SearchIndexError;
use thiserror::Error;

/// Errors that can occur while uploading a lead list.
#[derive(Error, Debug)]
pub enum UploadError {
    /// The input file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The input file could not be read or parsed as CSV.
    #[error("CSV error: {0}")]
    CsvError(String),

    /// A column required downstream is absent from the input.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// The derived index name is not accepted by the search engine.
    #[error("Invalid index name: {0}")]
    InvalidIndexName(String),

    /// A search-engine call failed.
    #[error("Search index error: {0}")]
    SearchIndex(#[from] SearchIndexError),

    /// Every bulk request failed to reach the search engine.
    #[error("Upload failed: {0}")]
    UploadFailed(String),
}

impl UploadError {
    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    /// Create a CSV error.
    pub fn csv(msg: impl Into<String>) -> Self {
        Self::CsvError(msg.into())
    }

    /// Create a missing column error.
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn(column.into())
    }

    /// Create an invalid index name error.
    pub fn invalid_index_name(msg: impl Into<String>) -> Self {
        Self::InvalidIndexName(msg.into())
    }

    /// Create an upload failed error.
    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }
}

impl From<csv::Error> for UploadError {
    fn from(err: csv::Error) -> Self {
        Self::CsvError(err.to_string())
    }
}
