//! Search index error types.
//!
//! This module defines the unified error type for all search index operations,
//! including both low-level backend errors and request validation errors.

use thiserror::Error;

/// Unified errors from search index operations.
///
/// Used by the `SearchIndexProvider` trait for every call to the search engine. A
/// well-formed "not found" answer is never an error; these variants cover transport,
/// authentication, rejected requests and unparseable responses.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Validation error (e.g., invalid index name, empty id).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to reach the search index backend, or the backend rejected the credentials.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to index a single document.
    #[error("Index error: {0}")]
    IndexError(String),

    /// Bulk indexing request failed as a whole.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to create an index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to apply a mapping to an index.
    #[error("Mapping error: {0}")]
    MappingError(String),

    /// Existence check or multi-get lookup failed.
    #[error("Lookup error: {0}")]
    LookupError(String),

    /// Search request failed.
    #[error("Search error: {0}")]
    SearchError(String),

    /// Failed to parse response from search index backend.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A single bulk item was rejected by the backend.
    #[error("Document rejected ({status}): {reason}")]
    DocumentRejected { status: u16, reason: String },

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index error.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a mapping error.
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::MappingError(msg.into())
    }

    /// Create a search error.
    pub fn search(msg: impl Into<String>) -> Self {
        Self::SearchError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a rejected document error.
    pub fn document_rejected(status: u16, reason: impl Into<String>) -> Self {
        Self::DocumentRejected {
            status,
            reason: reason.into(),
        }
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }

    /// Create an unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }
}
