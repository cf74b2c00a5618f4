//! Request and response types for search index operations.

use serde_json::{Map, Value};

use crate::errors::SearchIndexError;

/// Request to write one document as part of a bulk operation.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDocumentRequest {
    /// Destination index.
    pub index: String,
    /// Explicit document id. `None` lets the search engine assign one.
    pub id: Option<String>,
    /// The document `_source`.
    pub source: Value,
}

impl IndexDocumentRequest {
    /// Create a request with an engine-assigned id.
    pub fn new(index: impl Into<String>, source: Value) -> Self {
        Self {
            index: index.into(),
            id: None,
            source,
        }
    }

    /// Create a request with an explicit id.
    pub fn with_id(index: impl Into<String>, id: impl Into<String>, source: Value) -> Self {
        Self {
            index: index.into(),
            id: Some(id.into()),
            source,
        }
    }
}

/// One document returned by a multi-get lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiGetDocument {
    /// The requested id.
    pub id: String,
    /// Whether the document exists.
    pub found: bool,
    /// Projected source fields, when found.
    pub source: Option<Map<String, Value>>,
}

impl MultiGetDocument {
    /// Read a string field from the projected source.
    pub fn source_str(&self, field: &str) -> Option<&str> {
        self.source.as_ref()?.get(field)?.as_str()
    }
}

/// Single-field phrase query with a result-size cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseQuery {
    /// Field to match against.
    pub field: String,
    /// Phrase to match.
    pub phrase: String,
    /// Maximum number of hits returned. Matches beyond this are not fetched.
    pub size: usize,
}

impl PhraseQuery {
    /// Create a phrase query.
    pub fn new(field: impl Into<String>, phrase: impl Into<String>, size: usize) -> Self {
        Self {
            field: field.into(),
            phrase: phrase.into(),
            size,
        }
    }
}

/// One hit of a search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// The document id.
    pub id: String,
    /// The document source.
    pub source: Map<String, Value>,
}

/// Result of a batch operation for a single item.
///
/// This struct represents the outcome of writing one document within a bulk request.
/// It indicates whether the write succeeded and includes error details if it failed.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// Destination index.
    pub index: String,
    /// The document id, when known.
    pub id: Option<String>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// This struct provides a complete overview of a bulk operation, including the total
/// number of items processed, how many succeeded and failed, and detailed results for
/// each individual item. This allows callers to handle partial failures gracefully.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// An empty summary.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a summary from individual results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Fold another summary into this one.
    pub fn absorb(&mut self, other: BatchOperationSummary) {
        self.total += other.total;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.results.extend(other.results);
    }

    /// Iterate over failed items.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
