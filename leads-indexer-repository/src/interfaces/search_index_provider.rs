//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, in-memory
//! mocks in tests).

use async_trait::async_trait;
use leads_indexer_shared::IndexMapping;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::{
    BatchOperationSummary, IndexDocumentRequest, MultiGetDocument, PhraseQuery, SearchHit,
};

/// Abstracts the underlying search engine (OpenSearch, Elasticsearch, etc.).
///
/// This trait is the only way the leads tools reach a cluster. Implementations are
/// shared behind an `Arc` between concurrent workers, hence `Send + Sync`.
///
/// All methods return `Result<T, SearchIndexError>`. A well-formed "not found" answer is
/// part of the `Ok` value (`index_exists` returning `false`, a `MultiGetDocument` with
/// `found == false`), never an error.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Check whether an index exists.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` / `Ok(false)` - The index exists / does not exist
    /// * `Err(SearchIndexError)` - Transport or authentication failure
    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError>;

    /// Create an index with default settings and no mapping.
    async fn create_index(&self, index: &str) -> Result<(), SearchIndexError>;

    /// Apply a mapping to an existing index.
    async fn put_mapping(&self, index: &str, mapping: &IndexMapping)
        -> Result<(), SearchIndexError>;

    /// Index one document under an explicit id, overwriting any previous version.
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        source: &Value,
    ) -> Result<(), SearchIndexError>;

    /// Fetch several documents by id in one request.
    ///
    /// # Arguments
    ///
    /// * `index` - The index to read from
    /// * `ids` - Document ids to fetch
    /// * `source_fields` - Only these source fields are returned
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<MultiGetDocument>)` - One entry per requested id, found or not
    /// * `Err(SearchIndexError)` - If the lookup fails as a whole
    async fn multi_get(
        &self,
        index: &str,
        ids: &[String],
        source_fields: &[String],
    ) -> Result<Vec<MultiGetDocument>, SearchIndexError>;

    /// Run a phrase match query and return at most `query.size` hits.
    async fn search_phrase(
        &self,
        index: &str,
        query: &PhraseQuery,
    ) -> Result<Vec<SearchHit>, SearchIndexError>;

    /// Write many documents with a single bulk request.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document outcome; rejected documents are
    ///   reported here, not as an error
    /// * `Err(SearchIndexError)` - If the bulk request fails entirely
    async fn bulk_index(
        &self,
        requests: &[IndexDocumentRequest],
    ) -> Result<BatchOperationSummary, SearchIndexError>;
}
