//! # Leads Indexer Repository
//!
//! This crate provides traits and implementations for talking to the search engine
//! that stores leads. It includes definitions for errors, the provider interface, the
//! request/response types, and a concrete implementation on top of the OpenSearch
//! client (wire compatible with Elasticsearch 7).

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;
pub mod utils;

pub use config::ConnectionConfig;
pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use opensearch::OpenSearchProvider;
pub use types::{
    BatchOperationResult, BatchOperationSummary, IndexDocumentRequest, MultiGetDocument,
    PhraseQuery, SearchHit,
};
pub use utils::{validate_batch_size, validate_index_name};
