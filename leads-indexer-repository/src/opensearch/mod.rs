//! OpenSearch implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! using the OpenSearch client, which speaks the Elasticsearch 7 REST API.

mod provider;
mod responses;

pub use provider::OpenSearchProvider;
