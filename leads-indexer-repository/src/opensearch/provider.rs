//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use leads_indexer_shared::IndexMapping;
use opensearch::{
    auth::Credentials,
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{IndicesCreateParts, IndicesExistsParts, IndicesPutMappingParts},
    BulkParts, IndexParts, MgetParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::config::ConnectionConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::responses;
use crate::types::{
    BatchOperationSummary, IndexDocumentRequest, MultiGetDocument, PhraseQuery, SearchHit,
};
use crate::utils;

/// Largest number of ids sent in one multi-get request.
pub const MAX_MULTI_GET_IDS: usize = 1000;

/// OpenSearch provider implementation.
///
/// Wraps one cluster connection. The underlying HTTP client pools connections, so a single
/// provider can be shared by concurrent workers.
///
/// # Example
///
/// ```ignore
/// use leads_indexer_repository::{ConnectionConfig, OpenSearchProvider, SearchIndexProvider};
///
/// let config = ConnectionConfig::new("http://localhost:9200");
/// let provider = OpenSearchProvider::new(&config)?;
///
/// if !provider.index_exists("acme-leads").await? {
///     provider.create_index("acme-leads").await?;
/// }
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    url: String,
}

impl OpenSearchProvider {
    /// Create a new provider for the cluster described by `config`.
    ///
    /// No request is sent; an unreachable cluster surfaces on the first call.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or the transport cannot be built
    pub fn new(config: &ConnectionConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let Some((username, password)) = config.credentials() {
            builder = builder.auth(Credentials::Basic(
                username.to_string(),
                password.to_string(),
            ));
        }
        let transport = builder
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %config.url,
            authenticated = config.credentials().is_some(),
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// The cluster URL this provider talks to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Build the multi-get body, projecting `source_fields` on every document.
    fn multi_get_body(ids: &[String], source_fields: &[String]) -> Value {
        let docs: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "_id": id, "_source": source_fields }))
            .collect();
        json!({ "docs": docs })
    }

    /// Build the search body for a phrase query.
    fn phrase_query_body(query: &PhraseQuery) -> Value {
        let mut match_phrase = serde_json::Map::new();
        match_phrase.insert(query.field.clone(), json!(query.phrase));

        json!({
            "size": query.size,
            "query": { "match_phrase": match_phrase }
        })
    }

    /// Build the newline-delimited bulk body: one action line and one source line per
    /// document.
    fn bulk_body(requests: &[IndexDocumentRequest]) -> Vec<JsonBody<Value>> {
        let mut body = Vec::with_capacity(requests.len() * 2);
        for request in requests {
            let mut action = serde_json::Map::new();
            action.insert("_index".to_string(), json!(request.index));
            if let Some(ref id) = request.id {
                action.insert("_id".to_string(), json!(id));
            }
            body.push(JsonBody::new(json!({ "index": action })));
            body.push(JsonBody::new(request.source.clone()));
        }
        body
    }

    /// Turn a non-success response into an error built by `make_error`.
    async fn check_status(
        response: Response,
        operation: &str,
        make_error: fn(String) -> SearchIndexError,
    ) -> Result<Response, SearchIndexError> {
        let status = response.status_code();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %error_body, operation, "Request failed");

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(SearchIndexError::connection(format!(
                "{} was not authorized ({}): {}",
                operation, status, error_body
            )));
        }

        Err(make_error(format!(
            "{} failed with status {}: {}",
            operation, status, error_body
        )))
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        // 404 is the normal "does not exist" answer.
        if response.status_code().as_u16() == 404 {
            debug!(index = %index, "Index does not exist");
            return Ok(false);
        }

        Self::check_status(response, "Index exists check", SearchIndexError::LookupError).await?;
        debug!(index = %index, "Index exists");
        Ok(true)
    }

    async fn create_index(&self, index: &str) -> Result<(), SearchIndexError> {
        utils::validate_index_name(index)?;

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::check_status(response, "Index creation", SearchIndexError::IndexCreationError)
            .await?;

        info!(index = %index, "Index created");
        Ok(())
    }

    async fn put_mapping(
        &self,
        index: &str,
        mapping: &IndexMapping,
    ) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[index]))
            .body(mapping.to_json())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::check_status(response, "Put mapping", SearchIndexError::MappingError).await?;

        info!(index = %index, fields = mapping.len(), "Mapping applied");
        Ok(())
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        source: &Value,
    ) -> Result<(), SearchIndexError> {
        if id.is_empty() {
            return Err(SearchIndexError::validation("Document id cannot be empty"));
        }

        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(source.clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::check_status(response, "Index document", SearchIndexError::IndexError).await?;

        debug!(index = %index, doc_id = %id, "Document indexed");
        Ok(())
    }

    async fn multi_get(
        &self,
        index: &str,
        ids: &[String],
        source_fields: &[String],
    ) -> Result<Vec<MultiGetDocument>, SearchIndexError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        utils::validate_batch_size(ids.len(), MAX_MULTI_GET_IDS)?;

        let response = self
            .client
            .mget(MgetParts::Index(index))
            .body(Self::multi_get_body(ids, source_fields))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let response =
            Self::check_status(response, "Multi-get", SearchIndexError::LookupError).await?;
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let docs = responses::parse_multi_get(&body)?;
        debug!(
            index = %index,
            requested = ids.len(),
            found = docs.iter().filter(|d| d.found).count(),
            "Multi-get completed"
        );
        Ok(docs)
    }

    async fn search_phrase(
        &self,
        index: &str,
        query: &PhraseQuery,
    ) -> Result<Vec<SearchHit>, SearchIndexError> {
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(Self::phrase_query_body(query))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let response = Self::check_status(response, "Search", SearchIndexError::SearchError).await?;
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let hits = responses::parse_search_hits(&body)?;
        debug!(
            index = %index,
            field = %query.field,
            phrase = %query.phrase,
            hits = hits.len(),
            "Phrase search completed"
        );
        Ok(hits)
    }

    async fn bulk_index(
        &self,
        requests: &[IndexDocumentRequest],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if requests.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        let response = self
            .client
            .bulk(BulkParts::None)
            .body(Self::bulk_body(requests))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let response =
            Self::check_status(response, "Bulk index", SearchIndexError::BulkIndexError).await?;
        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = responses::parse_bulk_response(&body, requests)?;
        debug!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk request completed"
        );
        Ok(summary)
    }
}
