//! Parsing of search-engine response bodies.

use serde_json::{Map, Value};

use crate::errors::SearchIndexError;
use crate::types::{
    BatchOperationResult, BatchOperationSummary, IndexDocumentRequest, MultiGetDocument, SearchHit,
};

/// Parse the `docs` array of a multi-get response.
///
/// Entries carrying an `error` (e.g. a shard failure for that id) are reported as not
/// found.
pub(crate) fn parse_multi_get(body: &Value) -> Result<Vec<MultiGetDocument>, SearchIndexError> {
    let docs = body
        .get("docs")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchIndexError::parse("Multi-get response has no 'docs' array"))?;

    docs.iter()
        .map(|doc| {
            let id = doc
                .get("_id")
                .and_then(Value::as_str)
                .ok_or_else(|| SearchIndexError::parse("Multi-get entry has no '_id'"))?;
            let found = doc.get("error").is_none()
                && doc.get("found").and_then(Value::as_bool).unwrap_or(false);
            let source = if found {
                doc.get("_source").and_then(Value::as_object).cloned()
            } else {
                None
            };

            Ok(MultiGetDocument {
                id: id.to_string(),
                found,
                source,
            })
        })
        .collect()
}

/// Parse `hits.hits` of a search response.
pub(crate) fn parse_search_hits(body: &Value) -> Result<Vec<SearchHit>, SearchIndexError> {
    let hits = body
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(Value::as_array)
        .ok_or_else(|| SearchIndexError::parse("Search response has no 'hits.hits' array"))?;

    hits.iter()
        .map(|hit| {
            let id = hit
                .get("_id")
                .and_then(Value::as_str)
                .ok_or_else(|| SearchIndexError::parse("Search hit has no '_id'"))?;
            let source = hit
                .get("_source")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_else(Map::new);

            Ok(SearchHit {
                id: id.to_string(),
                source,
            })
        })
        .collect()
}

/// Parse the `items` of a bulk response into a per-request summary.
///
/// Items are matched to requests by position. Requests with no matching item are counted
/// as failed.
pub(crate) fn parse_bulk_response(
    body: &Value,
    requests: &[IndexDocumentRequest],
) -> Result<BatchOperationSummary, SearchIndexError> {
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchIndexError::parse("Bulk response has no 'items' array"))?;

    let results = requests
        .iter()
        .enumerate()
        .map(|(position, request)| {
            let Some(item) = items.get(position) else {
                return BatchOperationResult {
                    index: request.index.clone(),
                    id: request.id.clone(),
                    success: false,
                    error: Some(SearchIndexError::bulk_index(
                        "Bulk response is missing an item for this document",
                    )),
                };
            };

            // Each item is keyed by its action: {"index": {...}}.
            let outcome = item
                .as_object()
                .and_then(|obj| obj.values().next())
                .cloned()
                .unwrap_or(Value::Null);

            let status = outcome
                .get("status")
                .and_then(Value::as_u64)
                .map(|s| s as u16)
                .unwrap_or(0);
            let id = outcome
                .get("_id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| request.id.clone());

            match outcome.get("error") {
                None if (200..300).contains(&status) => BatchOperationResult {
                    index: request.index.clone(),
                    id,
                    success: true,
                    error: None,
                },
                error => BatchOperationResult {
                    index: request.index.clone(),
                    id,
                    success: false,
                    error: Some(SearchIndexError::document_rejected(
                        status,
                        describe_error(error),
                    )),
                },
            }
        })
        .collect();

    Ok(BatchOperationSummary::from_results(results))
}

fn describe_error(error: Option<&Value>) -> String {
    match error {
        Some(Value::Object(obj)) => {
            let kind = obj.get("type").and_then(Value::as_str).unwrap_or("unknown");
            let reason = obj.get("reason").and_then(Value::as_str).unwrap_or("");
            format!("{}: {}", kind, reason)
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "unexpected status".to_string(),
    }
}
