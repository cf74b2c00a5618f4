//! In-memory search provider shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use leads_indexer_repository::{
    BatchOperationResult, BatchOperationSummary, IndexDocumentRequest, MultiGetDocument,
    PhraseQuery, SearchHit, SearchIndexError, SearchIndexProvider,
};
use leads_indexer_shared::IndexMapping;
use serde_json::{json, Map, Value};

/// Tracks how many calls of one kind run at the same time.
#[derive(Default)]
pub(crate) struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct State {
    indices: HashMap<String, Option<IndexMapping>>,
    documents: HashMap<String, Vec<(String, Value)>>,
    create_calls: usize,
    mapping_calls: usize,
    next_id: usize,
}

/// A search engine kept in memory.
#[derive(Default)]
pub(crate) struct InMemoryProvider {
    state: Mutex<State>,
    failing_lookup_ids: HashSet<String>,
    rejected_cnpjs: HashSet<String>,
    fail_bulk: bool,
    fail_mapping: bool,
    pub(crate) lookups: Gauge,
    pub(crate) bulks: Gauge,
    pub(crate) largest_lookup: AtomicUsize,
    pub(crate) lookup_calls: AtomicUsize,
}

impl InMemoryProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add an index that already exists.
    pub(crate) fn with_index(self, index: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .indices
            .insert(index.to_string(), None);
        self
    }

    /// Add a company to a reference index, keyed by its CNPJ.
    pub(crate) fn with_company(self, index: &str, cnpj: &str, status: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.indices.entry(index.to_string()).or_insert(None);
            state.documents.entry(index.to_string()).or_default().push((
                cnpj.to_string(),
                json!({ "cnpj": cnpj, "situacao_cadastral": status, "razao_social": "x" }),
            ));
        }
        self
    }

    /// Fail every lookup that asks for `id`.
    pub(crate) fn failing_lookup_for(mut self, id: &str) -> Self {
        self.failing_lookup_ids.insert(id.to_string());
        self
    }

    /// Reject bulk writes of documents with this CNPJ.
    pub(crate) fn rejecting(mut self, cnpj: &str) -> Self {
        self.rejected_cnpjs.insert(cnpj.to_string());
        self
    }

    /// Fail every bulk request at transport level.
    pub(crate) fn failing_bulk(mut self) -> Self {
        self.fail_bulk = true;
        self
    }

    /// Fail every mapping update.
    pub(crate) fn failing_mapping(mut self) -> Self {
        self.fail_mapping = true;
        self
    }

    pub(crate) fn documents(&self, index: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .documents
            .get(index)
            .map(|docs| docs.iter().map(|(_, source)| source.clone()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn mapping(&self, index: &str) -> Option<IndexMapping> {
        self.state.lock().unwrap().indices.get(index).cloned().flatten()
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub(crate) fn mapping_calls(&self) -> usize {
        self.state.lock().unwrap().mapping_calls
    }
}

#[async_trait]
impl SearchIndexProvider for InMemoryProvider {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError> {
        Ok(self.state.lock().unwrap().indices.contains_key(index))
    }

    async fn create_index(&self, index: &str) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        if state.indices.contains_key(index) {
            return Err(SearchIndexError::index_creation(format!(
                "resource_already_exists_exception: {}",
                index
            )));
        }
        state.indices.insert(index.to_string(), None);
        Ok(())
    }

    async fn put_mapping(
        &self,
        index: &str,
        mapping: &IndexMapping,
    ) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().unwrap();
        state.mapping_calls += 1;
        if self.fail_mapping {
            return Err(SearchIndexError::mapping("illegal_argument_exception"));
        }
        match state.indices.get_mut(index) {
            Some(slot) => {
                *slot = Some(mapping.clone());
                Ok(())
            }
            None => Err(SearchIndexError::mapping(format!("no such index: {}", index))),
        }
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        source: &Value,
    ) -> Result<(), SearchIndexError> {
        let mut state = self.state.lock().unwrap();
        let documents = state.documents.entry(index.to_string()).or_default();
        documents.retain(|(existing, _)| existing != id);
        documents.push((id.to_string(), source.clone()));
        Ok(())
    }

    async fn multi_get(
        &self,
        index: &str,
        ids: &[String],
        source_fields: &[String],
    ) -> Result<Vec<MultiGetDocument>, SearchIndexError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.largest_lookup.fetch_max(ids.len(), Ordering::SeqCst);

        self.lookups.enter();
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.lookups.exit();

        if ids.iter().any(|id| self.failing_lookup_ids.contains(id)) {
            return Err(SearchIndexError::connection("connection reset by peer"));
        }

        let state = self.state.lock().unwrap();
        let stored = state.documents.get(index);
        Ok(ids
            .iter()
            .map(|id| {
                let source = stored
                    .and_then(|docs| docs.iter().find(|(doc_id, _)| doc_id == id))
                    .and_then(|(_, source)| source.as_object())
                    .map(|source| {
                        source
                            .iter()
                            .filter(|(field, _)| source_fields.contains(*field))
                            .map(|(field, value)| (field.clone(), value.clone()))
                            .collect::<Map<String, Value>>()
                    });
                MultiGetDocument {
                    id: id.clone(),
                    found: source.is_some(),
                    source,
                }
            })
            .collect())
    }

    async fn search_phrase(
        &self,
        index: &str,
        query: &PhraseQuery,
    ) -> Result<Vec<SearchHit>, SearchIndexError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .documents
            .get(index)
            .into_iter()
            .flatten()
            .filter(|(_, source)| source[&query.field] == query.phrase.as_str())
            .take(query.size)
            .map(|(id, source)| SearchHit {
                id: id.clone(),
                source: source.as_object().cloned().unwrap_or_default(),
            })
            .collect())
    }

    async fn bulk_index(
        &self,
        requests: &[IndexDocumentRequest],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        self.bulks.enter();
        tokio::task::yield_now().await;
        self.bulks.exit();

        if self.fail_bulk {
            return Err(SearchIndexError::connection("connection refused"));
        }

        let mut state = self.state.lock().unwrap();
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let cnpj = request.source["cnpj"].as_str().unwrap_or_default();
            if self.rejected_cnpjs.contains(cnpj) {
                results.push(BatchOperationResult {
                    index: request.index.clone(),
                    id: None,
                    success: false,
                    error: Some(SearchIndexError::document_rejected(
                        400,
                        "mapper_parsing_exception: failed to parse",
                    )),
                });
                continue;
            }

            state.next_id += 1;
            let id = request
                .id
                .clone()
                .unwrap_or_else(|| format!("generated-{}", state.next_id));
            state
                .documents
                .entry(request.index.clone())
                .or_default()
                .push((id.clone(), request.source.clone()));
            results.push(BatchOperationResult {
                index: request.index.clone(),
                id: Some(id),
                success: true,
                error: None,
            });
        }

        Ok(BatchOperationSummary::from_results(results))
    }
}
