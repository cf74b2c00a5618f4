//! Copier module for the filler.
//!
//! Copies the documents matching a phrase query from a remote cluster into a local one,
//! keeping their ids.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};

use leads_indexer_repository::{PhraseQuery, SearchIndexError, SearchIndexProvider};

/// Field the default categories are matched on.
pub const DEFAULT_FIELD: &str = "segmento";

/// Categories copied when none are given.
pub const SEGMENTS: [&str; 5] = [
    "serviços",
    "comércio",
    "indústria",
    "construção civil",
    "agropecuária",
];

/// Most documents copied per category unless configured otherwise.
///
/// Matches beyond this are not fetched, so they are not copied.
pub const DEFAULT_MAX_DOCUMENTS: usize = 10_000;

/// Outcome of copying one category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryReport {
    /// Matches fetched from the remote cluster.
    pub fetched: usize,
    /// Documents written to the local cluster.
    pub copied: usize,
    /// Documents the local cluster did not accept.
    pub failed: usize,
}

/// Outcome of a run over several categories.
#[derive(Debug, Default)]
pub struct FillReport {
    /// One entry per category, in run order.
    pub categories: Vec<(String, Result<CategoryReport, SearchIndexError>)>,
}

impl FillReport {
    /// Documents copied over every category.
    pub fn copied(&self) -> usize {
        self.successes().map(|report| report.copied).sum()
    }

    /// Documents that failed to be written, over every category.
    pub fn failed(&self) -> usize {
        self.successes().map(|report| report.failed).sum()
    }

    /// Categories whose search failed.
    pub fn failed_categories(&self) -> impl Iterator<Item = (&str, &SearchIndexError)> {
        self.categories
            .iter()
            .filter_map(|(category, result)| result.as_ref().err().map(|e| (category.as_str(), e)))
    }

    fn successes(&self) -> impl Iterator<Item = &CategoryReport> {
        self.categories
            .iter()
            .filter_map(|(_, result)| result.as_ref().ok())
    }
}

/// Copies phrase-query matches between two clusters.
pub struct CrossClusterCopier {
    remote: Arc<dyn SearchIndexProvider>,
    local: Arc<dyn SearchIndexProvider>,
    index: String,
    max_documents: usize,
}

impl CrossClusterCopier {
    /// Create a copier for `index`, which has the same name on both clusters.
    pub fn new(
        remote: Arc<dyn SearchIndexProvider>,
        local: Arc<dyn SearchIndexProvider>,
        index: impl Into<String>,
    ) -> Self {
        Self {
            remote,
            local,
            index: index.into(),
            max_documents: DEFAULT_MAX_DOCUMENTS,
        }
    }

    /// Change how many documents are copied per category.
    ///
    /// The value is kept within `1..=DEFAULT_MAX_DOCUMENTS`, the default result window of
    /// a single search.
    pub fn with_max_documents(mut self, max_documents: usize) -> Self {
        let capped = max_documents.clamp(1, DEFAULT_MAX_DOCUMENTS);
        if capped != max_documents {
            warn!(requested = max_documents, used = capped, "Adjusting max documents per category");
        }
        self.max_documents = capped;
        self
    }

    /// Copy the documents whose `field` matches the phrase `value`.
    ///
    /// At most `max_documents` matches are copied, in the order the remote cluster ranks
    /// them. Each document keeps its id and source, so copying again overwrites it. A
    /// document the local cluster refuses is counted and skipped.
    ///
    /// # Returns
    ///
    /// * `Ok(CategoryReport)` - What was fetched and written
    /// * `Err(SearchIndexError)` - If the remote search failed; nothing was written
    #[instrument(skip(self), fields(index = %self.index))]
    pub async fn copy_matching(
        &self,
        field: &str,
        value: &str,
    ) -> Result<CategoryReport, SearchIndexError> {
        let query = PhraseQuery::new(field, value, self.max_documents);
        let hits = self.remote.search_phrase(&self.index, &query).await?;

        let mut report = CategoryReport {
            fetched: hits.len(),
            ..CategoryReport::default()
        };

        for hit in hits {
            let source = Value::Object(hit.source);
            match self.local.index_document(&self.index, &hit.id, &source).await {
                Ok(()) => report.copied += 1,
                Err(e) => {
                    warn!(doc_id = %hit.id, error = %e, "Failed to copy document");
                    report.failed += 1;
                }
            }
        }

        info!(
            fetched = report.fetched,
            copied = report.copied,
            failed = report.failed,
            "Category copied"
        );
        Ok(report)
    }

    /// Copy every category in turn.
    ///
    /// Categories are independent: a failed one is recorded and the run moves on, and
    /// documents already written are kept.
    pub async fn run<S: AsRef<str>>(&self, field: &str, categories: &[S]) -> FillReport {
        let mut report = FillReport::default();

        for category in categories {
            let category = category.as_ref();
            let result = self.copy_matching(field, category).await;
            if let Err(ref e) = result {
                warn!(field, category, error = %e, "Skipping category");
            }
            report.categories.push((category.to_string(), result));
        }

        info!(
            categories = report.categories.len(),
            failed_categories = report.failed_categories().count(),
            copied = report.copied(),
            failed = report.failed(),
            "Fill completed"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use leads_indexer_repository::{
        BatchOperationSummary, IndexDocumentRequest, MultiGetDocument, SearchHit,
    };
    use leads_indexer_shared::IndexMapping;
    use serde_json::json;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Mutex;

    /// Mock cluster holding one index in memory.
    #[derive(Default)]
    struct MockCluster {
        documents: Mutex<BTreeMap<String, Value>>,
        failing_phrases: HashSet<String>,
        rejected_ids: HashSet<String>,
        largest_request: Mutex<usize>,
    }

    impl MockCluster {
        fn with_documents(segment: &str, count: usize) -> Self {
            let cluster = Self::default();
            cluster.add(segment, count);
            cluster
        }

        fn add(&self, segment: &str, count: usize) {
            let mut documents = self.documents.lock().unwrap();
            let offset = documents.len();
            for n in 0..count {
                documents.insert(
                    format!("doc-{:06}", offset + n),
                    json!({ "segmento": segment, "razao_social": format!("Empresa {}", n) }),
                );
            }
        }

        fn count(&self) -> usize {
            self.documents.lock().unwrap().len()
        }

        fn get(&self, id: &str) -> Option<Value> {
            self.documents.lock().unwrap().get(id).cloned()
        }
    }

    #[async_trait]
    impl SearchIndexProvider for MockCluster {
        async fn index_exists(&self, _index: &str) -> Result<bool, SearchIndexError> {
            Ok(true)
        }

        async fn create_index(&self, _index: &str) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn put_mapping(
            &self,
            _index: &str,
            _mapping: &IndexMapping,
        ) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn index_document(
            &self,
            _index: &str,
            id: &str,
            source: &Value,
        ) -> Result<(), SearchIndexError> {
            if self.rejected_ids.contains(id) {
                return Err(SearchIndexError::index("mapper_parsing_exception"));
            }
            self.documents
                .lock()
                .unwrap()
                .insert(id.to_string(), source.clone());
            Ok(())
        }

        async fn multi_get(
            &self,
            _index: &str,
            _ids: &[String],
            _source_fields: &[String],
        ) -> Result<Vec<MultiGetDocument>, SearchIndexError> {
            Ok(Vec::new())
        }

        async fn search_phrase(
            &self,
            _index: &str,
            query: &PhraseQuery,
        ) -> Result<Vec<SearchHit>, SearchIndexError> {
            if self.failing_phrases.contains(&query.phrase) {
                return Err(SearchIndexError::search("search_phase_execution_exception"));
            }
            *self.largest_request.lock().unwrap() = query.size;

            Ok(self
                .documents
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, source)| source[query.field.as_str()] == query.phrase.as_str())
                .take(query.size)
                .map(|(id, source)| SearchHit {
                    id: id.clone(),
                    source: source.as_object().cloned().unwrap_or_default(),
                })
                .collect())
        }

        async fn bulk_index(
            &self,
            _requests: &[IndexDocumentRequest],
        ) -> Result<BatchOperationSummary, SearchIndexError> {
            Ok(BatchOperationSummary::empty())
        }
    }

    fn copier(remote: Arc<MockCluster>, local: Arc<MockCluster>) -> CrossClusterCopier {
        CrossClusterCopier::new(remote, local, "empresas")
    }

    #[tokio::test]
    async fn test_copy_keeps_ids_and_sources() {
        let remote = Arc::new(MockCluster::with_documents("serviços", 3));
        remote.add("comércio", 2);
        let local = Arc::new(MockCluster::default());

        let report = copier(remote.clone(), local.clone())
            .copy_matching("segmento", "serviços")
            .await
            .unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.copied, 3);
        assert_eq!(local.count(), 3);
        assert_eq!(local.get("doc-000000"), remote.get("doc-000000"));
        assert_eq!(local.get("doc-000003"), None);
    }

    #[tokio::test]
    async fn test_copy_is_idempotent() {
        let remote = Arc::new(MockCluster::with_documents("indústria", 25));
        let local = Arc::new(MockCluster::default());
        let copier = copier(remote, local.clone());

        copier.copy_matching("segmento", "indústria").await.unwrap();
        let after_first = local.count();
        copier.copy_matching("segmento", "indústria").await.unwrap();

        assert_eq!(after_first, 25);
        assert_eq!(local.count(), after_first);
    }

    #[tokio::test]
    async fn test_copy_stops_at_max_documents() {
        let remote = Arc::new(MockCluster::with_documents("agropecuária", 10_050));
        let local = Arc::new(MockCluster::default());

        let report = copier(remote.clone(), local.clone())
            .copy_matching("segmento", "agropecuária")
            .await
            .unwrap();

        assert_eq!(*remote.largest_request.lock().unwrap(), 10_000);
        assert_eq!(report.fetched, 10_000);
        assert_eq!(report.copied, 10_000);
        assert_eq!(local.count(), 10_000);
    }

    #[tokio::test]
    async fn test_rejected_documents_are_counted() {
        let remote = Arc::new(MockCluster::with_documents("serviços", 4));
        let local = Arc::new(MockCluster {
            rejected_ids: HashSet::from(["doc-000001".to_string()]),
            ..MockCluster::default()
        });

        let report = copier(remote, local.clone())
            .copy_matching("segmento", "serviços")
            .await
            .unwrap();

        assert_eq!(report.copied, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(local.count(), 3);
    }

    #[tokio::test]
    async fn test_failed_category_does_not_stop_the_run() {
        let remote = MockCluster {
            failing_phrases: HashSet::from(["comércio".to_string()]),
            ..MockCluster::default()
        };
        remote.add("serviços", 2);
        remote.add("comércio", 2);
        remote.add("indústria", 2);
        let local = Arc::new(MockCluster::default());

        let report = copier(Arc::new(remote), local.clone())
            .run(DEFAULT_FIELD, &SEGMENTS)
            .await;

        assert_eq!(report.categories.len(), 5);
        assert_eq!(report.copied(), 4);
        let failed: Vec<&str> = report.failed_categories().map(|(c, _)| c).collect();
        assert_eq!(failed, ["comércio"]);
        assert_eq!(local.count(), 4);
    }

    #[tokio::test]
    async fn test_configured_max_documents() {
        let remote = Arc::new(MockCluster::with_documents("serviços", 30));
        let local = Arc::new(MockCluster::default());

        let report = copier(remote, local)
            .with_max_documents(10)
            .run(DEFAULT_FIELD, &["serviços".to_string()])
            .await;

        assert_eq!(report.copied(), 10);
    }

    #[tokio::test]
    async fn test_max_documents_cannot_exceed_result_window() {
        let remote = Arc::new(MockCluster::with_documents("comércio", 10_020));
        let local = Arc::new(MockCluster::default());

        let report = copier(remote.clone(), local)
            .with_max_documents(50_000)
            .copy_matching("segmento", "comércio")
            .await
            .unwrap();

        assert_eq!(*remote.largest_request.lock().unwrap(), DEFAULT_MAX_DOCUMENTS);
        assert_eq!(report.copied, DEFAULT_MAX_DOCUMENTS);
    }
}
