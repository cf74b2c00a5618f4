//! Filter module for the uploader.
//!
//! Keeps only the leads whose company is registered as active in a reference index.
//! Candidates are looked up in chunks, and the chunks run concurrently on a bounded
//! number of workers.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use leads_indexer_repository::{SearchIndexError, SearchIndexProvider};
use leads_indexer_shared::{LeadDocument, CNPJ_FIELD};

/// Largest number of CNPJs looked up in one request.
pub const MAX_FILTER_CHUNK_SIZE: usize = 1000;

/// Default reference company index.
pub const DEFAULT_REFERENCE_INDEX: &str = "empresasdobrasilv12";

/// Default status field of the reference index.
pub const DEFAULT_STATUS_FIELD: &str = "situacao_cadastral";

/// Status value of an active company.
pub const DEFAULT_ACTIVE_VALUE: &str = "ATIVA";

/// Configuration for the active-company filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    /// Reference index keyed by CNPJ.
    pub reference_index: String,
    /// Field holding the registration status.
    pub status_field: String,
    /// Status value that marks a company as active.
    pub active_value: String,
    /// CNPJs per lookup. Values above [`MAX_FILTER_CHUNK_SIZE`] are capped.
    pub chunk_size: usize,
    /// Lookups allowed in flight at once.
    pub workers: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            reference_index: DEFAULT_REFERENCE_INDEX.to_string(),
            status_field: DEFAULT_STATUS_FIELD.to_string(),
            active_value: DEFAULT_ACTIVE_VALUE.to_string(),
            chunk_size: MAX_FILTER_CHUNK_SIZE,
            workers: thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

/// Result of filtering a set of candidates.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Candidates whose company is active. Order is unspecified.
    pub active: Vec<LeadDocument>,
    /// Number of candidates submitted.
    pub candidates: usize,
    /// Chunks whose lookup failed.
    pub dropped_chunks: usize,
    /// Candidates lost with those chunks.
    pub dropped_candidates: usize,
}

impl FilterOutcome {
    /// Candidates that were looked up and found missing or inactive.
    pub fn excluded(&self) -> usize {
        self.candidates - self.active.len() - self.dropped_candidates
    }
}

/// Split `items` into consecutive chunks of at most `size` items.
///
/// A `size` of zero is treated as one.
pub fn divide_into_chunks<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let size = size.max(1);
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
    let mut items = items.into_iter().peekable();

    while items.peek().is_some() {
        chunks.push(items.by_ref().take(size).collect());
    }
    chunks
}

/// Reference index settings shared by every lookup task.
struct Reference {
    index: String,
    status_field: String,
    active_value: String,
    source_fields: Vec<String>,
}

/// Filter that checks leads against the reference company index.
pub struct ActiveCompanyFilter {
    provider: Arc<dyn SearchIndexProvider>,
    config: FilterConfig,
}

impl ActiveCompanyFilter {
    /// Create a filter with the default configuration.
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self::with_config(provider, FilterConfig::default())
    }

    /// Create a filter with custom configuration.
    pub fn with_config(provider: Arc<dyn SearchIndexProvider>, config: FilterConfig) -> Self {
        Self { provider, config }
    }

    /// Keep the candidates whose CNPJ is in the reference index with an active status.
    ///
    /// A chunk whose lookup fails is logged and its candidates are dropped; the count is
    /// reported in the outcome. CNPJs missing from the reference index are excluded.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub async fn filter(&self, candidates: Vec<LeadDocument>) -> FilterOutcome {
        let total = candidates.len();
        let chunk_size = self.config.chunk_size.clamp(1, MAX_FILTER_CHUNK_SIZE);
        let chunks = divide_into_chunks(candidates, chunk_size);

        debug!(
            chunks = chunks.len(),
            chunk_size,
            workers = self.config.workers,
            "Looking up candidates"
        );

        let reference = Arc::new(Reference {
            index: self.config.reference_index.clone(),
            status_field: self.config.status_field.clone(),
            active_value: self.config.active_value.clone(),
            source_fields: vec![CNPJ_FIELD.to_string(), self.config.status_field.clone()],
        });
        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));

        let mut chunk_sizes = Vec::with_capacity(chunks.len());
        let mut handles = Vec::with_capacity(chunks.len());
        for (chunk_index, chunk) in chunks.into_iter().enumerate() {
            chunk_sizes.push(chunk.len());

            let provider = Arc::clone(&self.provider);
            let reference = Arc::clone(&reference);
            let semaphore = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| SearchIndexError::unknown(e.to_string()))?;
                filter_chunk(provider.as_ref(), &reference, chunk_index, chunk).await
            }));
        }

        let results = join_all(handles).await;

        let mut outcome = FilterOutcome {
            candidates: total,
            ..FilterOutcome::default()
        };
        for (chunk_index, (result, size)) in results.into_iter().zip(chunk_sizes).enumerate() {
            match result {
                Ok(Ok(active)) => outcome.active.extend(active),
                Ok(Err(e)) => {
                    warn!(chunk = chunk_index, size, error = %e, "Dropping chunk after failed lookup");
                    outcome.dropped_chunks += 1;
                    outcome.dropped_candidates += size;
                }
                Err(e) => {
                    warn!(chunk = chunk_index, size, error = %e, "Lookup task did not complete");
                    outcome.dropped_chunks += 1;
                    outcome.dropped_candidates += size;
                }
            }
        }

        info!(
            candidates = outcome.candidates,
            active = outcome.active.len(),
            excluded = outcome.excluded(),
            dropped_chunks = outcome.dropped_chunks,
            dropped_candidates = outcome.dropped_candidates,
            "Active-company filter completed"
        );
        outcome
    }
}

/// Look one chunk up and return its active candidates.
async fn filter_chunk(
    provider: &dyn SearchIndexProvider,
    reference: &Reference,
    chunk_index: usize,
    chunk: Vec<LeadDocument>,
) -> Result<Vec<LeadDocument>, SearchIndexError> {
    let ids: Vec<String> = chunk.iter().map(|lead| lead.cnpj.clone()).collect();

    let documents = provider
        .multi_get(&reference.index, &ids, &reference.source_fields)
        .await?;

    let active: HashSet<String> = documents
        .into_iter()
        .filter(|doc| {
            doc.found && doc.source_str(&reference.status_field) == Some(reference.active_value.as_str())
        })
        .map(|doc| doc.id)
        .collect();

    debug!(
        chunk = chunk_index,
        looked_up = ids.len(),
        active = active.len(),
        "Chunk filtered"
    );

    Ok(chunk
        .into_iter()
        .filter(|lead| active.contains(&lead.cnpj))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryProvider;
    use std::sync::atomic::Ordering;

    const REFERENCE: &str = DEFAULT_REFERENCE_INDEX;

    fn lead(cnpj: &str) -> LeadDocument {
        LeadDocument::new(cnpj, "Acme")
    }

    fn config(chunk_size: usize, workers: usize) -> FilterConfig {
        FilterConfig {
            chunk_size,
            workers,
            ..FilterConfig::default()
        }
    }

    fn cnpj(n: usize) -> String {
        format!("{:014}", n)
    }

    #[test]
    fn test_divide_into_chunks() {
        let chunks = divide_into_chunks((0..2500).collect::<Vec<_>>(), 1000);
        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, [1000, 1000, 500]);
        assert_eq!(chunks[2][0], 2000);

        assert!(divide_into_chunks(Vec::<u8>::new(), 10).is_empty());
        assert_eq!(divide_into_chunks(vec![1, 2], 0).len(), 2);
    }

    #[tokio::test]
    async fn test_only_active_companies_survive() {
        let provider = Arc::new(
            InMemoryProvider::new()
                .with_company(REFERENCE, "00000000000111", "ATIVA")
                .with_company(REFERENCE, "00000000000222", "BAIXADA"),
        );
        let filter = ActiveCompanyFilter::new(provider);

        let outcome = filter
            .filter(vec![lead("00000000000111"), lead("00000000000222")])
            .await;

        assert_eq!(outcome.active.len(), 1);
        assert_eq!(outcome.active[0].cnpj, "00000000000111");
        assert_eq!(outcome.excluded(), 1);
        assert_eq!(outcome.dropped_chunks, 0);
    }

    #[tokio::test]
    async fn test_unknown_cnpjs_are_excluded() {
        let provider = Arc::new(InMemoryProvider::new());
        let filter = ActiveCompanyFilter::new(provider);

        let outcome = filter.filter(vec![lead("00000000000999")]).await;

        assert!(outcome.active.is_empty());
        assert_eq!(outcome.excluded(), 1);
        assert_eq!(outcome.dropped_candidates, 0);
    }

    #[tokio::test]
    async fn test_chunked_result_is_a_duplicate_free_subset() {
        let mut provider = InMemoryProvider::new();
        for n in (0..2500).filter(|n| n % 3 == 0) {
            provider = provider.with_company(REFERENCE, &cnpj(n), "ATIVA");
        }
        for n in (0..2500).filter(|n| n % 3 == 1) {
            provider = provider.with_company(REFERENCE, &cnpj(n), "INAPTA");
        }
        let provider = Arc::new(provider);

        let candidates: Vec<LeadDocument> = (0..2500).map(|n| lead(&cnpj(n))).collect();
        let filter = ActiveCompanyFilter::with_config(provider.clone(), config(1000, 2));

        let outcome = filter.filter(candidates).await;

        let survivors: HashSet<String> = outcome.active.iter().map(|l| l.cnpj.clone()).collect();
        let expected: HashSet<String> = (0..2500).filter(|n| n % 3 == 0).map(cnpj).collect();
        assert_eq!(survivors.len(), outcome.active.len());
        assert_eq!(survivors, expected);
        assert_eq!(provider.lookup_calls.load(Ordering::SeqCst), 3);
        assert!(provider.largest_lookup.load(Ordering::SeqCst) <= MAX_FILTER_CHUNK_SIZE);
    }

    #[tokio::test]
    async fn test_workers_bound_concurrent_lookups() {
        let provider = Arc::new(InMemoryProvider::new());
        let candidates: Vec<LeadDocument> = (0..40).map(|n| lead(&cnpj(n))).collect();
        let filter = ActiveCompanyFilter::with_config(provider.clone(), config(2, 3));

        filter.filter(candidates).await;

        assert_eq!(provider.lookup_calls.load(Ordering::SeqCst), 20);
        assert!(provider.lookups.peak() <= 3);
    }

    #[tokio::test]
    async fn test_oversized_chunks_are_capped() {
        let provider = Arc::new(InMemoryProvider::new());
        let candidates: Vec<LeadDocument> = (0..1500).map(|n| lead(&cnpj(n))).collect();
        let filter = ActiveCompanyFilter::with_config(provider.clone(), config(5000, 1));

        filter.filter(candidates).await;

        assert_eq!(provider.largest_lookup.load(Ordering::SeqCst), 1000);
    }

    #[tokio::test]
    async fn test_failed_chunk_is_dropped_and_counted() {
        let provider = Arc::new(
            InMemoryProvider::new()
                .with_company(REFERENCE, &cnpj(1), "ATIVA")
                .with_company(REFERENCE, &cnpj(3), "ATIVA")
                .failing_lookup_for(&cnpj(3)),
        );
        let candidates: Vec<LeadDocument> = (0..4).map(|n| lead(&cnpj(n))).collect();
        let filter = ActiveCompanyFilter::with_config(provider, config(2, 2));

        let outcome = filter.filter(candidates).await;

        assert_eq!(outcome.active.len(), 1);
        assert_eq!(outcome.active[0].cnpj, cnpj(1));
        assert_eq!(outcome.dropped_chunks, 1);
        assert_eq!(outcome.dropped_candidates, 2);
        assert_eq!(outcome.excluded(), 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let filter = ActiveCompanyFilter::new(Arc::new(InMemoryProvider::new()));
        let outcome = filter.filter(Vec::new()).await;
        assert_eq!(outcome.candidates, 0);
        assert!(outcome.active.is_empty());
    }
}
