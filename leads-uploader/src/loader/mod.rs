//! Loader module for the uploader.
//!
//! Writes lead documents into the destination index with bulk requests. Requests run
//! concurrently on a bounded number of workers.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::UploadError;
use crate::filter::divide_into_chunks;
use leads_indexer_repository::{
    BatchOperationResult, BatchOperationSummary, IndexDocumentRequest, SearchIndexError,
    SearchIndexProvider,
};
use leads_indexer_shared::LeadDocument;

/// Configuration for the bulk uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Documents per bulk request.
    pub chunk_size: usize,
    /// Bulk requests allowed in flight at once.
    pub workers: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            workers: 4,
        }
    }
}

/// Outcome of an upload.
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    /// Per-document results, over every request.
    pub summary: BatchOperationSummary,
    /// Bulk requests sent.
    pub requests: usize,
    /// Bulk requests that failed as a whole.
    pub failed_requests: usize,
}

impl UploadReport {
    /// Documents that were not written.
    pub fn failed(&self) -> usize {
        self.summary.failed
    }

    /// Documents written.
    pub fn succeeded(&self) -> usize {
        self.summary.succeeded
    }
}

/// Loader that bulk-writes lead documents.
pub struct BulkUploader {
    provider: Arc<dyn SearchIndexProvider>,
    config: LoaderConfig,
}

impl BulkUploader {
    /// Create a new uploader with the given provider.
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self::with_config(provider, LoaderConfig::default())
    }

    /// Create a new uploader with custom configuration.
    pub fn with_config(provider: Arc<dyn SearchIndexProvider>, config: LoaderConfig) -> Self {
        Self { provider, config }
    }

    /// Write `documents` into `index`, letting the search engine assign ids.
    ///
    /// Rejected documents and failed requests are counted in the report, never raised.
    ///
    /// # Returns
    ///
    /// * `Ok(UploadReport)` - Per-document outcome
    /// * `Err(UploadError::UploadFailed)` - If every bulk request failed to reach the
    ///   search engine
    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    pub async fn upload(
        &self,
        index: &str,
        documents: Vec<LeadDocument>,
    ) -> Result<UploadReport, UploadError> {
        if documents.is_empty() {
            debug!("Nothing to upload");
            return Ok(UploadReport::default());
        }

        let requests: Vec<IndexDocumentRequest> = documents
            .iter()
            .map(|document| IndexDocumentRequest::new(index, document.to_source()))
            .collect();
        let chunks = divide_into_chunks(requests, self.config.chunk_size);
        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));

        let mut handles = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);

            handles.push(tokio::spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => provider.bulk_index(&chunk).await,
                    Err(e) => Err(SearchIndexError::unknown(e.to_string())),
                };
                match result {
                    Ok(summary) => Ok(summary),
                    Err(e) => Err(failed_summary(&chunk, e)),
                }
            }));
        }

        let mut report = UploadReport {
            requests: handles.len(),
            ..UploadReport::default()
        };
        let mut last_error = None;

        for result in join_all(handles).await {
            match result {
                Ok(Ok(summary)) => report.summary.absorb(summary),
                Ok(Err((summary, e))) => {
                    error!(documents = summary.total, error = %e, "Bulk request failed");
                    report.failed_requests += 1;
                    report.summary.absorb(summary);
                    last_error = Some(e.to_string());
                }
                Err(e) => {
                    error!(error = %e, "Bulk task did not complete");
                    report.failed_requests += 1;
                    last_error = Some(e.to_string());
                }
            }
        }

        // Tasks that did not complete leave their documents out of the summary.
        let missing = documents.len().saturating_sub(report.summary.total);
        report.summary.total += missing;
        report.summary.failed += missing;

        if report.failed_requests == report.requests {
            return Err(UploadError::upload_failed(format!(
                "All {} bulk requests failed, last error: {}",
                report.requests,
                last_error.unwrap_or_default()
            )));
        }

        for failure in report.summary.failures().take(10) {
            if let Some(ref err) = failure.error {
                warn!(index = %failure.index, error = %err, "Failed to index document");
            }
        }

        info!(
            index = %index,
            requests = report.requests,
            failed_requests = report.failed_requests,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Bulk upload completed"
        );
        Ok(report)
    }
}

/// Mark every document of a request as failed with the request's error.
fn failed_summary(
    requests: &[IndexDocumentRequest],
    error: SearchIndexError,
) -> (BatchOperationSummary, SearchIndexError) {
    let results = requests
        .iter()
        .map(|request| BatchOperationResult {
            index: request.index.clone(),
            id: request.id.clone(),
            success: false,
            error: Some(error.clone()),
        })
        .collect();
    (BatchOperationSummary::from_results(results), error)
}
