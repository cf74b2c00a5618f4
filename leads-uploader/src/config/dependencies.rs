//! Dependency initialization and wiring for the uploader.

use std::sync::Arc;
use tracing::info;

use crate::config::UploaderConfig;
use crate::filter::ActiveCompanyFilter;
use crate::loader::BulkUploader;
use crate::orchestrator::UploadOrchestrator;
use crate::provisioner::IndexProvisioner;
use crate::reporter::Reporter;
use crate::UploaderError;
use leads_indexer_repository::{OpenSearchProvider, SearchIndexProvider};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: UploadOrchestrator,
}

impl Dependencies {
    /// Build the providers and pipeline components described by `config`.
    ///
    /// No request is sent here; an unreachable cluster surfaces on the first step of the
    /// run. Progress lines go to stdout.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(UploaderError)` - If a cluster URL is invalid
    pub fn new(config: &UploaderConfig) -> Result<Self, UploaderError> {
        let destination: Arc<dyn SearchIndexProvider> = Arc::new(
            OpenSearchProvider::new(&config.destination).map_err(|e| {
                UploaderError::config(format!("Failed to create destination provider: {}", e))
            })?,
        );

        // Same cluster, same client.
        let reference: Arc<dyn SearchIndexProvider> = if config.reference == config.destination {
            Arc::clone(&destination)
        } else {
            Arc::new(OpenSearchProvider::new(&config.reference).map_err(|e| {
                UploaderError::config(format!("Failed to create reference provider: {}", e))
            })?)
        };

        info!(
            shared_cluster = config.reference == config.destination,
            "Search providers created"
        );

        let provisioner = IndexProvisioner::new(Arc::clone(&destination));
        let filter = ActiveCompanyFilter::with_config(reference, config.filter.clone());
        let loader = BulkUploader::with_config(destination, config.loader.clone());
        let orchestrator = UploadOrchestrator::new(provisioner, filter, loader, Reporter::stdout());

        Ok(Self { orchestrator })
    }
}
