//! Provisioner module for the uploader.
//!
//! Creates a leads index, with its mapping, unless it already exists.

use std::sync::Arc;
use tracing::{info, instrument};

use leads_indexer_repository::{SearchIndexError, SearchIndexProvider};
use leads_indexer_shared::IndexMapping;

use crate::reporter::Reporter;

/// What [`IndexProvisioner::ensure`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The index was created and its mapping applied.
    Created,
    /// The index was already there; nothing was changed.
    AlreadyExists,
}

/// Checks for and creates destination indices.
///
/// The existence check is advisory: two processes provisioning the same name at the same
/// time can both see it missing, and the slower create then fails.
pub struct IndexProvisioner {
    provider: Arc<dyn SearchIndexProvider>,
}

impl IndexProvisioner {
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self { provider }
    }

    /// Whether `index` exists.
    pub async fn exists(&self, index: &str) -> Result<bool, SearchIndexError> {
        self.provider.index_exists(index).await
    }

    /// Create `index` and then apply `mapping` to it.
    ///
    /// Each step is announced on `reporter` before it is attempted.
    #[instrument(skip(self, mapping, reporter), fields(fields = mapping.len()))]
    pub async fn create(
        &self,
        index: &str,
        mapping: &IndexMapping,
        reporter: &Reporter,
    ) -> Result<(), SearchIndexError> {
        reporter.progress(&format!("Criando índice {}", index));
        self.provider.create_index(index).await?;
        reporter.progress("Inserindo mapping");
        self.provider.put_mapping(index, mapping).await?;
        info!(index = %index, "Index provisioned");
        Ok(())
    }

    /// Create `index` with `mapping` unless it already exists.
    ///
    /// # Returns
    ///
    /// * `Ok(ProvisionOutcome::Created)` - The index did not exist and was created
    /// * `Ok(ProvisionOutcome::AlreadyExists)` - No create or mapping call was made
    /// * `Err(SearchIndexError)` - If any of the calls failed
    pub async fn ensure(
        &self,
        index: &str,
        mapping: &IndexMapping,
        reporter: &Reporter,
    ) -> Result<ProvisionOutcome, SearchIndexError> {
        if self.exists(index).await? {
            info!(index = %index, "Index already exists");
            return Ok(ProvisionOutcome::AlreadyExists);
        }

        self.create(index, mapping, reporter).await?;
        Ok(ProvisionOutcome::Created)
    }
}
