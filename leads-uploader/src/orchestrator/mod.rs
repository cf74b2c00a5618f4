//! Orchestrator module for the uploader.
//!
//! Runs one upload: read the file, provision the index, filter the leads and write the
//! survivors, reporting progress to the calling process along the way.

use std::path::Path;

use tracing::{error, info, instrument, warn};

use crate::dataset::{Dataset, DatasetSchema};
use crate::errors::UploadError;
use crate::filter::ActiveCompanyFilter;
use crate::loader::BulkUploader;
use crate::mapping::build_mapping;
use crate::provisioner::{IndexProvisioner, ProvisionOutcome};
use crate::reporter::Reporter;
use leads_indexer_repository::validate_index_name;
use leads_indexer_shared::CNPJ_FIELD;

/// End line when the index is already there.
pub const INDEX_EXISTS_MESSAGE: &str = "O indice ja existe.";

/// End line when no file or organization was given.
pub const NO_FILE_MESSAGE: &str = "Não foi passado nenhum arquivo.";

/// End line when the file does not exist.
pub const FILE_NOT_FOUND_MESSAGE: &str = "Arquivo nao encontrado";

/// Counts of a finished upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadSummary {
    /// Rows read from the file.
    pub rows: usize,
    /// Rows whose company is active.
    pub active: usize,
    /// Rows whose company is unknown or inactive.
    pub excluded: usize,
    /// Rows dropped because their lookup failed.
    pub dropped: usize,
    /// Documents written.
    pub uploaded: usize,
    /// Documents the search engine did not write.
    pub failed: usize,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The index was created and filled.
    Uploaded {
        index: String,
        summary: UploadSummary,
    },
    /// The index existed already; nothing was written.
    IndexAlreadyExists { index: String },
}

/// Name of the index for `organization`'s upload of `path`.
///
/// Spaces in the organization become dashes, the file stem is appended, and the result
/// is lowercased.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use leads_uploader::orchestrator::index_name;
///
/// let name = index_name("Acme Corp", Path::new("/uploads/Leads_2024.csv")).unwrap();
/// assert_eq!(name, "acme-corp-leads_2024");
/// ```
pub fn index_name(organization: &str, path: &Path) -> Result<String, UploadError> {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .ok_or_else(|| {
            UploadError::invalid_index_name(format!("{} has no file name", path.display()))
        })?;

    let name = format!("{}-{}", organization.replace(' ', "-"), stem).to_lowercase();
    validate_index_name(&name).map_err(|e| UploadError::invalid_index_name(e.to_string()))?;
    Ok(name)
}

/// Orchestrator that coordinates an upload.
pub struct UploadOrchestrator {
    provisioner: IndexProvisioner,
    filter: ActiveCompanyFilter,
    loader: BulkUploader,
    reporter: Reporter,
}

impl UploadOrchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        provisioner: IndexProvisioner,
        filter: ActiveCompanyFilter,
        loader: BulkUploader,
        reporter: Reporter,
    ) -> Self {
        Self {
            provisioner,
            filter,
            loader,
            reporter,
        }
    }

    /// Upload the leads in `path` for `organization`.
    ///
    /// The file is read and checked before any index is touched, so a missing file or a
    /// missing `cnpj` column never leaves an empty index behind.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn run(&self, path: &Path, organization: &str) -> Result<UploadOutcome, UploadError> {
        self.reporter.data(&format!(
            "Recebido arquivo {} da empresa {}.",
            path.display(),
            organization
        ));

        let index = index_name(organization, path)?;
        let dataset = Dataset::from_path(path)?;
        dataset.require_column(CNPJ_FIELD)?;

        let schema = DatasetSchema::infer(&dataset);
        let mapping = build_mapping(&schema);
        info!(
            index = %index,
            rows = dataset.len(),
            columns = schema.len(),
            "Dataset read"
        );

        let provisioned = self
            .provisioner
            .ensure(&index, &mapping, &self.reporter)
            .await?;
        if provisioned == ProvisionOutcome::AlreadyExists {
            return Ok(UploadOutcome::IndexAlreadyExists { index });
        }

        let documents = dataset.to_documents(&schema, organization)?;
        let filtered = self.filter.filter(documents).await;
        if filtered.dropped_candidates > 0 {
            warn!(
                dropped = filtered.dropped_candidates,
                chunks = filtered.dropped_chunks,
                "Some leads could not be checked and were skipped"
            );
        }

        let mut summary = UploadSummary {
            rows: dataset.len(),
            active: filtered.active.len(),
            excluded: filtered.excluded(),
            dropped: filtered.dropped_candidates,
            ..UploadSummary::default()
        };

        let report = self.loader.upload(&index, filtered.active).await?;
        summary.uploaded = report.succeeded();
        summary.failed = report.failed();

        if summary.failed == 0 {
            self.reporter.data("Todos os leads foram carregados com sucesso");
        } else {
            self.reporter
                .data(&format!("{} falharam ao ser carregados", summary.failed));
        }

        info!(
            index = %index,
            rows = summary.rows,
            active = summary.active,
            excluded = summary.excluded,
            dropped = summary.dropped,
            uploaded = summary.uploaded,
            failed = summary.failed,
            "Upload completed"
        );
        Ok(UploadOutcome::Uploaded { index, summary })
    }

    /// Run an upload and finish with the end line the caller waits for.
    ///
    /// Every path ends with exactly one end line. A missing argument or file is a normal
    /// termination; any other failure is returned after its end line is written.
    pub async fn run_and_report(
        &self,
        path: Option<&Path>,
        organization: Option<&str>,
    ) -> Result<(), UploadError> {
        let (Some(path), Some(organization)) = (path, organization) else {
            warn!("No file or organization given");
            self.reporter.end(NO_FILE_MESSAGE);
            return Ok(());
        };

        match self.run(path, organization).await {
            Ok(UploadOutcome::Uploaded { index, .. }) => {
                self.reporter.end(&index);
                Ok(())
            }
            Ok(UploadOutcome::IndexAlreadyExists { .. }) => {
                self.reporter.end(INDEX_EXISTS_MESSAGE);
                Ok(())
            }
            Err(UploadError::FileNotFound(missing)) => {
                warn!(path = %missing.display(), "File not found");
                self.reporter.end(FILE_NOT_FOUND_MESSAGE);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Upload failed");
                self.reporter.end(&format!("Falha ao carregar os leads: {}", e));
                Err(e)
            }
        }
    }
}
