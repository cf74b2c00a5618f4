//! Mapping module for the uploader.
//!
//! Builds the index mapping of a leads index from the inferred column kinds.

use std::path::Path;

use leads_indexer_shared::{
    ColumnKind, FieldMapping, IndexMapping, CNPJ_FIELD, COMPANY_NAME_FIELD, STATUS_FIELD,
};
use tracing::debug;

use crate::dataset::{Dataset, DatasetSchema};
use crate::errors::UploadError;

/// Field holding the time a lead was contacted.
pub const DATE_SENT_FIELD: &str = "date_sent";

/// Field holding the chat session of a lead.
pub const CHAT_ID_FIELD: &str = "chat_id";

/// Fields whose mapping does not depend on the data.
pub const PINNED_FIELDS: [(&str, FieldMapping); 4] = [
    (DATE_SENT_FIELD, FieldMapping::Date),
    (STATUS_FIELD, FieldMapping::Text),
    (CHAT_ID_FIELD, FieldMapping::Text),
    (COMPANY_NAME_FIELD, FieldMapping::Text),
];

/// Whether an empty cell of `field` is left out of its document.
///
/// Pinned fields mapped to anything but text cannot index an empty string.
pub fn skips_empty(field: &str) -> bool {
    PINNED_FIELDS
        .iter()
        .any(|(pinned, mapping)| *pinned == field && *mapping != FieldMapping::Text)
}

/// Builder for the mapping of a leads index.
///
/// Starts with the pinned fields; columns added afterwards never change them, whatever
/// their kind or position.
///
/// # Example
///
/// ```
/// use leads_indexer_shared::{ColumnKind, FieldMapping};
/// use leads_uploader::mapping::MappingBuilder;
///
/// let mapping = MappingBuilder::new()
///     .column("date_sent", ColumnKind::Integer)
///     .column("employees", ColumnKind::Integer)
///     .build();
///
/// assert_eq!(mapping.get("date_sent"), Some(FieldMapping::Date));
/// assert_eq!(mapping.get("employees"), Some(FieldMapping::Long));
/// ```
#[derive(Debug, Clone)]
pub struct MappingBuilder {
    mapping: IndexMapping,
}

impl MappingBuilder {
    /// Create a builder holding only the pinned fields.
    pub fn new() -> Self {
        let mut mapping = IndexMapping::new();
        for (field, field_mapping) in PINNED_FIELDS {
            mapping.pin(field, field_mapping);
        }
        Self { mapping }
    }

    /// Map a column of the given kind.
    pub fn column(mut self, name: &str, kind: ColumnKind) -> Self {
        if !self.mapping.assign(name, kind.field_mapping()) {
            debug!(field = %name, kind = ?kind, "Kept pinned mapping");
        }
        self
    }

    /// Map every column of `schema`.
    pub fn schema(self, schema: &DatasetSchema) -> Self {
        schema
            .iter()
            .fold(self, |builder, (name, kind)| builder.column(name, kind))
    }

    pub fn build(self) -> IndexMapping {
        self.mapping
    }
}

impl Default for MappingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the mapping for an inferred schema.
pub fn build_mapping(schema: &DatasetSchema) -> IndexMapping {
    MappingBuilder::new().schema(schema).build()
}

/// Read a CSV file and build the mapping of its leads index.
///
/// # Returns
///
/// * `Ok(IndexMapping)` - The mapping
/// * `Err(UploadError::FileNotFound)` - If the file does not exist; no partial mapping
///   is produced
/// * `Err(UploadError::MissingColumn)` - If the file has no `cnpj` column
pub fn mapping_from_csv(path: &Path) -> Result<IndexMapping, UploadError> {
    let dataset = Dataset::from_path(path)?;
    dataset.require_column(CNPJ_FIELD)?;
    Ok(build_mapping(&DatasetSchema::infer(&dataset)))
}
