//! # Leads Indexer Shared
//!
//! This crate defines shared data structures used across the leads indexing tools.
//! It includes the index mapping model, the per-column kinds inferred from tabular
//! input, and the lead document written to the search engine.

pub mod types;

pub use types::column_kind::ColumnKind;
pub use types::index_mapping::{FieldMapping, IndexMapping, RAW_IGNORE_ABOVE, RAW_SUBFIELD};
pub use types::lead_document::{
    LeadDocument, LeadStatus, CNPJ_FIELD, CNPJ_WIDTH, COMPANY_NAME_FIELD, STATUS_FIELD,
};
