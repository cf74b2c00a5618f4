//! Shared type definitions.

pub mod column_kind;
pub mod index_mapping;
pub mod lead_document;
