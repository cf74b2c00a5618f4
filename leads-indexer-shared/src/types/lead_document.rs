//! Lead document types.
//!
//! This module defines the document written to a leads index for every uploaded row.

use serde_json::{Map, Value};

/// Field holding the business identifier (CNPJ) of the company.
pub const CNPJ_FIELD: &str = "cnpj";

/// Field holding the processing status of a lead.
pub const STATUS_FIELD: &str = "status";

/// Field tagging the organization that uploaded the lead.
pub const COMPANY_NAME_FIELD: &str = "company_name";

/// Width of a normalized CNPJ.
pub const CNPJ_WIDTH: usize = 14;

/// Processing status of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeadStatus {
    /// Not contacted yet. Every uploaded lead starts here.
    #[default]
    Pending,
}

impl LeadStatus {
    /// Wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Pending => "PENDING",
        }
    }
}

/// One row of an uploaded dataset, ready to be indexed.
///
/// `cnpj`, `status` and `company_name` always win over an attribute of the same name
/// when the document source is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadDocument {
    /// CNPJ normalized to a 14 character, zero padded string.
    pub cnpj: String,
    /// Processing status.
    pub status: String,
    /// Organization that uploaded the dataset.
    pub company_name: String,
    /// Remaining columns of the row, already typed.
    pub attributes: Map<String, Value>,
}

impl LeadDocument {
    /// Create a document with the default `PENDING` status and no attributes.
    ///
    /// # Example
    ///
    /// ```
    /// use leads_indexer_shared::LeadDocument;
    ///
    /// let doc = LeadDocument::new("00000000000191", "Acme");
    /// assert_eq!(doc.status, "PENDING");
    /// ```
    pub fn new(cnpj: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            cnpj: cnpj.into(),
            status: LeadStatus::default().as_str().to_string(),
            company_name: company_name.into(),
            attributes: Map::new(),
        }
    }

    /// Replace the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Add a column value.
    pub fn with_attribute(mut self, field: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(field.into(), value);
        self
    }

    /// Render the `_source` of the document.
    pub fn to_source(&self) -> Value {
        let mut source = self.attributes.clone();
        source.insert(CNPJ_FIELD.to_string(), Value::String(self.cnpj.clone()));
        source.insert(STATUS_FIELD.to_string(), Value::String(self.status.clone()));
        source.insert(
            COMPANY_NAME_FIELD.to_string(),
            Value::String(self.company_name.clone()),
        );
        Value::Object(source)
    }
}
