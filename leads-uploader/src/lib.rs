//! # Leads Uploader
//!
//! Uploads a CSV lead list into its own search index, keeping only companies that are
//! marked active in a reference index.
//!
//! ## Architecture
//!
//! A run is a straight pipeline:
//!
//! 1. **Dataset**: Reads the CSV and infers a kind per column
//! 2. **Mapping**: Turns the inferred kinds into an index mapping
//! 3. **Provisioner**: Creates the index once, with its mapping
//! 4. **Filter**: Looks every CNPJ up in the reference index, in parallel chunks
//! 5. **Loader**: Bulk-writes the surviving rows
//! 6. **Orchestrator**: Runs the steps above and reports progress
//!
//! ## Modules
//!
//! - [`cli`]: Command-line arguments
//! - [`config`]: Configuration and dependency initialization
//! - [`dataset`]: CSV loading and row typing
//! - [`mapping`]: Index mapping builder
//! - [`provisioner`]: Index existence check and creation
//! - [`filter`]: Active-company filter
//! - [`loader`]: Bulk uploader
//! - [`orchestrator`]: Coordinates an upload run
//! - [`reporter`]: Progress lines read by the calling process
//! - [`errors`]: Error types for the uploader

pub mod cli;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod filter;
pub mod loader;
pub mod mapping;
pub mod orchestrator;
pub mod provisioner;
pub mod reporter;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{Dependencies, UploaderConfig};
pub use errors::UploadError;

use thiserror::Error;

/// Errors that can occur during uploader initialization or execution.
#[derive(Error, Debug)]
pub enum UploaderError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Upload error.
    #[error("Upload error: {0}")]
    UploadError(#[from] UploadError),
}

impl UploaderError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
