//! Filler settings read from the environment.

use std::env;

use leads_indexer_repository::ConnectionConfig;
use tracing::{info, warn};

use crate::copier::DEFAULT_MAX_DOCUMENTS;
use crate::errors::FillerError;

/// Default local cluster URL.
const DEFAULT_LOCAL_ELASTIC_URL: &str = "http://localhost:9200";

/// Settings for one filler run.
#[derive(Debug, Clone)]
pub struct FillerConfig {
    /// Cluster the documents are read from.
    pub remote: ConnectionConfig,
    /// Cluster the documents are written to.
    pub local: ConnectionConfig,
    /// Index name, the same on both clusters.
    pub index: String,
    /// Most documents copied per category.
    pub max_documents: usize,
}

impl FillerConfig {
    /// Read the settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `REMOTE_ELASTIC_URL`: Remote cluster URL (required)
    /// - `REMOTE_ELASTIC_USER` / `REMOTE_ELASTIC_PASSWORD`: Remote basic auth (optional)
    /// - `LOCAL_ELASTIC_URL`: Local cluster URL (default: http://localhost:9200)
    /// - `LOCAL_ELASTIC_USER` / `LOCAL_ELASTIC_PASSWORD`: Local basic auth (optional)
    /// - `EB_INDEX`: Index name on both clusters (required)
    /// - `FILL_MAX_DOCUMENTS`: Most documents copied per category (default and cap: 10000)
    pub fn from_env() -> Result<Self, FillerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the settings through `lookup`, which returns the value of a variable.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FillerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &str| {
            var(key).ok_or_else(|| FillerError::config(format!("{} is not set", key)))
        };

        let remote = connection(
            required("REMOTE_ELASTIC_URL")?,
            var("REMOTE_ELASTIC_USER"),
            var("REMOTE_ELASTIC_PASSWORD"),
        );
        let local = connection(
            var("LOCAL_ELASTIC_URL").unwrap_or_else(|| DEFAULT_LOCAL_ELASTIC_URL.to_string()),
            var("LOCAL_ELASTIC_USER"),
            var("LOCAL_ELASTIC_PASSWORD"),
        );
        let index = required("EB_INDEX")?;

        let max_documents = match var("FILL_MAX_DOCUMENTS") {
            None => DEFAULT_MAX_DOCUMENTS,
            Some(raw) => match raw.parse::<usize>() {
                Ok(value) if value > DEFAULT_MAX_DOCUMENTS => {
                    warn!(
                        value,
                        max = DEFAULT_MAX_DOCUMENTS,
                        "FILL_MAX_DOCUMENTS above the search result window, capping"
                    );
                    DEFAULT_MAX_DOCUMENTS
                }
                Ok(value) if value > 0 => value,
                _ => {
                    warn!(value = %raw, "Invalid FILL_MAX_DOCUMENTS, using default");
                    DEFAULT_MAX_DOCUMENTS
                }
            },
        };

        info!(
            remote_url = %remote.url,
            local_url = %local.url,
            index = %index,
            max_documents,
            "Loaded filler configuration"
        );

        Ok(Self {
            remote,
            local,
            index,
            max_documents,
        })
    }
}

fn connection(url: String, username: Option<String>, password: Option<String>) -> ConnectionConfig {
    let config = ConnectionConfig::new(url);
    match username {
        Some(username) => config.with_basic_auth(username, password.unwrap_or_default()),
        None => config,
    }
}
