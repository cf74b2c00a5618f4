//! Uploader settings read from the environment.

use std::env;

use leads_indexer_repository::ConnectionConfig;
use tracing::{info, warn};

use crate::filter::{FilterConfig, MAX_FILTER_CHUNK_SIZE};
use crate::loader::LoaderConfig;

/// Default destination cluster URL.
const DEFAULT_ELASTIC_URL: &str = "http://localhost:9200";

/// Settings for one uploader run, read once at startup.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Cluster the leads index is created in.
    pub destination: ConnectionConfig,
    /// Cluster holding the reference company index.
    pub reference: ConnectionConfig,
    /// Active-company filter settings.
    pub filter: FilterConfig,
    /// Bulk upload settings.
    pub loader: LoaderConfig,
}

impl UploaderConfig {
    /// Read the settings from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `ELASTIC_URL`: Destination cluster URL (default: http://localhost:9200)
    /// - `ELASTIC_USER` / `ELASTIC_PASSWORD`: Destination basic auth (optional)
    /// - `REFERENCE_ELASTIC_URL`: Reference cluster URL (default: the destination cluster)
    /// - `REFERENCE_ELASTIC_USER` / `REFERENCE_ELASTIC_PASSWORD`: Reference basic auth
    /// - `REFERENCE_INDEX`: Reference company index (default: empresasdobrasilv12)
    /// - `REFERENCE_STATUS_FIELD`: Status field in the reference index (default: situacao_cadastral)
    /// - `REFERENCE_ACTIVE_VALUE`: Status value of an active company (default: ATIVA)
    /// - `FILTER_CHUNK_SIZE`: CNPJs per lookup, at most 1000 (default: 1000)
    /// - `FILTER_WORKERS`: Concurrent lookups (default: available CPU parallelism)
    /// - `BULK_CHUNK_SIZE`: Documents per bulk request (default: 500)
    /// - `BULK_WORKERS`: Concurrent bulk requests (default: 4)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the settings through `lookup`, which returns the value of a variable.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let destination = connection(
            var("ELASTIC_URL").unwrap_or_else(|| DEFAULT_ELASTIC_URL.to_string()),
            var("ELASTIC_USER"),
            var("ELASTIC_PASSWORD"),
        );

        // Without a dedicated URL the reference index lives next to the leads.
        let reference = match var("REFERENCE_ELASTIC_URL") {
            Some(url) => connection(
                url,
                var("REFERENCE_ELASTIC_USER"),
                var("REFERENCE_ELASTIC_PASSWORD"),
            ),
            None => destination.clone(),
        };

        let mut filter = FilterConfig::default();
        if let Some(index) = var("REFERENCE_INDEX") {
            filter.reference_index = index;
        }
        if let Some(field) = var("REFERENCE_STATUS_FIELD") {
            filter.status_field = field;
        }
        if let Some(value) = var("REFERENCE_ACTIVE_VALUE") {
            filter.active_value = value;
        }
        filter.chunk_size = parse_count(&var, "FILTER_CHUNK_SIZE", filter.chunk_size)
            .min(MAX_FILTER_CHUNK_SIZE);
        filter.workers = parse_count(&var, "FILTER_WORKERS", filter.workers);

        let defaults = LoaderConfig::default();
        let loader = LoaderConfig {
            chunk_size: parse_count(&var, "BULK_CHUNK_SIZE", defaults.chunk_size),
            workers: parse_count(&var, "BULK_WORKERS", defaults.workers),
        };

        info!(
            destination_url = %destination.url,
            reference_url = %reference.url,
            reference_index = %filter.reference_index,
            filter_chunk_size = filter.chunk_size,
            filter_workers = filter.workers,
            bulk_chunk_size = loader.chunk_size,
            bulk_workers = loader.workers,
            "Loaded uploader configuration"
        );

        Self {
            destination,
            reference,
            filter,
            loader,
        }
    }
}

fn connection(url: String, username: Option<String>, password: Option<String>) -> ConnectionConfig {
    let config = ConnectionConfig::new(url);
    match username {
        Some(username) => config.with_basic_auth(username, password.unwrap_or_default()),
        None => config,
    }
}

/// Parse a positive count, falling back to `default` when unset or invalid.
fn parse_count<F>(var: &F, key: &str, default: usize) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => default,
        Some(raw) => match raw.parse::<usize>() {
            Ok(value) if value > 0 => value,
            _ => {
                warn!(key, value = %raw, default, "Invalid count, using default");
                default
            }
        },
    }
}
