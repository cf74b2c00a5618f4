//! Elastic Filler Main Entry Point
//!
//! Copies sample documents from a remote cluster into a local one, one category at a
//! time.

use std::env;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use elastic_filler::copier::{DEFAULT_FIELD, SEGMENTS};
use elastic_filler::{CrossClusterCopier, FillerConfig, FillerError};
use leads_indexer_repository::{OpenSearchProvider, SearchIndexProvider};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Seed a local cluster with documents matching each category on a remote cluster.
#[derive(Parser, Debug)]
#[command(name = "elastic-filler", version)]
struct Cli {
    /// Field the categories are matched on.
    #[arg(long, default_value = DEFAULT_FIELD)]
    field: String,

    /// Category to copy. Repeat for several; defaults to every segment.
    #[arg(long = "category")]
    categories: Vec<String>,
}

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), FillerError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("elastic_filler=info,leads_indexer_repository=info")
    });

    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| FillerError::config(format!("Failed to initialize tracing: {}", e)))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .pretty(),
            )
            .try_init()
            .map_err(|e| FillerError::config(format!("Failed to initialize tracing: {}", e)))?;
    }

    info!(
        service_name = "elastic-filler",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), FillerError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    let cli = Cli::parse();
    let categories = if cli.categories.is_empty() {
        SEGMENTS.iter().map(|segment| segment.to_string()).collect()
    } else {
        cli.categories
    };

    let config = FillerConfig::from_env().inspect_err(|e| {
        error!(error = %e, "Invalid configuration");
    })?;

    let remote: Arc<dyn SearchIndexProvider> = Arc::new(OpenSearchProvider::new(&config.remote)?);
    let local: Arc<dyn SearchIndexProvider> = Arc::new(OpenSearchProvider::new(&config.local)?);
    let copier = CrossClusterCopier::new(remote, local, config.index.clone())
        .with_max_documents(config.max_documents);

    info!(field = %cli.field, categories = ?categories, "Starting elastic filler");

    let report = copier.run(&cli.field, &categories).await;

    for (category, e) in report.failed_categories() {
        warn!(category, error = %e, "Category was not copied");
    }

    if !categories.is_empty() && report.failed_categories().count() == categories.len() {
        error!("No category could be copied");
        return Err(FillerError::fill_failed(format!(
            "all {} categories failed",
            categories.len()
        )));
    }

    info!(
        copied = report.copied(),
        failed = report.failed(),
        "Elastic filler finished"
    );
    Ok(())
}
