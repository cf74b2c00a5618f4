//! Leads Uploader Main Entry Point
//!
//! Uploads a CSV lead list for an organization. Progress lines for the calling process go
//! to stdout; logs go to stderr.

use std::env;

use dotenv::dotenv;
use leads_uploader::cli::Cli;
use leads_uploader::reporter::Reporter;
use leads_uploader::{Dependencies, UploaderConfig, UploaderError};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), UploaderError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("leads_uploader=info,leads_indexer_repository=info")
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
            .map_err(|e| UploaderError::config(format!("Failed to initialize tracing: {}", e)))?;
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
            .map_err(|e| UploaderError::config(format!("Failed to initialize tracing: {}", e)))?;
    }

    info!(
        service_name = "leads-uploader",
        service_version = env!("CARGO_PKG_VERSION"),
        json,
        "Tracing initialized"
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), UploaderError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    let cli = Cli::from_args(env::args_os()).unwrap_or_else(|e| e.exit());
    info!(file = ?cli.file, organization = ?cli.organization, "Starting leads uploader");

    let config = UploaderConfig::from_env();
    let deps = match Dependencies::new(&config) {
        Ok(deps) => deps,
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            Reporter::stdout().end(&format!("Falha ao carregar os leads: {}", e));
            return Err(e);
        }
    };

    match deps
        .orchestrator
        .run_and_report(cli.file.as_deref(), cli.organization.as_deref())
        .await
    {
        Ok(()) => {
            info!("Leads uploader finished");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Leads uploader failed");
            Err(e.into())
        }
    }
}
