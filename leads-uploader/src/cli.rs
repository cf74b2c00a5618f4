//! Command-line arguments of the uploader.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::warn;

/// Upload a CSV lead list into its own index, keeping only active companies.
#[derive(Parser, Debug, Default, PartialEq, Eq)]
#[command(name = "leads-uploader", version)]
pub struct Cli {
    /// CSV file with a header row and a `cnpj` column.
    pub file: Option<PathBuf>,

    /// Organization the leads belong to.
    pub organization: Option<String>,
}

impl Cli {
    /// Parse `args`, the program name first.
    ///
    /// Arguments that do not fit are logged and read as no arguments at all, so the run
    /// still ends with the no-file line. Only help and version requests come back as
    /// errors, for clap to print.
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(cli) => Ok(cli),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "Unexpected arguments");
                Ok(Self::default())
            }
        }
    }
}
