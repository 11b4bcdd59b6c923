//! Diagnostic log file setup.

use std::{fs::OpenOptions, path::Path, sync::Mutex};

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "SAS_BRIDGE_LOG";

const DEFAULT_DIRECTIVES: &str =
    "sas_bridge_core=debug,sas_bridge_transfer=debug,sas_bridge_session=debug";

/// Logging setup error.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Cannot open log file: {0}")]
    Open(#[from] std::io::Error),
    #[error("Global subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Send execution traces to `path`, appending.
///
/// The filter comes from `SAS_BRIDGE_LOG` and defaults to debug output for
/// the bridge crates only.
///
/// # Errors
/// Returns error if the file cannot be opened or a subscriber is already set.
pub fn init_file_logging(path: &Path) -> Result<(), LoggingError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))
}
