pub mod commands;

use std::io;

use latlen_core::{AnalyzeError, LatticeError, SettingsError};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "LATLEN_LOG";

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("invalid settings in {path}: {source}")]
    Settings {
        path: String,
        source: SettingsError,
    },
    #[error(transparent)]
    Lattice(#[from] LatticeError),
    #[error("lattice '{key}': {source}")]
    Analyze { key: String, source: AnalyzeError },
    #[error("cannot write {path}: {source}")]
    Write { path: String, source: io::Error },
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Install the stderr log subscriber. Filter directives come from
/// `LATLEN_LOG` and default to `warn`.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(true)
        .with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
