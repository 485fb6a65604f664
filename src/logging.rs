//! Structured logging setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{GraphError, Result};

/// Installs a global `tracing` subscriber filtered by `level` (e.g.
/// `"info"`, `"rangegraph=debug,tower_http=info"`). Safe to call more
/// than once in a test process: a second call is reported as an error,
/// not a panic.
pub fn init(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_new(level).map_err(|e| GraphError::validation(format!("invalid log level: {e}")))?)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| GraphError::validation("logging already initialized"))
}
