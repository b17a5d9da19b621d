//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{RecError, Result};

/// Installs the global `tracing` subscriber writing to stderr.
///
/// `level` is an `EnvFilter` directive such as `info` or `placerec=debug`.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| RecError::Configuration(format!("invalid log level: {e}")))?,
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| RecError::Configuration("logging already initialized".into()))
}
