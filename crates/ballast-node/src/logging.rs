//! Tracing subscriber setup for hosts embedding the pool.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;

/// Install a global tracing subscriber with the given log level and output format.
///
/// `RUST_LOG` takes precedence over `level`. Pass `format = "json"` for
/// structured JSON output; any other value gives human-readable text.
/// Fails if a global subscriber is already installed.
pub fn init_logging(level: &str, format: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .try_init()
    }
}
