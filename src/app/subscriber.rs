use crate::error::AppError;
use crate::logger::{Logger, ProcessLoggerLayer};
use tracing_subscriber::{EnvFilter, prelude::*};

/// Filter used when `RUST_LOG` is not set. Everything reaches the process
/// logger, which applies the configured minimum itself.
pub const DEFAULT_FILTER: &str = "debug";

/// Install the global subscriber that routes `tracing` events into `logger`.
pub fn init_tracing(logger: Logger) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|e| AppError::Tracing(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(ProcessLoggerLayer::new(logger))
        .try_init()
        .map_err(|e| AppError::Tracing(e.to_string()))
}
