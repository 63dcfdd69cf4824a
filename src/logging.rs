//! Log output setup

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global tracing subscriber writing to stdout
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns an error if a
/// subscriber was already installed.
pub fn init_logging(default_filter: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
}
