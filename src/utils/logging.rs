//! Logging setup

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{RemuxError, RemuxResult};

/// Build the event filter; `RUST_LOG` wins over the configured level
pub fn build_filter(config: &LoggingConfig) -> RemuxResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| RemuxError::Config {
        message: format!("Invalid log level '{}': {}", config.level, e),
    })
}

/// Install the global subscriber.
///
/// Events go to stderr so that `--json` output on stdout stays parseable.
/// A second call is a no-op.
pub fn init_logging(config: &LoggingConfig) -> RemuxResult<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    tracing::debug!(
        "Logging initialized: level {}, format {:?}",
        config.level,
        config.format
    );
    Ok(())
}
