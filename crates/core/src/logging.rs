use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::ApplicationError;

/// Installs the global formatter. `RUST_LOG`, when set, wins over
/// `logging.level`.
pub fn init(config: &LoggingConfig) -> Result<(), ApplicationError> {
    let filter = env_filter(config);
    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|error| {
        ApplicationError::Configuration(format!("could not install log subscriber: {error}"))
    })
}

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.trim().to_ascii_lowercase()))
}
