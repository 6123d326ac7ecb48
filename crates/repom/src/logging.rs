//! Structured logging setup
//!
//! repom itself only emits `tracing` events; applications that do not
//! install their own subscriber can call [`init_logging`].

use std::io;

use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured directives when set. Fails if the
/// directives do not parse or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.directives()))?;

    match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout).json())
            .try_init()?,
        LogFormat::Plain => tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout))
            .try_init()?,
    }

    tracing::info!(
        target: "repom::logging",
        "Logging initialized (filter: {}, format: {:?})",
        config.directives(),
        config.format
    );
    Ok(())
}
