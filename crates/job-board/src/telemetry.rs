use std::io;

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, TelemetryConfig};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("log filter '{value}' is not valid: {source}")]
    Filter { value: String, source: ParseError },
    #[error("a global subscriber is already installed")]
    AlreadyInstalled(#[from] TryInitError),
}

/// `RUST_LOG` takes precedence; the configured level applies when it is unset or unparsable.
fn level_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::Filter {
        value: config.log_level.clone(),
        source,
    })
}

/// Installs the global subscriber writing to stderr, leaving stdout to command output.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = level_filter(config)?;

    let compact = (config.format == LogFormat::Compact).then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_ansi(false)
            .compact()
    });
    let json = (config.format == LogFormat::Json).then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .json()
            .with_current_span(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(json)
        .try_init()?;
    Ok(())
}
