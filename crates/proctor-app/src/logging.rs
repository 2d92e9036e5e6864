//! Global `tracing` subscriber setup.
//!
//! `RUST_LOG` wins over the configured level when it is set.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::AppError;

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines for local runs.
    Human,
    /// Newline-delimited JSON for log shipping.
    Json,
}

impl LogFormat {
    /// Parses `human` or `json`, case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Installs the global subscriber.
///
/// # Errors
/// Returns [`AppError::Logging`] when a global subscriber is already set.
pub fn init_logging(format: LogFormat, level: &str) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let installed = match format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    installed.map_err(|error| AppError::Logging(error.to_string()))
}
