//! Tracing subscriber setup
//!
//! Libraries in this workspace only emit `tracing` events. Binaries and test
//! harnesses call [`init_tracing`] once to decide where they go.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::errors::{InfraError, InfraResult};

/// Filter applied when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Pretty,
    /// One JSON object per event, with span context
    Json,
}

impl FromStr for LogFormat {
    type Err = InfraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(InfraError::Config(format!("Unknown log format: {other}"))),
        }
    }
}

/// Install the global tracing subscriber
///
/// The filter comes from `RUST_LOG`, defaulting to [`DEFAULT_LOG_FILTER`].
///
/// # Errors
/// Returns `InfraError::Tracing` if a global subscriber is already installed
/// or `RUST_LOG` does not parse.
pub fn init_tracing(format: LogFormat) -> InfraResult<()> {
    let filter = env_filter()?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_thread_ids(true))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true),
            )
            .try_init(),
    };

    result.map_err(|e| InfraError::Tracing(e.to_string()))
}

fn env_filter() -> InfraResult<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .map_err(|e| InfraError::Tracing(format!("Invalid {}: {e}", EnvFilter::DEFAULT_ENV))),
        _ => Ok(EnvFilter::new(DEFAULT_LOG_FILTER)),
    }
}
