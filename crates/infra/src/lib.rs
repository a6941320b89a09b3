//! # Steadfast Infrastructure
//!
//! Impure adapters for `steadfast-common`.
//!
//! This crate contains:
//! - A reqwest-backed [`Transport`](steadfast_common::http::Transport)
//! - Settings loading from `.env`, `STEADFAST_*` variables and files
//! - Tracing subscriber initialisation
//! - Wiring of the default resilient executor
//!
//! ## Architecture
//! - Implements traits defined in `steadfast-common`
//! - Contains all "impure" code (network, environment, file system)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod composition;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use composition::{build_resilient_client, build_with_transport};
pub use config::ResilienceSettings;
pub use errors::{InfraError, InfraResult};
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
pub use observability::{init_tracing, LogFormat};
