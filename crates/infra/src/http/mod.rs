//! HTTP transport adapter
//!
//! [`ReqwestTransport`] plugs `reqwest` into the common executor's
//! [`Transport`](steadfast_common::http::Transport) seam.

pub mod client;

pub use client::{ReqwestTransport, ReqwestTransportBuilder, DEFAULT_REQUEST_TIMEOUT};
