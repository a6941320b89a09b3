//! Outbound HTTP abstractions
//!
//! - **[`types`]**: transport-neutral request and response values
//! - **[`snapshot`]**: the serializable summary of a failed response
//! - **[`error`]**: `TransportFailureError`, `StatusOutOfBounds`, `SendError`
//! - **[`validator`]**: status-range validation with diagnostic extraction
//! - **[`transport`]**: the async seam an adapter implements
//! - **[`client`]**: the resilient request executor
//!
//! The value types and errors are available in the `foundation` tier; the
//! validator, transport seam and executor need `runtime`.

pub mod error;
pub mod snapshot;
pub mod types;

#[cfg(feature = "runtime")]
pub mod client;
#[cfg(feature = "runtime")]
pub mod transport;
#[cfg(feature = "runtime")]
pub mod validator;

#[cfg(feature = "runtime")]
pub use client::{
    DefaultPolicySettings, ResilientHttpClient, ResilientHttpClientBuilder,
    ResilientRequestExecutor,
};
pub use error::{SendError, StatusOutOfBounds, TransportFailureError};
pub use snapshot::FailedResponseSnapshot;
#[cfg(feature = "runtime")]
pub use transport::Transport;
pub use types::{HttpMethod, HttpRequest, HttpResponse};
#[cfg(feature = "runtime")]
pub use validator::{
    build_snapshot, DefaultResponseValidator, ResponseValidator,
    DEFAULT_HTTP_STATUS_SUCCESSFUL_LOWER_BOUND, DEFAULT_HTTP_STATUS_SUCCESSFUL_UPPER_BOUND,
    DETAIL_CODES_FIELD, DETAIL_CODES_HEADER, INFORMATION_FRAGMENTS_FIELD,
    INFORMATION_FRAGMENTS_HEADER,
};
