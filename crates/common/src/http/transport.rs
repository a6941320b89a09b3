//! Transport seam for outbound requests

use async_trait::async_trait;

use super::error::SendError;
use super::types::{HttpRequest, HttpResponse};

/// Sends a single request and returns the completed response
///
/// Implementations report connection problems and timeouts as
/// [`SendError::Transport`] so they consume retry attempts. Problems with the
/// request itself (a malformed header, an unsupported URI scheme) are
/// [`SendError::Other`] and are not retried.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, SendError>;
}
