//! Conversions from reqwest failures into the executor's error kinds.

use reqwest::Error as HttpError;
use steadfast_common::http::{SendError, TransportFailureError};

/// Whether a reqwest failure is a transient transport problem
///
/// Connect, timeout, request and body failures consume a retry attempt;
/// builder, redirect and decode failures do not.
pub(crate) fn is_transport_failure(err: &HttpError) -> bool {
    if err.is_builder() {
        return false;
    }
    if err.is_timeout() || err.is_request() || err.is_body() {
        return true;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return true;
        }
    }
    false
}

/// Map a reqwest failure for `uri` into a [`SendError`]
pub(crate) fn into_send_error(err: HttpError, uri: &str) -> SendError {
    if is_transport_failure(&err) {
        let message = format!("HTTP request to \"{uri}\" failed: {err}");
        SendError::Transport(TransportFailureError::from_message(message).with_source(err))
    } else {
        SendError::other(err)
    }
}
