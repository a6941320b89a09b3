//! Response validation by status-code bounds
//!
//! A response whose status falls outside `[lower_bound, upper_bound]` is
//! rejected with a [`TransportFailureError`] carrying a
//! [`FailedResponseSnapshot`]. Detail codes and information fragments are read
//! from the `X-Detail-Codes` / `X-Information-Fragments` headers first and then
//! merged with the `detailCodes` / `informationFragments` fields of a JSON
//! object body. Nothing is de-duplicated.

use std::fmt;

use serde_json::Value;
use tracing::{debug, error};

use super::error::{StatusOutOfBounds, TransportFailureError};
use super::snapshot::FailedResponseSnapshot;
use super::types::HttpResponse;
use crate::error::{ConstructionError, ConstructionResult};

/// Lowest status code accepted by default
pub const DEFAULT_HTTP_STATUS_SUCCESSFUL_LOWER_BOUND: u16 = 200;
/// Highest status code accepted by default
pub const DEFAULT_HTTP_STATUS_SUCCESSFUL_UPPER_BOUND: u16 = 299;

/// Comma-separated integer detail codes
pub const DETAIL_CODES_HEADER: &str = "X-Detail-Codes";
/// Comma-separated free-text fragments
pub const INFORMATION_FRAGMENTS_HEADER: &str = "X-Information-Fragments";
/// JSON body field merged into the detail codes
pub const DETAIL_CODES_FIELD: &str = "detailCodes";
/// JSON body field merged into the information fragments
pub const INFORMATION_FRAGMENTS_FIELD: &str = "informationFragments";

/// Decides whether a completed response is acceptable
pub trait ResponseValidator: Send + Sync + fmt::Debug {
    /// Validate a response, failing with an enriched transport failure
    fn validate(&self, response: &HttpResponse) -> Result<(), TransportFailureError>;

    /// Validate an optional response; a missing response is accepted
    fn validate_optional(
        &self,
        response: Option<&HttpResponse>,
    ) -> Result<(), TransportFailureError> {
        match response {
            Some(response) => self.validate(response),
            None => Ok(()),
        }
    }
}

/// Status-range validator with header and JSON body diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultResponseValidator {
    lower_bound: u16,
    upper_bound: u16,
}

impl Default for DefaultResponseValidator {
    fn default() -> Self {
        Self {
            lower_bound: DEFAULT_HTTP_STATUS_SUCCESSFUL_LOWER_BOUND,
            upper_bound: DEFAULT_HTTP_STATUS_SUCCESSFUL_UPPER_BOUND,
        }
    }
}

impl DefaultResponseValidator {
    /// Validator accepting the conventional 200–299 range
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator accepting `[lower_bound, upper_bound]`
    ///
    /// # Errors
    /// Returns `ConstructionError` if `lower_bound > upper_bound`.
    pub fn with_bounds(lower_bound: u16, upper_bound: u16) -> ConstructionResult<Self> {
        if lower_bound > upper_bound {
            return Err(ConstructionError::config(format!(
                "status lower bound {lower_bound} is above upper bound {upper_bound}"
            )));
        }
        Ok(Self { lower_bound, upper_bound })
    }

    pub fn lower_bound(&self) -> u16 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> u16 {
        self.upper_bound
    }

    fn accepts(&self, status: u16) -> bool {
        (self.lower_bound..=self.upper_bound).contains(&status)
    }
}

impl ResponseValidator for DefaultResponseValidator {
    fn validate(&self, response: &HttpResponse) -> Result<(), TransportFailureError> {
        let status = response.status();
        let bounds = StatusOutOfBounds {
            status,
            lower_bound: self.lower_bound,
            upper_bound: self.upper_bound,
        };

        if self.accepts(status) {
            debug!(
                status,
                lower_bound = self.lower_bound,
                upper_bound = self.upper_bound,
                "HttpResponse Status is in bounds"
            );
            return Ok(());
        }

        let message = bounds.to_string();
        error!(uri = %response.uri(), "{message}");
        Err(TransportFailureError::from_message_and_snapshot(message, build_snapshot(response))
            .with_source(bounds))
    }
}

/// Build a snapshot enriched with header- and body-sourced diagnostics
pub fn build_snapshot(response: &HttpResponse) -> FailedResponseSnapshot {
    let mut detail_codes: Vec<i64> = Vec::new();
    let mut information_fragments: Vec<String> = Vec::new();

    if let Some(header) = response.header(DETAIL_CODES_HEADER).filter(|h| !h.is_empty()) {
        detail_codes.extend(header.split(',').filter_map(parse_detail_code));
    }

    if let Some(header) = response.header(INFORMATION_FRAGMENTS_HEADER).filter(|h| !h.is_empty())
    {
        information_fragments.extend(header.split(',').map(|part| part.trim().to_owned()));
    }

    let body = response.body().filter(|body| !body.is_empty());
    if let Some(Value::Object(fields)) = body.and_then(|b| serde_json::from_str::<Value>(b).ok())
    {
        if let Some(Value::Array(codes)) = fields.get(DETAIL_CODES_FIELD) {
            detail_codes.extend(codes.iter().filter_map(Value::as_i64));
        }
        if let Some(Value::Array(fragments)) = fields.get(INFORMATION_FRAGMENTS_FIELD) {
            information_fragments
                .extend(fragments.iter().filter_map(Value::as_str).map(str::to_owned));
        }
    }

    FailedResponseSnapshot::new(response.status(), response.uri())
        .with_body(response.body().map(str::to_owned))
        .with_detail_codes(detail_codes)
        .with_information_fragments(information_fragments)
}

/// Parse one header segment; only plain digit runs count as codes
fn parse_detail_code(part: &str) -> Option<i64> {
    let trimmed = part.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}
