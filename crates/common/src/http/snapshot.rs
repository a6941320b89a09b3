//! Serializable snapshot of a failed response
//!
//! A [`FailedResponseSnapshot`] is the only representation of a failed
//! response that crosses component boundaries. It owns plain data so it can
//! outlive the transport, be logged, or be serialized into a report.

use serde::{Deserialize, Serialize};

use super::types::HttpResponse;

/// Immutable summary of a response that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedResponseSnapshot {
    status_code: u16,
    uri: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    body: Option<String>,
    #[serde(default)]
    detail_codes: Vec<i64>,
    #[serde(default)]
    information_fragments: Vec<String>,
}

impl FailedResponseSnapshot {
    pub fn new(status_code: u16, uri: impl Into<String>) -> Self {
        Self {
            status_code,
            uri: uri.into(),
            body: None,
            detail_codes: Vec::new(),
            information_fragments: Vec::new(),
        }
    }

    /// Convert a response into a snapshot without extracting detail codes
    pub fn from_response(response: &HttpResponse) -> Self {
        let mut snapshot = Self::new(response.status(), response.uri());
        snapshot.body = response.body().map(str::to_owned);
        snapshot
    }

    #[must_use]
    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_detail_codes(mut self, detail_codes: impl IntoIterator<Item = i64>) -> Self {
        self.detail_codes = detail_codes.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_information_fragments<S: Into<String>>(
        mut self,
        fragments: impl IntoIterator<Item = S>,
    ) -> Self {
        self.information_fragments = fragments.into_iter().map(Into::into).collect();
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn detail_codes(&self) -> &[i64] {
        &self.detail_codes
    }

    pub fn information_fragments(&self) -> &[String] {
        &self.information_fragments
    }
}
