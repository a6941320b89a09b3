use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client as ReqwestClient, Method};
use steadfast_common::http::{HttpMethod, HttpRequest, HttpResponse, SendError, Transport};
use tracing::debug;
use url::Url;

use crate::errors::conversions::into_send_error;
use crate::errors::{InfraError, InfraResult};

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`Transport`] backed by a shared reqwest client.
///
/// Sends exactly one request per call. Retries and status validation belong
/// to the executor wrapping this transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> InfraResult<Self> {
        Self::builder().build()
    }

    /// Wrap an already configured reqwest client.
    pub fn from_client(client: ReqwestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, SendError> {
        let url = Url::parse(request.uri()).map_err(|source| {
            SendError::other(InfraError::InvalidUri { uri: request.uri().to_string(), source })
        })?;
        let method = to_reqwest_method(request.method());
        debug!(%method, %url, "sending HTTP request");

        let mut builder = self.client.request(method.clone(), url);
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_owned());
        }

        let response =
            builder.send().await.map_err(|err| into_send_error(err, request.uri()))?;
        let status = response.status().as_u16();
        let final_uri = response.url().to_string();
        debug!(%method, uri = %final_uri, status, "received HTTP response");

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (name.as_str().to_owned(), String::from_utf8_lossy(value.as_bytes()).into_owned())
            })
            .collect();
        let body = response.text().await.map_err(|err| into_send_error(err, request.uri()))?;

        let mut converted = HttpResponse::new(status, final_uri);
        for (name, value) in headers {
            converted = converted.with_header(name, value);
        }
        if !body.is_empty() {
            converted = converted.with_body(body);
        }
        Ok(converted)
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
    accept_invalid_certs: bool,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: None,
            default_headers: None,
            accept_invalid_certs: false,
        }
    }
}

impl ReqwestTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Test-only helper to allow insecure TLS (e.g., self-signed certs).
    #[cfg(test)]
    pub fn accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    pub fn build(self) -> InfraResult<ReqwestTransport> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(InfraError::HttpClient)?;
        Ok(ReqwestTransport { client })
    }
}
