//! Resilient request executor
//!
//! [`ResilientHttpClient`] resolves a retry policy by name, sends through the
//! injected [`Transport`], validates each response inside the retry loop and
//! hands back either the response or a [`TransportFailureError`].
//!
//! # Policy resolution
//!
//! Names present in the injected [`NamedRetryPolicies`] map use that policy.
//! Every other name shares one default policy which is built on first use
//! through the [`RetryPolicyFactory`]. The default is published with
//! double-checked locking: reads after the first build never take the lock,
//! and concurrent first use builds exactly one instance.
//!
//! # Errors
//!
//! Transport failures, including validation failures, are returned exactly as
//! the last attempt produced them. Any other error is wrapped once into a
//! `TransportFailureError` whose message names the policy and whether it was
//! found in the map; the original error stays reachable through `source()`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument};

use super::error::{SendError, TransportFailureError};
use super::transport::Transport;
use super::types::{HttpRequest, HttpResponse};
use super::validator::ResponseValidator;
use crate::error::{BoxedError, ConstructionError, ConstructionResult};
use crate::resilience::retry::{
    wait_duration, NamedRetryPolicies, RetryPolicy, RetryPolicyFactory, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_RETRY_POLICY_NAME, DEFAULT_WAIT_SECONDS,
};

/// Executes outbound requests under a named retry policy
#[async_trait]
pub trait ResilientRequestExecutor: Send + Sync {
    /// Send, validate and return the response body text
    async fn execute_http_request(
        &self,
        policy_name: &str,
        request: &HttpRequest,
    ) -> Result<String, TransportFailureError>;

    /// Send, validate and return the whole response
    async fn execute_raw_http_request(
        &self,
        policy_name: &str,
        request: &HttpRequest,
    ) -> Result<HttpResponse, TransportFailureError>;

    /// Send and return the whole response without validating its status
    async fn execute_no_validate_raw_http_request(
        &self,
        policy_name: &str,
        request: &HttpRequest,
    ) -> Result<HttpResponse, TransportFailureError>;
}

/// Tuning of the lazily built default policy
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultPolicySettings {
    pub max_attempts: u32,
    pub wait_seconds: f64,
    pub name: String,
}

impl Default for DefaultPolicySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            wait_seconds: DEFAULT_WAIT_SECONDS,
            name: DEFAULT_RETRY_POLICY_NAME.to_string(),
        }
    }
}

impl DefaultPolicySettings {
    fn validate(&self) -> ConstructionResult<()> {
        if self.max_attempts == 0 {
            return Err(ConstructionError::retry("default max_attempts must be greater than 0"));
        }
        if self.name.trim().is_empty() {
            return Err(ConstructionError::retry("default policy name must be non-empty"));
        }
        wait_duration(self.wait_seconds).map(|_| ())
    }
}

/// Default [`ResilientRequestExecutor`] implementation
pub struct ResilientHttpClient {
    transport: Arc<dyn Transport>,
    validator: Arc<dyn ResponseValidator>,
    retry_factory: Arc<dyn RetryPolicyFactory>,
    named_policies: NamedRetryPolicies,
    default_settings: DefaultPolicySettings,
    default_policy: OnceCell<Arc<RetryPolicy>>,
    default_policy_lock: Mutex<()>,
}

impl fmt::Debug for ResilientHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.named_policies.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ResilientHttpClient")
            .field("validator", &self.validator)
            .field("retry_factory", &self.retry_factory)
            .field("named_policies", &names)
            .field("default_settings", &self.default_settings)
            .field("default_policy_built", &self.default_policy.get().is_some())
            .finish_non_exhaustive()
    }
}

impl ResilientHttpClient {
    /// Create an executor with the default policy tuning
    ///
    /// # Errors
    /// Returns `ConstructionError::InvalidPolicyNames` if any key of
    /// `named_policies` is empty or whitespace.
    pub fn new(
        transport: Arc<dyn Transport>,
        validator: Arc<dyn ResponseValidator>,
        retry_factory: Arc<dyn RetryPolicyFactory>,
        named_policies: NamedRetryPolicies,
    ) -> ConstructionResult<Self> {
        Self::with_default_settings(
            transport,
            validator,
            retry_factory,
            named_policies,
            DefaultPolicySettings::default(),
        )
    }

    /// Create an executor with custom default policy tuning
    ///
    /// # Errors
    /// Returns `ConstructionError` for empty policy names or invalid default
    /// tuning.
    pub fn with_default_settings(
        transport: Arc<dyn Transport>,
        validator: Arc<dyn ResponseValidator>,
        retry_factory: Arc<dyn RetryPolicyFactory>,
        named_policies: NamedRetryPolicies,
        default_settings: DefaultPolicySettings,
    ) -> ConstructionResult<Self> {
        let mut invalid: Vec<String> =
            named_policies.keys().filter(|name| name.trim().is_empty()).cloned().collect();
        if !invalid.is_empty() {
            invalid.sort();
            return Err(ConstructionError::InvalidPolicyNames { entries: invalid });
        }
        default_settings.validate()?;

        Ok(Self {
            transport,
            validator,
            retry_factory,
            named_policies,
            default_settings,
            default_policy: OnceCell::new(),
            default_policy_lock: Mutex::new(()),
        })
    }

    pub fn builder() -> ResilientHttpClientBuilder {
        ResilientHttpClientBuilder::default()
    }

    /// Resolve the policy used for `policy_name`
    ///
    /// # Errors
    /// Returns `ConstructionError` if the default policy has to be built and
    /// the factory rejects the default tuning.
    pub fn retry_policy(&self, policy_name: &str) -> ConstructionResult<Arc<RetryPolicy>> {
        match self.named_policies.get(policy_name) {
            Some(policy) => Ok(Arc::clone(policy)),
            None => self.default_policy(),
        }
    }

    fn default_policy(&self) -> ConstructionResult<Arc<RetryPolicy>> {
        if let Some(policy) = self.default_policy.get() {
            return Ok(Arc::clone(policy));
        }

        let _guard = self.default_policy_lock.lock();
        if let Some(policy) = self.default_policy.get() {
            return Ok(Arc::clone(policy));
        }

        let settings = &self.default_settings;
        let policy = Arc::new(self.retry_factory.build(
            settings.max_attempts,
            settings.wait_seconds,
            &settings.name,
        )?);
        info!(
            policy = %policy.name(),
            max_attempts = policy.max_attempts(),
            "Built default retry policy"
        );
        // Only reachable by the lock holder, so the cell is still empty here.
        let _ = self.default_policy.set(Arc::clone(&policy));
        Ok(policy)
    }

    /// Diagnostic naming the requested policy and whether it is registered
    pub fn policy_diagnostic(&self, policy_name: &str) -> String {
        format!(
            "(Retry.Name=\"{policy_name}\", PolicyExistsInNamedRetryPolicies=\"{}\")",
            self.named_policies.contains_key(policy_name)
        )
    }

    fn wrap_unrelated(&self, policy_name: &str, cause: BoxedError) -> TransportFailureError {
        let message = self.policy_diagnostic(policy_name);
        error!(error = %cause, "Request failed outside the retry policy {message}");
        TransportFailureError::from_message(message).with_source(cause)
    }

    async fn send(
        &self,
        policy_name: &str,
        request: &HttpRequest,
        validate: bool,
    ) -> Result<HttpResponse, TransportFailureError> {
        let policy = self
            .retry_policy(policy_name)
            .map_err(|e| self.wrap_unrelated(policy_name, Box::new(e)))?;

        let transport = self.transport.as_ref();
        let validator = self.validator.as_ref();
        let result = policy
            .execute(Some(request.uri()), || async move {
                let response = transport.send(request).await?;
                if validate {
                    validator.validate(&response)?;
                }
                Ok(response)
            })
            .await;

        match result {
            Ok(response) => {
                debug!(status = response.status(), "Request completed");
                Ok(response)
            }
            Err(SendError::Transport(failure)) => Err(failure),
            Err(SendError::Other(cause)) => Err(self.wrap_unrelated(policy_name, cause)),
        }
    }
}

#[async_trait]
impl ResilientRequestExecutor for ResilientHttpClient {
    #[instrument(skip(self, request), fields(method = %request.method(), uri = %request.uri()))]
    async fn execute_http_request(
        &self,
        policy_name: &str,
        request: &HttpRequest,
    ) -> Result<String, TransportFailureError> {
        self.send(policy_name, request, true).await.map(HttpResponse::into_text)
    }

    #[instrument(skip(self, request), fields(method = %request.method(), uri = %request.uri()))]
    async fn execute_raw_http_request(
        &self,
        policy_name: &str,
        request: &HttpRequest,
    ) -> Result<HttpResponse, TransportFailureError> {
        self.send(policy_name, request, true).await
    }

    #[instrument(skip(self, request), fields(method = %request.method(), uri = %request.uri()))]
    async fn execute_no_validate_raw_http_request(
        &self,
        policy_name: &str,
        request: &HttpRequest,
    ) -> Result<HttpResponse, TransportFailureError> {
        self.send(policy_name, request, false).await
    }
}

/// Builder for [`ResilientHttpClient`]
///
/// Every collaborator must be supplied; a missing one is reported as
/// [`ConstructionError::MissingDependency`].
#[derive(Default)]
pub struct ResilientHttpClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    validator: Option<Arc<dyn ResponseValidator>>,
    retry_factory: Option<Arc<dyn RetryPolicyFactory>>,
    named_policies: Option<NamedRetryPolicies>,
    default_settings: DefaultPolicySettings,
}

impl ResilientHttpClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn response_validator(mut self, validator: Arc<dyn ResponseValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn retry_factory(mut self, factory: Arc<dyn RetryPolicyFactory>) -> Self {
        self.retry_factory = Some(factory);
        self
    }

    pub fn named_retry_policies(mut self, policies: NamedRetryPolicies) -> Self {
        self.named_policies = Some(policies);
        self
    }

    /// Override the tuning of the default policy
    pub fn default_policy(
        mut self,
        max_attempts: u32,
        wait_seconds: f64,
        name: impl Into<String>,
    ) -> Self {
        self.default_settings = DefaultPolicySettings { max_attempts, wait_seconds, name: name.into() };
        self
    }

    pub fn build(self) -> ConstructionResult<ResilientHttpClient> {
        let transport =
            self.transport.ok_or(ConstructionError::MissingDependency { dependency: "transport" })?;
        let validator = self
            .validator
            .ok_or(ConstructionError::MissingDependency { dependency: "response_validator" })?;
        let retry_factory = self
            .retry_factory
            .ok_or(ConstructionError::MissingDependency { dependency: "retry_factory" })?;
        let named_policies = self
            .named_policies
            .ok_or(ConstructionError::MissingDependency { dependency: "named_retry_policies" })?;

        ResilientHttpClient::with_default_settings(
            transport,
            validator,
            retry_factory,
            named_policies,
            self.default_settings,
        )
    }
}
