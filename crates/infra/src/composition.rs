//! Wiring of the default resilient executor
//!
//! Assembles a [`ResilientHttpClient`] from [`ResilienceSettings`]:
//! a [`ReqwestTransport`] with the configured timeout and user agent, a
//! validator with the configured status bounds, the default retry factory
//! and the configured default-policy tuning.

use std::sync::Arc;

use steadfast_common::http::{DefaultResponseValidator, ResilientHttpClient, Transport};
use steadfast_common::resilience::{DefaultRetryPolicyFactory, NamedRetryPolicies};
use tracing::info;

use crate::config::ResilienceSettings;
use crate::errors::InfraResult;
use crate::http::ReqwestTransport;

/// Build the default executor over a reqwest transport
///
/// # Errors
/// Returns `InfraError` if the settings are invalid, the HTTP client cannot
/// be built, or a named policy is registered under an empty name.
pub fn build_resilient_client(
    settings: &ResilienceSettings,
    named_policies: NamedRetryPolicies,
) -> InfraResult<ResilientHttpClient> {
    settings.validate()?;

    let mut transport = ReqwestTransport::builder().timeout(settings.request_timeout());
    if let Some(agent) = &settings.user_agent {
        transport = transport.user_agent(agent.clone());
    }

    build_with_transport(settings, Arc::new(transport.build()?), named_policies)
}

/// Build the default executor over any transport
///
/// # Errors
/// Same as [`build_resilient_client`], minus HTTP client construction.
pub fn build_with_transport(
    settings: &ResilienceSettings,
    transport: Arc<dyn Transport>,
    named_policies: NamedRetryPolicies,
) -> InfraResult<ResilientHttpClient> {
    settings.validate()?;

    let validator =
        DefaultResponseValidator::with_bounds(settings.status_lower_bound, settings.status_upper_bound)?;
    let policy_count = named_policies.len();
    let client = ResilientHttpClient::with_default_settings(
        transport,
        Arc::new(validator),
        Arc::new(DefaultRetryPolicyFactory::new()),
        named_policies,
        settings.default_policy(),
    )?;

    info!(
        policy_count,
        default_policy = %settings.default_policy_name,
        lower_bound = settings.status_lower_bound,
        upper_bound = settings.status_upper_bound,
        "Resilient HTTP client ready"
    );
    Ok(client)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use steadfast_common::error::ConstructionError;
    use steadfast_common::resilience::RetryPolicy;

    use super::*;
    use crate::errors::InfraError;

    #[test]
    fn test_builds_with_defaults() {
        let client = build_resilient_client(&ResilienceSettings::default(), NamedRetryPolicies::new())
            .expect("client");

        let policy = client.retry_policy("anything").expect("default policy");
        assert_eq!(policy.name(), "DefaultRetryPolicyName");
        assert_eq!(policy.max_attempts(), 3);
    }

    #[test]
    fn test_named_policies_are_registered() {
        let mut policies = NamedRetryPolicies::new();
        policies.insert("Orders".into(), Arc::new(RetryPolicy::new("Orders", 5, 0.1).unwrap()));

        let client =
            build_resilient_client(&ResilienceSettings::default(), policies).expect("client");

        assert_eq!(client.retry_policy("Orders").unwrap().max_attempts(), 5);
    }

    #[test]
    fn test_rejects_blank_policy_names() {
        let mut policies = NamedRetryPolicies::new();
        policies.insert(" ".into(), Arc::new(RetryPolicy::new("blank", 1, 0.0).unwrap()));

        let err = build_resilient_client(&ResilienceSettings::default(), policies).unwrap_err();
        assert!(matches!(
            err,
            InfraError::Construction(ConstructionError::InvalidPolicyNames { .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let settings = ResilienceSettings { max_attempts: 0, ..Default::default() };
        let err = build_resilient_client(&settings, NamedRetryPolicies::new()).unwrap_err();
        assert!(matches!(err, InfraError::Config(_)));
    }
}
