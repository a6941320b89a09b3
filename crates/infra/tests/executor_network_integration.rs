//! Integration tests for the resilient executor over a real HTTP stack
//!
//! **Purpose**: Test the path from executor → retry policy → reqwest →
//! validator → caller
//!
//! **Coverage:**
//! - Happy path: one request, validated body returned
//! - Transient 5xx: retried until a 2xx arrives
//! - Exhausted retries: snapshot merges header and body diagnostics
//! - No-validate variant: error statuses returned as responses
//! - Network failure: connection refused retried and surfaced
//!
//! **Infrastructure:**
//! - WireMock HTTP server
//! - `ReqwestTransport` wired through `build_resilient_client`

use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use steadfast_common::http::{HttpRequest, ResilientRequestExecutor};
use steadfast_common::resilience::{NamedRetryPolicies, RetryPolicy};
use steadfast_infra::{build_resilient_client, ResilienceSettings};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_settings() -> ResilienceSettings {
    ResilienceSettings { wait_seconds: 0.0, request_timeout_seconds: 5, ..Default::default() }
}

#[tokio::test]
async fn returns_validated_body_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":1}]"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_resilient_client(&fast_settings(), NamedRetryPolicies::new()).unwrap();
    let body = client
        .execute_http_request("Orders", &HttpRequest::get(format!("{}/v1/orders", server.uri())))
        .await
        .unwrap();

    assert_eq!(body, r#"[{"id":1}]"#);
}

#[tokio::test]
async fn retries_server_errors_until_success() {
    let server = MockServer::start().await;
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_clone = attempts.clone();
    Mock::given(method("GET"))
        .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
            if attempts_clone.fetch_add(1, Ordering::SeqCst) < 2 {
                ResponseTemplate::new(503)
            } else {
                ResponseTemplate::new(200).set_body_string("ok")
            }
        })
        .expect(3)
        .mount(&server)
        .await;

    let client = build_resilient_client(&fast_settings(), NamedRetryPolicies::new()).unwrap();
    let body = client.execute_http_request("any", &HttpRequest::get(server.uri())).await.unwrap();

    assert_eq!(body, "ok");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

/// Validates the snapshot a caller receives once retries are exhausted.
///
/// Assertions:
/// - The named policy's attempt count is honoured.
/// - Header codes come first, then body codes; non-numeric parts are dropped.
/// - Fragments are trimmed.
#[tokio::test]
async fn exhausted_retries_surface_merged_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(422)
                .insert_header("X-Detail-Codes", "10,abc,20")
                .insert_header("X-Information-Fragments", " quota , region ")
                .set_body_string(r#"{"detailCodes":[30],"informationFragments":["retry later"]}"#),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut policies = NamedRetryPolicies::new();
    policies.insert("Orders".into(), Arc::new(RetryPolicy::new("Orders", 2, 0.0).unwrap()));
    let client = build_resilient_client(&fast_settings(), policies).unwrap();

    let error = client
        .execute_raw_http_request("Orders", &HttpRequest::post(server.uri()).with_body("{}"))
        .await
        .unwrap_err();

    let snapshot = error.snapshot().expect("snapshot");
    assert_eq!(snapshot.status_code(), 422);
    assert_eq!(snapshot.detail_codes(), &[10, 20, 30]);
    assert_eq!(snapshot.information_fragments(), &["quota", "region", "retry later"]);
    assert_eq!(error.status_code(), Some(422));
}

#[tokio::test]
async fn no_validate_returns_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_resilient_client(&fast_settings(), NamedRetryPolicies::new()).unwrap();
    let response = client
        .execute_no_validate_raw_http_request("any", &HttpRequest::get(server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(response.text(), "missing");
}

#[tokio::test]
async fn network_failure_surfaces_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener); // release the port so that requests fail with ECONNREFUSED
    let url = format!("http://{}", addr);

    let client = build_resilient_client(&fast_settings(), NamedRetryPolicies::new()).unwrap();
    let error = client.execute_raw_http_request("any", &HttpRequest::get(&url)).await.unwrap_err();

    assert!(error.message().contains(&url), "{}", error.message());
    assert!(error.snapshot().is_none());
}
