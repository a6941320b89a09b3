//! Integration tests for `steadfast_common::error` and the HTTP error kinds.
//!
//! These suites validate classification, message formats and source chains so
//! that callers receive consistent failure semantics without matching on
//! concrete variants.

use std::error::Error as _;

use steadfast_common::error::{ConstructionError, ErrorClassification, ErrorSeverity};
use steadfast_common::http::{
    FailedResponseSnapshot, HttpResponse, SendError, StatusOutOfBounds, TransportFailureError,
};

/// Validates the classification matrix of the public error kinds.
///
/// Assertions:
/// - Transport failures are retryable; construction errors are not.
/// - 4xx snapshots are `Error`, everything else is `Warning`.
/// - Nothing is critical.
#[test]
fn classification_matrix_matches_expected_contract() {
    let with_status = |status: u16| {
        TransportFailureError::from_message_and_snapshot(
            "failed",
            FailedResponseSnapshot::new(status, "https://api.example.com"),
        )
    };

    let cases = [
        (with_status(400), ErrorSeverity::Error),
        (with_status(429), ErrorSeverity::Error),
        (with_status(500), ErrorSeverity::Warning),
        (TransportFailureError::from_message("connection refused"), ErrorSeverity::Warning),
    ];
    for (error, severity) in cases {
        assert!(error.is_retryable());
        assert!(!error.is_critical());
        assert_eq!(error.severity(), severity, "{error:?}");
    }

    let misuse = ConstructionError::MissingDependency { dependency: "retry_factory" };
    assert!(!misuse.is_retryable());
    assert_eq!(misuse.severity(), ErrorSeverity::Error);
}

/// Validates a transport failure keeps a three-level source chain intact.
///
/// Assertions:
/// - The first source is the status bounds failure.
/// - Walking the chain visits every level once.
#[test]
fn source_chain_is_preserved() {
    let bounds = StatusOutOfBounds { status: 502, lower_bound: 200, upper_bound: 299 };
    let snapshot = FailedResponseSnapshot::from_response(&HttpResponse::new(502, "https://a"));
    let error = TransportFailureError::from_message_and_snapshot(bounds.to_string(), snapshot)
        .with_source(bounds);
    let wrapped = SendError::from(error);

    assert!(wrapped.is_transport_failure());
    // `#[error(transparent)]` forwards source() to the inner error's source.
    let first = wrapped.source().map(ToString::to_string);
    assert_eq!(first.as_deref(), Some(bounds.to_string().as_str()));

    let mut depth = 0;
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(&wrapped);
    while let Some(error) = current {
        depth += 1;
        current = error.source();
    }
    assert_eq!(depth, 2);
}

#[test]
fn snapshot_survives_serialization() {
    let snapshot = FailedResponseSnapshot::new(409, "https://api.example.com/orders/1")
        .with_body(Some("{\"detailCodes\":[7]}".to_string()))
        .with_detail_codes([7])
        .with_information_fragments(["conflict"]);

    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"statusCode\":409"));
    assert!(json.contains("\"body\""));

    let restored: FailedResponseSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, snapshot);
}

#[test]
fn construction_error_messages_name_the_input() {
    let cases = [
        (
            ConstructionError::MissingDependency { dependency: "transport" },
            "transport is required",
        ),
        (
            ConstructionError::InvalidPolicyNames { entries: vec![" ".to_string()] },
            "Invalid entries",
        ),
        (ConstructionError::retry("max_attempts must be greater than 0"), "max_attempts"),
    ];

    for (error, fragment) in cases {
        assert!(error.to_string().contains(fragment), "{error}");
    }
}
