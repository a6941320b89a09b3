//! Resilience benchmarks
//!
//! Benchmarks for backoff calculation, failed-response snapshot extraction,
//! and the retry and executor success paths.
//!
//! Run with: `cargo bench --bench resilience_bench -p steadfast-common
//! --features runtime`

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use steadfast_common::http::{
    build_snapshot, DefaultResponseValidator, HttpRequest, HttpResponse, ResilientHttpClient,
    ResilientRequestExecutor, SendError,
};
use steadfast_common::resilience::{
    BackoffStrategy, DefaultRetryPolicyFactory, NamedRetryPolicies, RetryPolicy,
};
use steadfast_common::testing::{MockOutcome, MockTransport};
use tokio::runtime::Builder as RuntimeBuilder;

// ============================================================================
// Backoff Benchmarks
// ============================================================================

fn bench_backoff_calculation(c: &mut Criterion) {
    let mut group = c.benchmark_group("backoff_calculation");

    let strategies = [
        ("fixed", BackoffStrategy::Fixed(Duration::from_millis(250))),
        (
            "linear",
            BackoffStrategy::Linear {
                initial_delay: Duration::from_millis(100),
                increment: Duration::from_millis(50),
            },
        ),
        ("exponential", BackoffStrategy::exponential(Duration::from_millis(250))),
    ];

    for (name, strategy) in strategies {
        for retry_index in [0_u32, 4, 16] {
            group.bench_with_input(BenchmarkId::new(name, retry_index), &retry_index, |b, &n| {
                b.iter(|| black_box(strategy.calculate_delay(black_box(n))));
            });
        }
    }

    group.finish();
}

// ============================================================================
// Snapshot Benchmarks
// ============================================================================

fn bench_snapshot_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_extraction");

    let bare = HttpResponse::new(503, "https://api.example.com/v1/orders");
    let headers_only = bare
        .clone()
        .with_header("X-Detail-Codes", "10,20,x,30")
        .with_header("X-Information-Fragments", "upstream, timeout");
    let codes: Vec<String> = (0..64).map(|code| code.to_string()).collect();
    let with_body = headers_only.clone().with_body(format!(
        "{{\"detailCodes\":[{}],\"informationFragments\":[\"db\",\"pool exhausted\"]}}",
        codes.join(",")
    ));

    for (name, response) in [("bare", bare), ("headers", headers_only), ("headers_and_body", with_body)]
    {
        group.bench_function(name, |b| b.iter(|| black_box(build_snapshot(black_box(&response)))));
    }

    group.finish();
}

// ============================================================================
// Retry and Executor Benchmarks
// ============================================================================

fn bench_success_paths(c: &mut Criterion) {
    let runtime = match RuntimeBuilder::new_current_thread().enable_time().build() {
        Ok(runtime) => runtime,
        Err(err) => panic!("failed to build benchmark runtime: {err}"),
    };
    let mut group = c.benchmark_group("success_paths");

    let policy = match RetryPolicy::new("bench", 3, 0.25) {
        Ok(policy) => policy,
        Err(err) => panic!("invalid benchmark policy: {err}"),
    };
    group.bench_function("retry_first_attempt", |b| {
        b.to_async(&runtime).iter(|| async {
            let result = policy.execute(None, || async { Ok::<_, SendError>(black_box(42)) }).await;
            black_box(result)
        });
    });

    let transport = MockTransport::new();
    transport.set_fallback(MockOutcome::Respond(
        HttpResponse::new(200, "https://api.example.com/v1/orders").with_body("[]"),
    ));
    let client = match ResilientHttpClient::builder()
        .transport(Arc::new(transport))
        .response_validator(Arc::new(DefaultResponseValidator::new()))
        .retry_factory(Arc::new(DefaultRetryPolicyFactory::new()))
        .named_retry_policies(NamedRetryPolicies::new())
        .build()
    {
        Ok(client) => client,
        Err(err) => panic!("failed to build benchmark executor: {err}"),
    };
    let request = HttpRequest::get("https://api.example.com/v1/orders");
    group.bench_function("executor_validated_request", |b| {
        b.to_async(&runtime).iter(|| async {
            black_box(client.execute_http_request("bench", &request).await)
        });
    });

    group.finish();
}

criterion_group!(
    resilience_benches,
    bench_backoff_calculation,
    bench_snapshot_extraction,
    bench_success_paths
);
criterion_main!(resilience_benches);
