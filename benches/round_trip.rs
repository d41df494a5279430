//! Request round-trip benchmark suite.
//!
//! Measures `Session::evaluate` latency against the in-process mock
//! endpoint, sequentially and with concurrent callers:
//! - Concurrency: 1, 10, 100
//!
//! Run with: cargo bench --bench round_trip
//! Results saved to: target/criterion/

#[path = "../tests/common/mod.rs"]
mod common;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use devtools_bridge::Session;
use futures_util::future::join_all;
use serde_json::json;
use tokio::runtime::Runtime;

use common::{MockEngine, Reply};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const CONCURRENCY: &[usize] = &[1, 10, 100];

// ============================================================================
// Benchmark: Evaluate Round Trip
// ============================================================================

fn bench_evaluate(c: &mut Criterion) {
    let rt = Runtime::new().expect("runtime");
    let (_mock, session) = rt.block_on(async {
        let mock = MockEngine::with_evaluator(|_| Reply::value(json!({"x": 5, "y": 7}))).await;
        let session = Session::connect(&mock.browser_url())
            .await
            .expect("connect");
        (mock, session)
    });

    let mut group = c.benchmark_group("evaluate");

    for &concurrency in CONCURRENCY {
        group.bench_with_input(
            BenchmarkId::new("concurrent", concurrency),
            &concurrency,
            |b, &callers| {
                b.to_async(&rt).iter(|| {
                    let session = session.clone();
                    async move {
                        let calls = (0..callers).map(|_| session.evaluate("({x:5,y:7})"));
                        for result in join_all(calls).await {
                            result.expect("evaluate");
                        }
                    }
                });
            },
        );
    }

    group.finish();
    rt.block_on(session.kill());
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
