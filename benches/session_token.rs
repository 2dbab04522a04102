//! Performance benchmarks for the access path.
//!
//! Run with: `cargo bench --bench session_token`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | Token issue | <50μs | JSON encode + HMAC |
//! | Token verify | <50μs | HMAC + JSON decode |
//! | Claim extraction + gate | <20μs | Body parse dominates |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use http::Method;

use taskmaster_service::{
    authorize, extract_claim, Identity, SessionToken, TokenService,
};

fn bench_issue(c: &mut Criterion) {
    let service = TokenService::new(b"benchmark_secret_32_bytes_min___".to_vec());
    let identity = Identity::new("bench@example.com", "user-1234");

    c.bench_function("token_issue", |b| {
        b.iter(|| service.issue(black_box(&identity)))
    });
}

fn bench_verify(c: &mut Criterion) {
    let service = TokenService::new(b"benchmark_secret_32_bytes_min___".to_vec());
    let identity = Identity::new("bench@example.com", "user-1234");
    let valid = service.issue(&identity);
    let forged = SessionToken::from_string(format!("{}00", valid.as_str()));

    let mut group = c.benchmark_group("token_verify");
    group.throughput(Throughput::Elements(1));
    group.bench_function("valid", |b| {
        b.iter(|| service.verify(black_box(&valid)))
    });
    group.bench_function("forged", |b| {
        b.iter(|| service.verify(black_box(&forged)))
    });
    group.finish();
}

fn bench_gate(c: &mut Criterion) {
    let verified = Identity::new("bench@example.com", "user-1234");

    let mut group = c.benchmark_group("claim_and_gate");
    for description_len in [0usize, 1_000, 100_000] {
        let body = serde_json::json!({
            "email": "bench@example.com",
            "userId": "user-1234",
            "blogData": {"longDescription": "x".repeat(description_len)},
        })
        .to_string();

        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("put_body", description_len),
            &body,
            |b, body| {
                b.iter(|| {
                    let claim = extract_claim(&Method::PUT, None, black_box(body.as_bytes()));
                    authorize(&verified, &claim)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_issue, bench_verify, bench_gate);
criterion_main!(benches);
