//! Signing key lookup benchmark
//!
//! Compares cached lookups against lookups that resolve through the full
//! fetch, parse and filter path on every call. The key source is in memory,
//! so the uncached figure measures parsing and selection, not the network.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use jwks_client::{ClientOptions, FetchFuture, JwksClient};
use serde_json::json;
use std::sync::Arc;

/// Key set with `count` RSA-2048 keys, kids `k0..k{count-1}`
fn jwks_body(count: usize) -> Arc<Vec<u8>> {
    let keys: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "kty": "RSA",
                "kid": format!("k{i}"),
                "use": "sig",
                "n": URL_SAFE_NO_PAD.encode([0xC5; 256]),
                "e": "AQAB",
            })
        })
        .collect();
    Arc::new(json!({ "keys": keys }).to_string().into_bytes())
}

fn client(body: Arc<Vec<u8>>, cache: bool) -> JwksClient {
    let options = ClientOptions::new("https://issuer.example/.well-known/jwks.json")
        .cache(cache)
        .fetcher(Arc::new(move |_url: String| -> FetchFuture {
            let body = body.clone();
            Box::pin(async move { Ok(body.as_ref().clone()) })
        }))
        .build();
    JwksClient::new(options).expect("client")
}

fn bench_lookup(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("get_signing_key");

    for count in [1, 10, 50] {
        let body = jwks_body(count);
        let kid = format!("k{}", count - 1);

        let cached = client(body.clone(), true);
        runtime.block_on(cached.get_signing_key(Some(kid.as_str()))).expect("warm cache");
        group.bench_function(format!("cached/{count}_keys"), |b| {
            b.to_async(&runtime)
                .iter(|| async { black_box(cached.get_signing_key(Some(kid.as_str())).await) })
        });

        let uncached = client(body, false);
        group.bench_function(format!("uncached/{count}_keys"), |b| {
            b.to_async(&runtime)
                .iter(|| async { black_box(uncached.get_signing_key(Some(kid.as_str())).await) })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lookup);
criterion_main!(benches);
