//! Shared fixtures for integration tests

#![allow(dead_code)]

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jwks_client::{ClientOptions, Error, FetchFuture};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const JWKS_URI: &str = "https://issuer.example/.well-known/jwks.json";

/// RSA signing key with a 2048-bit modulus
pub fn rsa_key(kid: &str) -> Value {
    json!({
        "kty": "RSA",
        "kid": kid,
        "use": "sig",
        "alg": "RS256",
        "n": URL_SAFE_NO_PAD.encode([0xC5; 256]),
        "e": "AQAB",
    })
}

/// RSA key published for encryption only
pub fn encryption_key(kid: &str) -> Value {
    let mut key = rsa_key(kid);
    key["use"] = json!("enc");
    key
}

pub fn jwks(keys: Vec<Value>) -> String {
    json!({ "keys": keys }).to_string()
}

/// Counts the fetches reaching the key source
#[derive(Clone, Default)]
pub struct FetchCounter(Arc<AtomicUsize>);

impl FetchCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options whose fetcher serves `body` after `delay`
pub fn counting_options(body: String, delay: Duration) -> (ClientOptions, FetchCounter) {
    let counter = FetchCounter::default();
    let fetches = counter.clone();
    let mut options = ClientOptions::new(JWKS_URI);
    options.fetcher(Arc::new(move |_url: String| -> FetchFuture {
        fetches.0.fetch_add(1, Ordering::SeqCst);
        let body = body.clone();
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            Ok(body.into_bytes())
        })
    }));
    (options, counter)
}

/// Options whose fetcher always fails with `error`
pub fn failing_options(error: Error) -> (ClientOptions, FetchCounter) {
    let counter = FetchCounter::default();
    let fetches = counter.clone();
    let mut options = ClientOptions::new(JWKS_URI);
    options.fetcher(Arc::new(move |_url: String| -> FetchFuture {
        fetches.0.fetch_add(1, Ordering::SeqCst);
        let error = error.clone();
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Err(error)
        })
    }));
    (options, counter)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
