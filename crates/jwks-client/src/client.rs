//! JWKS client
//!
//! Assembles the lookup chain described in [`crate::lookup`] from
//! [`ClientOptions`] and exposes it in two calling conventions: `async`
//! methods, and callback methods that run the same future on the tokio
//! runtime and hand its result to a closure.

use crate::cache::CacheLayer;
use crate::error::{Error, Result};
use crate::header::TokenHeader;
use crate::interceptor::InterceptorLayer;
use crate::jwks::jwk::{Jwk, SigningKey};
use crate::lookup::{Layer, Lookup, compose};
use crate::options::ClientOptions;
use crate::rate_limit::RateLimitLayer;
use crate::resolver::Resolver;
use crate::source::KeySource;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Resolves signing keys published at a JWKS endpoint
///
/// Cloning is cheap; clones share the cache and rate windows.
///
/// # Example
///
/// ```ignore
/// let client = JwksClient::new(
///     ClientOptions::new("https://issuer.example/.well-known/jwks.json")
///         .cache_max_age(Duration::from_secs(600))
///         .rate_limit(true)
///         .build(),
/// )?;
///
/// let key = client.get_signing_key(Some("k1")).await?;
/// let pem = key.public_key()?;
/// ```
#[derive(Clone)]
pub struct JwksClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    resolver: Arc<Resolver>,
    cache: Option<Arc<CacheLayer>>,
    rate_limiter: Option<Arc<RateLimitLayer>>,
    interceptor: Option<Arc<InterceptorLayer>>,
    /// Head of the composed chain
    lookup: Arc<dyn Lookup>,
    layers: Vec<Layer>,
    span: tracing::Span,
}

impl std::fmt::Debug for JwksClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = &self.inner;
        f.debug_struct("JwksClient")
            .field("layers", &inner.layers)
            .field("cache", &inner.cache.is_some())
            .field("rate_limiter", &inner.rate_limiter)
            .field("interceptor", &inner.interceptor.is_some())
            .finish_non_exhaustive()
    }
}

impl JwksClient {
    /// Create a client, validating the options first
    pub fn new(options: ClientOptions) -> Result<Self> {
        options.validate()?;

        let span = tracing::debug_span!("jwks_client", jwks_uri = %options.jwks_uri);
        let resolver = Arc::new(Resolver::new(KeySource::new(&options)?));

        let mut cache = None;
        let mut rate_limiter = None;
        let mut interceptor = None;
        let (lookup, layers) = compose(resolver.clone(), |layer, next| match layer {
            Layer::Interceptor => {
                let hook = options.get_keys_interceptor.clone()?;
                let stage = Arc::new(InterceptorLayer::new(hook, next));
                interceptor = Some(stage.clone());
                Some(stage as Arc<dyn Lookup>)
            }
            Layer::RateLimiter if options.rate_limit => {
                let stage = Arc::new(RateLimitLayer::new(
                    next,
                    options.jwks_requests_per_minute,
                    options.rate_limit_window,
                    options.rate_limit_scope,
                ));
                rate_limiter = Some(stage.clone());
                Some(stage as Arc<dyn Lookup>)
            }
            Layer::Cache if options.cache => {
                let stage = Arc::new(CacheLayer::new(
                    next,
                    options.cache_max_entries,
                    options.cache_max_age,
                ));
                cache = Some(stage.clone());
                Some(stage as Arc<dyn Lookup>)
            }
            _ => None,
        });

        span.in_scope(|| tracing::debug!(?layers, "client ready"));

        Ok(Self {
            inner: Arc::new(ClientInner {
                resolver,
                cache,
                rate_limiter,
                interceptor,
                lookup,
                layers,
                span,
            }),
        })
    }

    /// Active decorator stages, outermost first
    pub fn layers(&self) -> &[Layer] {
        &self.inner.layers
    }

    /// Fetch every key published by the endpoint
    pub async fn get_keys(&self) -> Result<Vec<Jwk>> {
        self.inner
            .resolver
            .get_keys()
            .instrument(self.inner.span.clone())
            .await
    }

    /// Fetch the published keys usable for signature verification
    pub async fn get_signing_keys(&self) -> Result<Vec<SigningKey>> {
        self.inner
            .resolver
            .get_signing_keys()
            .instrument(self.inner.span.clone())
            .await
    }

    /// Resolve the signing key for `kid` through the decorator chain
    ///
    /// Without a kid, the endpoint must publish exactly one signing key.
    pub async fn get_signing_key(&self, kid: Option<&str>) -> Result<SigningKey> {
        self.inner
            .lookup
            .lookup(kid)
            .instrument(self.inner.span.clone())
            .await
    }

    /// Resolve the key a JWT claims to be signed with
    ///
    /// Reads the unverified header for `alg` and `kid`. The token's signature
    /// is not checked; that is left to the caller, using the returned key.
    pub async fn get_signing_key_for_token(&self, token: &str) -> Result<SigningKey> {
        let header = TokenHeader::from_token(token)?;
        let algorithm = header.algorithm()?;
        let key = self.get_signing_key(header.key_id.as_deref()).await?;

        if key.key_type() != algorithm.key_type() {
            return Err(Error::AlgorithmUnsupported(format!(
                "{} cannot be verified with a {} key",
                header.algorithm,
                key.key_type()
            )));
        }
        if key.alg().is_some_and(|alg| alg != header.algorithm) {
            return Err(Error::AlgorithmUnsupported(format!(
                "{} does not match the key's algorithm",
                header.algorithm
            )));
        }
        Ok(key)
    }

    /// Callback form of [`get_keys`](Self::get_keys)
    pub fn get_keys_with<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Vec<Jwk>>) + Send + 'static,
    {
        let client = self.clone();
        tokio::spawn(async move { callback(client.get_keys().await) })
    }

    /// Callback form of [`get_signing_keys`](Self::get_signing_keys)
    pub fn get_signing_keys_with<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Vec<SigningKey>>) + Send + 'static,
    {
        let client = self.clone();
        tokio::spawn(async move { callback(client.get_signing_keys().await) })
    }

    /// Callback form of [`get_signing_key`](Self::get_signing_key)
    ///
    /// Must be called within a tokio runtime. The returned handle completes
    /// once the callback has run.
    pub fn get_signing_key_with<F>(&self, kid: Option<&str>, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<SigningKey>) + Send + 'static,
    {
        let client = self.clone();
        let kid = kid.map(str::to_string);
        tokio::spawn(async move { callback(client.get_signing_key(kid.as_deref()).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::StaticKeys;
    use crate::source::FetchFuture;
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const JWKS: &str = r#"{"keys":[
        {"kty":"RSA","kid":"rsa1","alg":"RS256","use":"sig","n":"wQ","e":"AQAB"},
        {"kty":"EC","kid":"ec1","crv":"P-256",
         "x":"ERERERERERERERERERERERERERERERERERERERERERE",
         "y":"IiIiIiIiIiIiIiIiIiIiIiIiIiIiIiIiIiIiIiIiIiI"}
    ]}"#;

    fn options(body: &'static str) -> (ClientOptions, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();
        let mut options = ClientOptions::new("https://issuer.example/jwks.json");
        options.fetcher(Arc::new(move |_url: String| -> FetchFuture {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(body.as_bytes().to_vec()) })
        }));
        (options, fetches)
    }

    fn token(header: &str) -> String {
        format!("{}.e30.c2ln", URL_SAFE_NO_PAD.encode(header))
    }

    #[tokio::test]
    async fn test_default_chain_is_cache_only() {
        let (options, _) = options(JWKS);
        let client = JwksClient::new(options).unwrap();
        assert_eq!(client.layers(), &[Layer::Cache]);
    }

    #[tokio::test]
    async fn test_full_chain_order() {
        let (mut options, _) = options(JWKS);
        options
            .rate_limit(true)
            .get_keys_interceptor(Arc::new(StaticKeys::new(Vec::new())));
        let client = JwksClient::new(options).unwrap();
        assert_eq!(
            client.layers(),
            &[Layer::Cache, Layer::RateLimiter, Layer::Interceptor]
        );
    }

    #[tokio::test]
    async fn test_no_layers() {
        let (mut options, fetches) = options(JWKS);
        options.cache(false);
        let client = JwksClient::new(options).unwrap();
        assert!(client.layers().is_empty());

        client.get_signing_key(Some("rsa1")).await.unwrap();
        client.get_signing_key(Some("rsa1")).await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_options_are_rejected() {
        assert!(matches!(
            JwksClient::new(ClientOptions::new("not a url")),
            Err(Error::ConfigurationInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_get_keys_and_signing_keys_bypass_cache() {
        let (options, fetches) = options(JWKS);
        let client = JwksClient::new(options).unwrap();

        assert_eq!(client.get_keys().await.unwrap().len(), 2);
        assert_eq!(client.get_signing_keys().await.unwrap().len(), 2);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clones_share_cache() {
        let (options, fetches) = options(JWKS);
        let client = JwksClient::new(options).unwrap();
        let clone = client.clone();

        client.get_signing_key(Some("rsa1")).await.unwrap();
        clone.get_signing_key(Some("rsa1")).await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_applies_to_cache_misses_only() {
        let (mut options, fetches) = options(JWKS);
        options
            .rate_limit(true)
            .jwks_requests_per_minute(1)
            .rate_limit_window(Duration::from_secs(60));
        let client = JwksClient::new(options).unwrap();

        for _ in 0..5 {
            client.get_signing_key(Some("rsa1")).await.unwrap();
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        client.get_signing_key(Some("missing")).await.unwrap_err();
        assert!(matches!(
            client.get_signing_key(Some("missing")).await,
            Err(Error::RateLimit(_))
        ));
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_callback_matches_future() {
        let (options, _) = options(JWKS);
        let client = JwksClient::new(options).unwrap();

        for kid in [Some("rsa1"), Some("missing"), None] {
            let (tx, rx) = tokio::sync::oneshot::channel();
            client
                .get_signing_key_with(kid, move |result| {
                    let _ = tx.send(result);
                })
                .await
                .unwrap();
            let from_callback = rx.await.unwrap();
            assert_eq!(from_callback, client.get_signing_key(kid).await);
        }
    }

    #[tokio::test]
    async fn test_list_callbacks() {
        let (options, _) = options(JWKS);
        let client = JwksClient::new(options).unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel();
        client
            .get_keys_with(move |result| {
                let _ = tx.send(result.map(|keys| keys.len()));
            })
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap(), Ok(2));

        let (tx, rx) = tokio::sync::oneshot::channel();
        client
            .get_signing_keys_with(move |result| {
                let _ = tx.send(result.map(|keys| keys.len()));
            })
            .await
            .unwrap();
        assert_eq!(rx.await.unwrap(), Ok(2));
    }

    #[tokio::test]
    async fn test_signing_key_for_token() {
        let (options, _) = options(JWKS);
        let client = JwksClient::new(options).unwrap();

        let key = client
            .get_signing_key_for_token(&token(r#"{"alg":"RS256","kid":"rsa1"}"#))
            .await
            .unwrap();
        assert_eq!(key.kid(), Some("rsa1"));

        let key = client
            .get_signing_key_for_token(&token(r#"{"alg":"ES256","kid":"ec1"}"#))
            .await
            .unwrap();
        assert_eq!(key.key_type(), "EC");
    }

    #[tokio::test]
    async fn test_signing_key_for_token_rejections() {
        let (options, fetches) = options(JWKS);
        let client = JwksClient::new(options).unwrap();

        for header in [
            r#"{"alg":"none","kid":"rsa1"}"#,
            r#"{"alg":"HS256","kid":"rsa1"}"#,
        ] {
            assert!(matches!(
                client.get_signing_key_for_token(&token(header)).await,
                Err(Error::AlgorithmUnsupported(_))
            ));
        }
        // Rejected before any fetch
        assert_eq!(fetches.load(Ordering::SeqCst), 0);

        // Key type mismatch
        assert!(matches!(
            client
                .get_signing_key_for_token(&token(r#"{"alg":"ES256","kid":"rsa1"}"#))
                .await,
            Err(Error::AlgorithmUnsupported(msg)) if msg.contains("RSA")
        ));
        // Published alg mismatch
        assert!(matches!(
            client
                .get_signing_key_for_token(&token(r#"{"alg":"PS256","kid":"rsa1"}"#))
                .await,
            Err(Error::AlgorithmUnsupported(_))
        ));
        assert!(matches!(
            client.get_signing_key_for_token("garbage").await,
            Err(Error::TokenHeaderInvalid(_))
        ));
    }
}
