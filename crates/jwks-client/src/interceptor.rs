//! Interception of key resolution
//!
//! An [`Interceptor`] sits directly in front of the resolver. It sees every
//! lookup that got past the cache and the rate limiter, and either calls
//! through to the resolver or answers on its own.

use crate::error::Result;
use crate::jwks::jwk::{Jwk, SigningKey};
use crate::jwks::{filter_signing_keys, select_signing_key};
use crate::lookup::Lookup;
use async_trait::async_trait;
use std::sync::Arc;

/// Hook replacing or wrapping the resolver
///
/// # Example
///
/// ```ignore
/// struct Fallback(StaticKeys);
///
/// #[async_trait]
/// impl Interceptor for Fallback {
///     async fn intercept(&self, kid: Option<&str>, next: &dyn Lookup) -> Result<SigningKey> {
///         match next.lookup(kid).await {
///             Err(err) if err.is_transport() => self.0.intercept(kid, next).await,
///             other => other,
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Resolve `kid`, optionally through `next`
    async fn intercept(&self, kid: Option<&str>, next: &dyn Lookup) -> Result<SigningKey>;
}

/// Lookup stage running an [`Interceptor`]
pub(crate) struct InterceptorLayer {
    interceptor: Arc<dyn Interceptor>,
    next: Arc<dyn Lookup>,
}

impl InterceptorLayer {
    pub(crate) fn new(interceptor: Arc<dyn Interceptor>, next: Arc<dyn Lookup>) -> Self {
        Self { interceptor, next }
    }
}

#[async_trait]
impl Lookup for InterceptorLayer {
    async fn lookup(&self, kid: Option<&str>) -> Result<SigningKey> {
        self.interceptor.intercept(kid, self.next.as_ref()).await
    }
}

/// Interceptor answering from a fixed key list, never reaching the endpoint
///
/// Keys are selected with the same rules as remote keys.
#[derive(Debug, Clone)]
pub struct StaticKeys {
    keys: Vec<SigningKey>,
}

impl StaticKeys {
    pub fn new(keys: Vec<SigningKey>) -> Self {
        Self { keys }
    }

    /// Build from raw JWKs, dropping keys unusable for signing
    pub fn from_jwks(jwks: &[Jwk]) -> Self {
        Self::new(filter_signing_keys(jwks))
    }

    pub fn keys(&self) -> &[SigningKey] {
        &self.keys
    }
}

#[async_trait]
impl Interceptor for StaticKeys {
    async fn intercept(&self, kid: Option<&str>, _next: &dyn Lookup) -> Result<SigningKey> {
        tracing::debug!(kid, "resolving from static keys");
        select_signing_key(&self.keys, kid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn jwk(kid: &str) -> Jwk {
        Jwk {
            kty: Some("RSA".into()),
            kid: Some(kid.into()),
            n: Some("wQ".into()),
            e: Some("AQAB".into()),
            ..Default::default()
        }
    }

    /// Stands in for the resolver, counting calls
    #[derive(Default)]
    struct Remote {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Lookup for Remote {
        async fn lookup(&self, kid: Option<&str>) -> Result<SigningKey> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            SigningKey::from_jwk(&jwk(kid.unwrap_or("remote")))
                .ok_or_else(|| Error::Jwks("unusable test key".into()))
        }
    }

    /// Answers "local" itself, delegates everything else
    struct LocalFirst;

    #[async_trait]
    impl Interceptor for LocalFirst {
        async fn intercept(&self, kid: Option<&str>, next: &dyn Lookup) -> Result<SigningKey> {
            match kid {
                Some("local") => SigningKey::from_jwk(&jwk("local"))
                    .ok_or_else(|| Error::Jwks("unusable test key".into())),
                _ => next.lookup(kid).await,
            }
        }
    }

    #[tokio::test]
    async fn test_interceptor_can_short_circuit_or_call_through() {
        let remote = Arc::new(Remote::default());
        let layer = InterceptorLayer::new(Arc::new(LocalFirst), remote.clone());

        assert_eq!(layer.lookup(Some("local")).await.unwrap().kid(), Some("local"));
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);

        assert_eq!(layer.lookup(Some("k1")).await.unwrap().kid(), Some("k1"));
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_static_keys_never_reach_remote() {
        let remote = Arc::new(Remote::default());
        let keys = StaticKeys::from_jwks(&[jwk("a"), jwk("b")]);
        let layer = InterceptorLayer::new(Arc::new(keys), remote.clone());

        assert_eq!(layer.lookup(Some("b")).await.unwrap().kid(), Some("b"));
        assert!(matches!(
            layer.lookup(Some("c")).await,
            Err(Error::SigningKeyNotFound(msg)) if msg.contains("'c'")
        ));
        assert!(matches!(
            layer.lookup(None).await,
            Err(Error::SigningKeyNotFound(msg)) if msg.contains("No KID specified")
        ));
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_static_keys_filter_unusable_keys() {
        let mut enc = jwk("enc");
        enc.key_use = Some("enc".into());
        let keys = StaticKeys::from_jwks(&[jwk("a"), enc]);
        assert_eq!(keys.keys().len(), 1);
    }
}
