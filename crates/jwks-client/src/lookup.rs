//! Signing key lookup middleware
//!
//! Every stage of key resolution implements [`Lookup`]. The client composes
//! the enabled stages once, at construction, into a single chain:
//!
//! ```text
//! Cache            hits answer immediately, misses coalesce per kid
//!   │
//! RateLimiter      only cache misses consume rate budget
//!   │
//! Interceptor      may call through or answer on its own
//!   │
//! Resolver         fetch, filter, select
//! ```
//!
//! Disabled stages are left out of the chain entirely.

use crate::error::Result;
use crate::jwks::jwk::SigningKey;
use async_trait::async_trait;
use std::sync::Arc;

/// Resolve a signing key by key ID
///
/// `kid = None` asks for the only key of a single-key set.
#[async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup(&self, kid: Option<&str>) -> Result<SigningKey>;
}

/// A decorator stage of the lookup chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Cache,
    RateLimiter,
    Interceptor,
}

/// Decorator stages, outermost first
pub const LAYER_ORDER: [Layer; 3] = [Layer::Cache, Layer::RateLimiter, Layer::Interceptor];

/// Compose the enabled stages around the innermost lookup
///
/// `wrap` is asked for each layer in [`LAYER_ORDER`], innermost first, and
/// returns the decorated lookup or `None` when the layer is disabled.
pub(crate) fn compose<F>(innermost: Arc<dyn Lookup>, mut wrap: F) -> (Arc<dyn Lookup>, Vec<Layer>)
where
    F: FnMut(Layer, Arc<dyn Lookup>) -> Option<Arc<dyn Lookup>>,
{
    let mut head = innermost;
    let mut active = Vec::new();
    for layer in LAYER_ORDER.iter().rev() {
        if let Some(decorated) = wrap(*layer, head.clone()) {
            head = decorated;
            active.push(*layer);
        }
    }
    active.reverse();
    (head, active)
}
