//! Signing key cache
//!
//! Bounded LRU cache keyed by kid, with optional expiry. Concurrent misses
//! for the same kid are coalesced: the first caller runs the wrapped lookup,
//! later callers wait for its outcome. Failed lookups are never cached.

use crate::error::Result;
use crate::jwks::jwk::SigningKey;
use crate::lookup::Lookup;
use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::sync::Arc;
use std::time::Duration;

/// Cache key: the requested kid, `None` for the implicit single key
type CacheKey = Option<String>;

pub(crate) struct CacheLayer {
    cache: Cache<CacheKey, SigningKey>,
    next: Arc<dyn Lookup>,
}

impl CacheLayer {
    pub(crate) fn new(next: Arc<dyn Lookup>, max_entries: u64, max_age: Option<Duration>) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(max_entries)
            .eviction_policy(EvictionPolicy::lru());
        if let Some(max_age) = max_age {
            builder = builder.time_to_live(max_age);
        }

        Self {
            cache: builder.build(),
            next,
        }
    }

    /// Number of cached keys, after pending maintenance has run
    #[cfg(test)]
    async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

#[async_trait]
impl Lookup for CacheLayer {
    async fn lookup(&self, kid: Option<&str>) -> Result<SigningKey> {
        let key: CacheKey = kid.map(str::to_string);

        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(kid, "cache hit");
            return Ok(cached);
        }

        // Only the caller that wins the init race reaches the wrapped lookup
        self.cache
            .try_get_with(key, async {
                tracing::debug!(kid, "cache miss, resolving");
                self.next.lookup(kid).await
            })
            .await
            .map_err(|err| (*err).clone())
    }
}
