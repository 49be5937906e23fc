//! Request rate limiting in front of the endpoint
//!
//! Fixed windows, one per kid (or one for the whole client). A window admits
//! up to `ceiling` lookups and is reset once `window` has elapsed since its
//! first admission. Windows are not sliding: a burst straddling a window
//! boundary can admit up to twice the ceiling.

use crate::error::{Error, Result};
use crate::jwks::jwk::SigningKey;
use crate::limits::MAX_TRACKED_RATE_WINDOWS;
use crate::lookup::Lookup;
use crate::options::RateLimitScope;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Admissions counted since `started`
#[derive(Debug)]
struct RateWindow {
    started: Instant,
    count: u32,
}

impl RateWindow {
    fn new(now: Instant) -> Self {
        Self {
            started: now,
            count: 1,
        }
    }

    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.started) >= window
    }

    /// Admit one more lookup, or report the time left in the window
    fn try_acquire(
        &mut self,
        now: Instant,
        window: Duration,
        ceiling: u32,
    ) -> std::result::Result<(), Duration> {
        if self.is_expired(now, window) {
            *self = Self::new(now);
            return Ok(());
        }
        if self.count >= ceiling {
            return Err(window.saturating_sub(now.duration_since(self.started)));
        }
        self.count += 1;
        Ok(())
    }
}

pub(crate) struct RateLimitLayer {
    windows: Mutex<HashMap<Option<String>, RateWindow>>,
    ceiling: u32,
    window: Duration,
    scope: RateLimitScope,
    next: Arc<dyn Lookup>,
}

impl std::fmt::Debug for RateLimitLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitLayer")
            .field("ceiling", &self.ceiling)
            .field("window", &self.window)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl RateLimitLayer {
    pub(crate) fn new(
        next: Arc<dyn Lookup>,
        ceiling: u32,
        window: Duration,
        scope: RateLimitScope,
    ) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            ceiling,
            window,
            scope,
            next,
        }
    }

    /// Count one lookup for `kid` against its window
    ///
    /// The decision is taken under the lock and never awaits.
    fn admit(&self, kid: Option<&str>) -> std::result::Result<(), Duration> {
        let key = match self.scope {
            RateLimitScope::PerKid => kid.map(str::to_string),
            RateLimitScope::Global => None,
        };
        let now = Instant::now();
        let mut windows = self.windows.lock();

        if let Some(window) = windows.get_mut(&key) {
            return window.try_acquire(now, self.window, self.ceiling);
        }

        if windows.len() >= MAX_TRACKED_RATE_WINDOWS {
            windows.retain(|_, w| !w.is_expired(now, self.window));
            if windows.len() >= MAX_TRACKED_RATE_WINDOWS {
                // Too many distinct kids in flight; refuse new ones until windows expire
                return Err(self.window);
            }
        }

        windows.insert(key, RateWindow::new(now));
        Ok(())
    }

    #[cfg(test)]
    fn tracked_windows(&self) -> usize {
        self.windows.lock().len()
    }
}

#[async_trait]
impl Lookup for RateLimitLayer {
    async fn lookup(&self, kid: Option<&str>) -> Result<SigningKey> {
        if let Err(retry_after) = self.admit(kid) {
            tracing::warn!(
                kid,
                ceiling = self.ceiling,
                retry_after_ms = retry_after.as_millis() as u64,
                "rate limit exceeded"
            );
            return Err(Error::RateLimit(
                "Too many requests to the JWKS endpoint".into(),
            ));
        }
        self.next.lookup(kid).await
    }
}
