//! Client configuration
//!
//! [`ClientOptions`] carries every recognized option with its default. The
//! plain-data subset can also be loaded from a JSON document using the
//! conventional camelCase option names (see [`ClientOptions::from_json`]).

use crate::error::{Error, Result};
use crate::interceptor::Interceptor;
use crate::limits::{
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_JWKS_REQUESTS_PER_MINUTE, DEFAULT_RATE_LIMIT_WINDOW,
    DEFAULT_TIMEOUT,
};
use crate::source::Fetcher;
use crate::url::validate_jwks_uri;
use miniserde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// How rate windows are keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimitScope {
    /// One window per requested kid
    #[default]
    PerKid,
    /// One window shared by all lookups of the client
    Global,
}

/// Options for [`JwksClient`](crate::JwksClient)
#[derive(Clone)]
pub struct ClientOptions {
    /// The endpoint to query (required)
    pub jwks_uri: String,
    /// Enable the signing key cache
    pub cache: bool,
    /// Cache capacity, least recently used entries are evicted first
    pub cache_max_entries: u64,
    /// Maximum age of a cached key; `None` keeps entries until evicted
    pub cache_max_age: Option<Duration>,
    /// Enable the request rate limiter
    pub rate_limit: bool,
    /// Ceiling of endpoint requests per rate window
    pub jwks_requests_per_minute: u32,
    /// Length of a rate window
    pub rate_limit_window: Duration,
    pub rate_limit_scope: RateLimitScope,
    /// Timeout of a single fetch
    pub timeout: Duration,
    /// Extra headers sent with every request
    pub request_headers: BTreeMap<String, String>,
    /// Custom HTTP client, e.g. with a proxy or custom TLS roots
    pub request_agent: Option<reqwest::Client>,
    /// Custom fetch function replacing the HTTP client entirely
    pub fetcher: Option<Fetcher>,
    /// Hook placed in front of the resolver
    pub get_keys_interceptor: Option<Arc<dyn Interceptor>>,
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("jwks_uri", &self.jwks_uri)
            .field("cache", &self.cache)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("cache_max_age", &self.cache_max_age)
            .field("rate_limit", &self.rate_limit)
            .field("jwks_requests_per_minute", &self.jwks_requests_per_minute)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("rate_limit_scope", &self.rate_limit_scope)
            .field("timeout", &self.timeout)
            .field("request_headers", &self.request_headers.keys())
            .field("has_request_agent", &self.request_agent.is_some())
            .field("has_fetcher", &self.fetcher.is_some())
            .field("has_interceptor", &self.get_keys_interceptor.is_some())
            .finish()
    }
}

/// Plain-data options as found in configuration files
#[derive(Deserialize)]
struct OptionsDocument {
    #[serde(rename = "jwksUri")]
    jwks_uri: String,
    cache: Option<bool>,
    #[serde(rename = "cacheMaxEntries")]
    cache_max_entries: Option<u64>,
    /// Milliseconds
    #[serde(rename = "cacheMaxAge")]
    cache_max_age: Option<u64>,
    #[serde(rename = "rateLimit")]
    rate_limit: Option<bool>,
    #[serde(rename = "jwksRequestsPerMinute")]
    jwks_requests_per_minute: Option<u32>,
    /// Milliseconds
    timeout: Option<u64>,
    #[serde(rename = "requestHeaders")]
    request_headers: Option<BTreeMap<String, String>>,
}

impl ClientOptions {
    /// Create options for the given endpoint with defaults for everything else
    pub fn new(jwks_uri: impl Into<String>) -> Self {
        Self {
            jwks_uri: jwks_uri.into(),
            cache: true,
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cache_max_age: None,
            rate_limit: false,
            jwks_requests_per_minute: DEFAULT_JWKS_REQUESTS_PER_MINUTE,
            rate_limit_window: DEFAULT_RATE_LIMIT_WINDOW,
            rate_limit_scope: RateLimitScope::PerKid,
            timeout: DEFAULT_TIMEOUT,
            request_headers: BTreeMap::new(),
            request_agent: None,
            fetcher: None,
            get_keys_interceptor: None,
        }
    }

    /// Load options from a JSON document
    ///
    /// Recognized keys: `jwksUri` (required), `cache`, `cacheMaxEntries`,
    /// `cacheMaxAge` (ms), `rateLimit`, `jwksRequestsPerMinute`, `timeout` (ms),
    /// `requestHeaders`. Unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: OptionsDocument = miniserde::json::from_str(json).map_err(|_| {
            Error::ConfigurationInvalid("options: invalid json or missing jwksUri".into())
        })?;

        let mut options = Self::new(doc.jwks_uri);
        if let Some(cache) = doc.cache {
            options.cache = cache;
        }
        if let Some(max_entries) = doc.cache_max_entries {
            options.cache_max_entries = max_entries;
        }
        options.cache_max_age = doc.cache_max_age.map(Duration::from_millis);
        if let Some(rate_limit) = doc.rate_limit {
            options.rate_limit = rate_limit;
        }
        if let Some(per_minute) = doc.jwks_requests_per_minute {
            options.jwks_requests_per_minute = per_minute;
        }
        if let Some(timeout) = doc.timeout {
            options.timeout = Duration::from_millis(timeout);
        }
        if let Some(headers) = doc.request_headers {
            options.request_headers = headers;
        }
        Ok(options)
    }

    /// Enable or disable the signing key cache
    pub fn cache(&mut self, enabled: bool) -> &mut Self {
        self.cache = enabled;
        self
    }

    /// Configure the cache capacity
    pub fn cache_max_entries(&mut self, max_entries: u64) -> &mut Self {
        self.cache_max_entries = max_entries;
        self
    }

    /// Expire cached keys after the given age
    pub fn cache_max_age(&mut self, max_age: Duration) -> &mut Self {
        self.cache_max_age = Some(max_age);
        self
    }

    /// Enable or disable the rate limiter
    pub fn rate_limit(&mut self, enabled: bool) -> &mut Self {
        self.rate_limit = enabled;
        self
    }

    /// Configure the request ceiling per rate window
    pub fn jwks_requests_per_minute(&mut self, ceiling: u32) -> &mut Self {
        self.jwks_requests_per_minute = ceiling;
        self
    }

    /// Configure the rate window length
    pub fn rate_limit_window(&mut self, window: Duration) -> &mut Self {
        self.rate_limit_window = window;
        self
    }

    /// Configure how rate windows are keyed
    pub fn rate_limit_scope(&mut self, scope: RateLimitScope) -> &mut Self {
        self.rate_limit_scope = scope;
        self
    }

    /// Configure the fetch timeout
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Add a header sent with every request
    pub fn request_header(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    /// Use a preconfigured HTTP client
    pub fn request_agent(&mut self, client: reqwest::Client) -> &mut Self {
        self.request_agent = Some(client);
        self
    }

    /// Replace the HTTP fetch with a custom function
    pub fn fetcher(&mut self, fetcher: Fetcher) -> &mut Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Install an interceptor in front of the resolver
    pub fn get_keys_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) -> &mut Self {
        self.get_keys_interceptor = Some(interceptor);
        self
    }

    /// Finish configuration
    pub fn build(&mut self) -> Self {
        self.clone()
    }

    /// Check the options for values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        validate_jwks_uri(&self.jwks_uri)?;

        if self.cache && self.cache_max_entries == 0 {
            return Err(Error::ConfigurationInvalid(
                "cache_max_entries must be at least 1".into(),
            ));
        }
        if self.cache_max_age.is_some_and(|age| age.is_zero()) {
            return Err(Error::ConfigurationInvalid(
                "cache_max_age must be greater than zero".into(),
            ));
        }
        if self.rate_limit && self.jwks_requests_per_minute == 0 {
            return Err(Error::ConfigurationInvalid(
                "jwks_requests_per_minute must be at least 1".into(),
            ));
        }
        if self.rate_limit && self.rate_limit_window.is_zero() {
            return Err(Error::ConfigurationInvalid(
                "rate_limit_window must be greater than zero".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(Error::ConfigurationInvalid(
                "timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
