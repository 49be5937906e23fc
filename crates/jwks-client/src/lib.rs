//! Signing key resolution for JWT verifiers, backed by a JWKS endpoint.
//!
//! Keys are looked up by key ID through a chain of optional stages: an LRU
//! cache with request coalescing, a fixed-window rate limiter and a custom
//! interceptor. See [`lookup`] for the chain and [`JwksClient`] for the entry
//! points.

mod error;
mod jwks;

// Internal modules
pub(crate) mod cache;
pub(crate) mod client;
pub(crate) mod header;
pub(crate) mod interceptor;
pub(crate) mod options;
pub(crate) mod rate_limit;
pub(crate) mod resolver;
pub(crate) mod source;
pub(crate) mod url;
pub(crate) mod utils;

pub mod lookup;

// Public Interface
pub use client::JwksClient;
pub use error::{Error, Result};
pub use header::KeyAlgorithm;
pub use interceptor::{Interceptor, StaticKeys};
pub use jwks::jwk::{Jwk, SigningKey};
pub use lookup::{LAYER_ORDER, Layer, Lookup};
pub use options::{ClientOptions, RateLimitScope};
pub use source::{FetchFuture, Fetcher};

pub use limits::{
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_JWKS_REQUESTS_PER_MINUTE, DEFAULT_RATE_LIMIT_WINDOW,
    DEFAULT_TIMEOUT,
};

pub(crate) mod limits;
