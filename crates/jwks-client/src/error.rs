//! Errors for jwks-client

use thiserror::Error;

/// JWKS client errors
///
/// Every failure of a key lookup is reported as exactly one of these values.
/// Errors are `Clone` so that all callers waiting on the same in-flight fetch
/// receive an equal value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============================================================================
    // Endpoint Errors
    // ============================================================================
    /// The endpoint answered, but the answer is unusable (no keys, no signing
    /// keys) or it reported a failure of its own.
    #[error("{0}")]
    Jwks(String),

    #[error("{0}")]
    SigningKeyNotFound(String),

    /// The request ceiling was reached; no network call was made.
    #[error("{0}")]
    RateLimit(String),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    /// Network failure, timeout or malformed response body
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote URL too long: {length} characters (maximum: {max} characters)")]
    UrlTooLong { length: usize, max: usize },

    #[error("Remote response too large: {size} bytes (maximum: {max} bytes)")]
    ResponseTooLarge { size: usize, max: usize },

    #[error("Remote JWK set too large: {key_count} keys (maximum: {max} keys)")]
    JwkSetTooLarge { key_count: usize, max: usize },

    // ============================================================================
    // Key Material Errors
    // ============================================================================
    #[error("Invalid key material: {0}")]
    KeyMaterialInvalid(String),

    #[error("JWK field '{field}' too large: {size} bytes (maximum: {max} bytes)")]
    JwkFieldTooLarge {
        field: String,
        size: usize,
        max: usize,
    },

    // ============================================================================
    // Token Header Errors
    // ============================================================================
    #[error("Invalid token header: {0}")]
    TokenHeaderInvalid(String),

    #[error("Algorithm '{0}' is not supported for key resolution")]
    AlgorithmUnsupported(String),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),
}

impl Error {
    /// Whether the error was produced by the transport rather than by the
    /// endpoint's content
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::ResponseTooLarge { .. } | Error::JwkSetTooLarge { .. }
        )
    }
}

/// Result type alias for jwks-client operations
pub type Result<T> = std::result::Result<T, Error>;
