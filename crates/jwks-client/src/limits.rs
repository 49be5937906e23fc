//! Size limit constants and client defaults

use std::time::Duration;

/// Maximum length for JWKS URIs (2048 characters)
pub(crate) const MAX_JWKS_URI_LENGTH: usize = 2048;

/// Maximum size for JWKS response (512KB)
pub(crate) const MAX_JWKS_RESPONSE_SIZE: usize = 512 * 1024;

/// Maximum number of keys in a JWK set (100 keys)
pub(crate) const MAX_JWK_SET_SIZE: usize = 100;

/// Maximum number of per-kid rate windows tracked at once
///
/// Forged kids create new windows; once the table is full, expired windows
/// are pruned before a new one is admitted.
pub(crate) const MAX_TRACKED_RATE_WINDOWS: usize = 10_000;

// ============================================================================
// JWK field size limits
// ============================================================================

/// Maximum size for Base64URL-encoded RSA modulus (n) field (12KB)
/// 8192-byte modulus (65536 bits) encodes to ~10.9KB Base64URL
pub(crate) const MAX_JWK_N_SIZE: usize = 12 * 1024;

/// Maximum size for Base64URL-encoded RSA exponent (e) field (64 bytes)
pub(crate) const MAX_JWK_E_SIZE: usize = 64;

/// Maximum size for Base64URL-encoded EC/OKP coordinates (x, y)
/// P-521 coordinates are 66 bytes, ~88 bytes Base64URL
pub(crate) const MAX_JWK_COORDINATE_SIZE: usize = 128;

/// Maximum size for a Base64-encoded x5c certificate (16KB)
pub(crate) const MAX_JWK_X5C_SIZE: usize = 16 * 1024;

/// Maximum size for JWK key ID (kid) field (256 bytes)
pub(crate) const MAX_JWK_KID_SIZE: usize = 256;

// ============================================================================
// Token header limits
// ============================================================================

/// Maximum length for a JWT token string (64KB)
pub(crate) const MAX_TOKEN_LENGTH: usize = 64 * 1024;

/// Maximum size for decoded JWT header JSON (8KB)
pub(crate) const MAX_DECODED_HEADER_SIZE: usize = 8 * 1024;

/// Maximum length for algorithm (alg) field in JWT header (16 bytes)
pub(crate) const MAX_ALG_LENGTH: usize = 16;

// ============================================================================
// Client defaults
// ============================================================================

/// Default capacity of the signing key cache
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 5;

/// Default ceiling of JWKS requests per rate window
pub const DEFAULT_JWKS_REQUESTS_PER_MINUTE: u32 = 10;

/// Default length of a rate window
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Default timeout of a single JWKS fetch
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
