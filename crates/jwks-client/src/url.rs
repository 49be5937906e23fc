//! URL validation utilities
//!
//! Rejects malformed or oversized JWKS URIs before any request is made.

use crate::error::{Error, Result};
use crate::limits::MAX_JWKS_URI_LENGTH;

/// Validate JWKS URI format and size
pub(crate) fn validate_jwks_uri(uri: &str) -> Result<url::Url> {
    if uri.trim().is_empty() {
        return Err(Error::ConfigurationInvalid(
            "JWKS URI cannot be empty".into(),
        ));
    }

    if uri.len() > MAX_JWKS_URI_LENGTH {
        return Err(Error::UrlTooLong {
            length: uri.len(),
            max: MAX_JWKS_URI_LENGTH,
        });
    }

    let parsed = uri
        .parse::<url::Url>()
        .map_err(|e| Error::ConfigurationInvalid(format!("invalid JWKS URI: {e}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::ConfigurationInvalid(
            "JWKS URI must use http or https scheme".into(),
        ));
    }

    if parsed.host_str().is_none() {
        return Err(Error::ConfigurationInvalid(
            "JWKS URI must have a valid host".into(),
        ));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_jwks_uri_valid() {
        assert!(validate_jwks_uri("https://auth.example.com/.well-known/jwks.json").is_ok());
        assert!(validate_jwks_uri("http://localhost:3000/jwks.json").is_ok());
    }

    #[test]
    fn test_validate_jwks_uri_empty() {
        assert!(matches!(
            validate_jwks_uri(""),
            Err(Error::ConfigurationInvalid(msg)) if msg.contains("cannot be empty")
        ));
        assert!(validate_jwks_uri("   ").is_err());
    }

    #[test]
    fn test_validate_jwks_uri_invalid_scheme() {
        assert!(validate_jwks_uri("ftp://example.com/jwks.json").is_err());
        assert!(validate_jwks_uri("file:///etc/jwks.json").is_err());
    }

    #[test]
    fn test_validate_jwks_uri_not_a_url() {
        assert!(matches!(
            validate_jwks_uri("not a url"),
            Err(Error::ConfigurationInvalid(msg)) if msg.contains("invalid JWKS URI")
        ));
    }

    #[test]
    fn test_validate_jwks_uri_too_long() {
        let long_uri = "https://example.com/".to_string() + &"a".repeat(MAX_JWKS_URI_LENGTH);
        assert!(matches!(
            validate_jwks_uri(&long_uri),
            Err(Error::UrlTooLong { max, .. }) if max == MAX_JWKS_URI_LENGTH
        ));
    }
}
