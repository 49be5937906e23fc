//! JSON Web Key Set (JWKS) document, signing key filter and key selection
pub(crate) mod jwk;

use crate::error::{Error, Result};
use crate::limits::{MAX_JWK_SET_SIZE, MAX_JWKS_RESPONSE_SIZE};
use jwk::{Jwk, SigningKey};
use miniserde::Deserialize;

/// JSON Web Key Set (JWKS)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JwkSet {
    /// The keys in the set
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Parse a JWKS response body
    ///
    /// Oversized or malformed bodies are transport failures, not endpoint
    /// answers.
    pub(crate) fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_JWKS_RESPONSE_SIZE {
            return Err(Error::ResponseTooLarge {
                size: bytes.len(),
                max: MAX_JWKS_RESPONSE_SIZE,
            });
        }

        let body = std::str::from_utf8(bytes)
            .map_err(|e| Error::Transport(format!("jwks: utf8 decode failed: {e}")))?;

        let set: JwkSet = miniserde::json::from_str(body)
            .map_err(|_| Error::Transport("jwks: invalid jwks json".to_string()))?;

        if set.keys.len() > MAX_JWK_SET_SIZE {
            return Err(Error::JwkSetTooLarge {
                key_count: set.keys.len(),
                max: MAX_JWK_SET_SIZE,
            });
        }

        Ok(set)
    }
}

/// Keep the keys usable for signature verification, in published order
pub(crate) fn filter_signing_keys(keys: &[Jwk]) -> Vec<SigningKey> {
    keys.iter().filter_map(SigningKey::from_jwk).collect()
}

/// Select a signing key by key ID (kid)
///
/// Without a kid the set must contain exactly one key; guessing among several
/// would let a token pick an arbitrary verification key.
pub(crate) fn select_signing_key(keys: &[SigningKey], kid: Option<&str>) -> Result<SigningKey> {
    match kid {
        Some(kid) => keys
            .iter()
            .find(|key| key.kid() == Some(kid))
            .cloned()
            .ok_or_else(|| {
                Error::SigningKeyNotFound(format!(
                    "Unable to find a signing key that matches '{kid}'"
                ))
            }),
        None if keys.len() > 1 => Err(Error::SigningKeyNotFound(
            "No KID specified and JWKS endpoint returned more than 1 key".into(),
        )),
        None => keys.first().cloned().ok_or_else(|| {
            Error::SigningKeyNotFound("Unable to find a signing key without a KID".into())
        }),
    }
}
