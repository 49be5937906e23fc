//! Unverified JWT header, read only to select a verification key
use crate::error::{Error, Result};
use crate::limits::{MAX_ALG_LENGTH, MAX_DECODED_HEADER_SIZE, MAX_JWK_KID_SIZE, MAX_TOKEN_LENGTH};
use crate::utils::base64url;
use miniserde::Deserialize;

/// JWT header structure
///
/// Represents the JWT header containing algorithm and key ID.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenHeader {
    /// Algorithm used for signing
    #[serde(rename = "alg")]
    pub algorithm: String,

    /// Key ID (for JWKS key selection)
    #[serde(rename = "kid")]
    pub key_id: Option<String>,
}

/// Asymmetric signature algorithms a published key can verify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    RS256,
    RS384,
    RS512,
    PS256,
    PS384,
    PS512,
    ES256,
    ES384,
    ES512,
    EdDSA,
}

impl KeyAlgorithm {
    /// Parse the `alg` header value
    ///
    /// `none` and the HMAC family are rejected: neither is verified with a
    /// published key.
    pub fn from_alg(alg: &str) -> Result<Self> {
        if alg.len() > MAX_ALG_LENGTH {
            return Err(Error::AlgorithmUnsupported(format!(
                "Algorithm string too long: {} bytes (maximum: {} bytes)",
                alg.len(),
                MAX_ALG_LENGTH
            )));
        }

        match alg {
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "RS512" => Ok(Self::RS512),
            "PS256" => Ok(Self::PS256),
            "PS384" => Ok(Self::PS384),
            "PS512" => Ok(Self::PS512),
            "ES256" => Ok(Self::ES256),
            "ES384" => Ok(Self::ES384),
            "ES512" => Ok(Self::ES512),
            "EdDSA" => Ok(Self::EdDSA),
            _ => Err(Error::AlgorithmUnsupported(alg.into())),
        }
    }

    /// JWK key type able to verify this algorithm
    pub const fn key_type(&self) -> &'static str {
        match self {
            Self::RS256 | Self::RS384 | Self::RS512 | Self::PS256 | Self::PS384 | Self::PS512 => {
                "RSA"
            }
            Self::ES256 | Self::ES384 | Self::ES512 => "EC",
            Self::EdDSA => "OKP",
        }
    }
}

impl TokenHeader {
    /// Decode the header segment of a compact JWT
    ///
    /// The signature is neither decoded nor checked.
    pub(crate) fn from_token(token: &str) -> Result<Self> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(Error::TokenHeaderInvalid(format!(
                "Token too large: {} bytes (maximum: {} bytes)",
                token.len(),
                MAX_TOKEN_LENGTH
            )));
        }

        let mut parts = token.split('.');
        let header_b64 = parts.next().unwrap_or_default();
        if header_b64.is_empty() || parts.count() != 2 {
            return Err(Error::TokenHeaderInvalid(
                "Token must have three dot-separated segments".into(),
            ));
        }

        let header_json = base64url::decode_segment(header_b64, MAX_DECODED_HEADER_SIZE)?;
        let header: TokenHeader = miniserde::json::from_str(&header_json)
            .map_err(|_| Error::TokenHeaderInvalid("Failed to parse header json".into()))?;

        if header.key_id.as_ref().is_some_and(|kid| kid.len() > MAX_JWK_KID_SIZE) {
            return Err(Error::TokenHeaderInvalid(format!(
                "kid too long (maximum: {MAX_JWK_KID_SIZE} bytes)"
            )));
        }

        Ok(header)
    }

    pub(crate) fn algorithm(&self) -> Result<KeyAlgorithm> {
        KeyAlgorithm::from_alg(&self.algorithm)
    }
}
