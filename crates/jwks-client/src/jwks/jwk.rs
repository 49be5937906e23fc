//! JWK (JSON Web Key) struct, signing key filter and key material conversion

use crate::error::{Error, Result};
use crate::limits::{
    MAX_JWK_COORDINATE_SIZE, MAX_JWK_E_SIZE, MAX_JWK_KID_SIZE, MAX_JWK_N_SIZE, MAX_JWK_X5C_SIZE,
};
use crate::utils::base64url;
use crate::utils::der::{EcCurve, ec_spki_from_x_y, ed25519_spki_from_x, rsa_spki_from_n_e};
use base64::{Engine, engine::general_purpose::STANDARD};
use der::pem::LineEnding;
use der::{Decode, Document, EncodePem};
use miniserde::Deserialize;
use spki::SubjectPublicKeyInfoOwned;

/// JSON Web Key (JWK) structure as published by the endpoint
///
/// All fields are optional; the endpoint is not trusted to publish complete keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Jwk {
    /// Key type (e.g., "RSA", "EC", "OKP")
    pub kty: Option<String>,
    /// Key ID
    pub kid: Option<String>,
    /// Algorithm (advisory field per RFC 7517)
    pub alg: Option<String>,
    /// Key use (RFC 7517 Section 4.2)
    ///
    /// - "sig" for signature verification
    /// - "enc" for encryption
    ///
    /// If absent, the key may be used for any purpose.
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    // RSA fields
    /// RSA modulus (Base64URL-encoded)
    pub n: Option<String>,
    /// RSA exponent (Base64URL-encoded)
    pub e: Option<String>,
    // EC / OKP fields
    /// Curve name (e.g., "P-256", "Ed25519")
    pub crv: Option<String>,
    /// x-coordinate or OKP public key (Base64URL-encoded)
    pub x: Option<String>,
    /// y-coordinate (Base64URL-encoded)
    pub y: Option<String>,
    /// X.509 certificate chain (standard Base64 DER, leaf first)
    pub x5c: Option<Vec<String>>,
}

impl Jwk {
    /// Parse a single JWK from its JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        miniserde::json::from_str(json)
            .map_err(|_| Error::KeyMaterialInvalid("jwk: invalid jwk json".into()))
    }

    /// Whether the key may be used for signature verification at all
    fn is_signature_use(&self) -> bool {
        matches!(self.key_use.as_deref(), None | Some("sig"))
    }
}

/// A published key confirmed usable for signature verification
///
/// Created from a [`Jwk`] by the signing key filter, which already built the
/// DER verification material; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    kid: Option<String>,
    alg: Option<String>,
    kty: String,
    /// Leaf certificate for `x5c` keys, SubjectPublicKeyInfo otherwise
    der: Vec<u8>,
    certificate: bool,
}

impl SigningKey {
    /// Apply the signing key filter to a single JWK
    ///
    /// Returns `None` when the key is meant for encryption, has an unknown key
    /// type, or its material does not decode into a public key.
    pub fn from_jwk(jwk: &Jwk) -> Option<Self> {
        if !jwk.is_signature_use() {
            return None;
        }
        if jwk.kid.as_ref().is_some_and(|kid| kid.len() > MAX_JWK_KID_SIZE) {
            return None;
        }

        let kty = jwk.kty.as_deref()?;
        let (der, certificate) = match jwk.x5c.as_ref().and_then(|chain| chain.first()) {
            Some(leaf) => (decode_certificate(leaf), true),
            None => (encode_public_key(kty, jwk), false),
        };

        match der {
            Ok(der) => Some(Self {
                kid: jwk.kid.clone(),
                alg: jwk.alg.clone(),
                kty: kty.to_string(),
                der,
                certificate,
            }),
            Err(err) => {
                tracing::debug!(
                    kid = jwk.kid.as_deref(),
                    kty,
                    error = %err,
                    "skipping unusable key"
                );
                None
            }
        }
    }

    /// Key ID, if the endpoint published one
    pub fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    /// Advisory algorithm, if the endpoint published one
    pub fn alg(&self) -> Option<&str> {
        self.alg.as_deref()
    }

    /// JWK key type ("RSA", "EC" or "OKP")
    pub fn key_type(&self) -> &str {
        &self.kty
    }

    /// Whether the key was published as an X.509 certificate chain
    pub fn is_certificate(&self) -> bool {
        self.certificate
    }

    /// DER-encoded verification material
    ///
    /// For `x5c` keys this is the leaf certificate, otherwise a
    /// SubjectPublicKeyInfo built from the JWK parameters.
    pub fn public_key_der(&self) -> &[u8] {
        &self.der
    }

    /// PEM-encoded verification material
    ///
    /// `CERTIFICATE` for `x5c` keys, `PUBLIC KEY` (SPKI) otherwise.
    pub fn public_key(&self) -> Result<String> {
        if self.certificate {
            return der::pem::encode_string("CERTIFICATE", LineEnding::LF, &self.der)
                .map_err(|e| pem_error(&e));
        }
        SubjectPublicKeyInfoOwned::from_der(&self.der)
            .and_then(|spki| spki.to_pem(LineEnding::LF))
            .map_err(|e| pem_error(&e))
    }
}

fn pem_error(details: &dyn std::fmt::Display) -> Error {
    Error::KeyMaterialInvalid(format!("jwk: failed to encode pem: {details}"))
}

/// Decode the leaf of an `x5c` chain (standard Base64 DER)
fn decode_certificate(leaf: &str) -> Result<Vec<u8>> {
    if leaf.is_empty() {
        return Err(Error::KeyMaterialInvalid("jwk: empty x5c certificate".into()));
    }
    if leaf.len() > MAX_JWK_X5C_SIZE {
        return Err(Error::JwkFieldTooLarge {
            field: "x5c".into(),
            size: leaf.len(),
            max: MAX_JWK_X5C_SIZE,
        });
    }
    let der = STANDARD
        .decode(leaf)
        .map_err(|e| Error::KeyMaterialInvalid(format!("jwk: failed to decode x5c: {e}")))?;
    // Must be one complete DER SEQUENCE
    Document::from_der(&der)
        .map_err(|e| Error::KeyMaterialInvalid(format!("jwk: x5c is not a certificate: {e}")))?;
    Ok(der)
}

/// Build the SubjectPublicKeyInfo from the JWK parameters
fn encode_public_key(kty: &str, jwk: &Jwk) -> Result<Vec<u8>> {
    match kty {
        "RSA" => {
            let n = decode_field("n", jwk.n.as_deref(), MAX_JWK_N_SIZE)?;
            let e = decode_field("e", jwk.e.as_deref(), MAX_JWK_E_SIZE)?;
            rsa_spki_from_n_e(&n, &e)
        }
        "EC" => {
            let crv = jwk.crv.as_deref().unwrap_or_default();
            let curve = EcCurve::from_jwk(crv).ok_or_else(|| {
                Error::KeyMaterialInvalid(format!("jwk: unsupported curve '{crv}'"))
            })?;
            let x = decode_field("x", jwk.x.as_deref(), MAX_JWK_COORDINATE_SIZE)?;
            let y = decode_field("y", jwk.y.as_deref(), MAX_JWK_COORDINATE_SIZE)?;
            ec_spki_from_x_y(&x, &y, curve)
        }
        "OKP" if jwk.crv.as_deref() == Some("Ed25519") => {
            let x = decode_field("x", jwk.x.as_deref(), MAX_JWK_COORDINATE_SIZE)?;
            ed25519_spki_from_x(&x)
        }
        _ => Err(Error::KeyMaterialInvalid(format!("jwk: unsupported key type '{kty}'"))),
    }
}

fn decode_field(field: &str, value: Option<&str>, max_encoded: usize) -> Result<Vec<u8>> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::KeyMaterialInvalid(format!("jwk: missing {field}")))?;
    if value.len() > max_encoded {
        return Err(Error::JwkFieldTooLarge {
            field: field.into(),
            size: value.len(),
            max: max_encoded,
        });
    }
    // Base64URL: 4 chars → 3 bytes
    base64url::decode_bytes(value, (max_encoded * 3) / 4)
        .map_err(|e| Error::KeyMaterialInvalid(format!("jwk: failed to decode {field}: {e}")))
}
