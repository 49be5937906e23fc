//! DER encoding utilities for converting JWK material to SubjectPublicKeyInfo
//!
//! This module uses the RustCrypto `spki` and `der` crates for standards-compliant
//! DER encoding.

use crate::error::{Error, Result};
use der::asn1::{Any, AnyRef, BitString, UintRef};
use der::{Encode, Sequence};
use spki::{AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned};

const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const ED25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

/// Upper bound on the RSA modulus, 65536 bits
const MAX_RSA_MODULUS_SIZE: usize = 8192;

/// Ed25519 public keys are always 32 bytes
const ED25519_KEY_SIZE: usize = 32;

fn encoding_error(operation: &str, details: impl std::fmt::Display) -> Error {
    Error::KeyMaterialInvalid(format!("{operation}: {details}"))
}

/// Named curves accepted for EC signing keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    /// Parse the JWK `crv` parameter
    pub(crate) fn from_jwk(crv: &str) -> Option<Self> {
        match crv {
            "P-256" => Some(EcCurve::P256),
            "P-384" => Some(EcCurve::P384),
            "P-521" => Some(EcCurve::P521),
            _ => None,
        }
    }

    fn oid(self) -> ObjectIdentifier {
        match self {
            EcCurve::P256 => ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7"),
            EcCurve::P384 => ObjectIdentifier::new_unwrap("1.3.132.0.34"),
            EcCurve::P521 => ObjectIdentifier::new_unwrap("1.3.132.0.35"),
        }
    }

    /// Coordinate length in bytes
    fn coordinate_size(self) -> usize {
        match self {
            EcCurve::P256 => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }
}

/// RSA public key structure for DER encoding
///
/// Represents RSAPublicKey as defined in RFC 3447:
/// RSAPublicKey ::= SEQUENCE {
///     modulus           INTEGER,  -- n
///     publicExponent    INTEGER   -- e
/// }
#[derive(Sequence)]
struct RsaPublicKey<'a> {
    modulus: UintRef<'a>,
    public_exponent: UintRef<'a>,
}

fn encode_spki(algorithm: AlgorithmIdentifierOwned, key_bits: Vec<u8>) -> Result<Vec<u8>> {
    let subject_public_key =
        BitString::new(0, key_bits).map_err(|e| encoding_error("failed to create bit string", e))?;

    let spki = SubjectPublicKeyInfoOwned {
        algorithm,
        subject_public_key,
    };

    spki.to_der().map_err(|e| encoding_error("failed to encode SPKI", e))
}

/// Build DER-encoded RSA public key from modulus (n) and exponent (e) bytes
pub(crate) fn rsa_spki_from_n_e(n: &[u8], e: &[u8]) -> Result<Vec<u8>> {
    if n.is_empty() || e.is_empty() {
        return Err(encoding_error("rsa key", "missing n or e"));
    }

    if n.len() > MAX_RSA_MODULUS_SIZE {
        return Err(encoding_error(
            "RSA modulus too large",
            format!("{} bytes (maximum: {} bytes)", n.len(), MAX_RSA_MODULUS_SIZE),
        ));
    }

    // UintRef handles INTEGER encoding including leading zero for positive values
    let rsa_pubkey = RsaPublicKey {
        modulus: UintRef::new(n).map_err(|e| encoding_error("failed to encode RSA modulus", e))?,
        public_exponent: UintRef::new(e)
            .map_err(|e| encoding_error("failed to encode RSA exponent", e))?,
    };

    let rsa_pubkey_der = rsa_pubkey
        .to_der()
        .map_err(|e| encoding_error("failed to encode RSA public key", e))?;

    let algorithm = AlgorithmIdentifierOwned {
        oid: RSA_ENCRYPTION_OID,
        parameters: Some(AnyRef::NULL.into()),
    };

    encode_spki(algorithm, rsa_pubkey_der)
}

/// Build DER-encoded EC public key from affine coordinates
///
/// The key is stored as an uncompressed SEC1 point (`0x04 || x || y`).
pub(crate) fn ec_spki_from_x_y(x: &[u8], y: &[u8], curve: EcCurve) -> Result<Vec<u8>> {
    let size = curve.coordinate_size();
    if x.len() != size || y.len() != size {
        return Err(encoding_error(
            "EC coordinate length mismatch",
            format!("expected {size} bytes, found x={} y={}", x.len(), y.len()),
        ));
    }

    let mut point = Vec::with_capacity(1 + 2 * size);
    point.push(0x04);
    point.extend_from_slice(x);
    point.extend_from_slice(y);

    let curve_oid = Any::encode_from(&curve.oid())
        .map_err(|e| encoding_error("failed to encode curve identifier", e))?;

    let algorithm = AlgorithmIdentifierOwned {
        oid: EC_PUBLIC_KEY_OID,
        parameters: Some(curve_oid),
    };

    encode_spki(algorithm, point)
}

/// Build DER-encoded Ed25519 public key (RFC 8410, no parameters)
pub(crate) fn ed25519_spki_from_x(x: &[u8]) -> Result<Vec<u8>> {
    if x.len() != ED25519_KEY_SIZE {
        return Err(encoding_error(
            "Ed25519 key length mismatch",
            format!("expected {ED25519_KEY_SIZE} bytes, found {}", x.len()),
        ));
    }

    let algorithm = AlgorithmIdentifierOwned {
        oid: ED25519_OID,
        parameters: None,
    };

    encode_spki(algorithm, x.to_vec())
}
