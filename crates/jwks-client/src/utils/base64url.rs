//! Base64URL decoding per RFC 4648
//!
//! This module provides a thin wrapper around the `base64` crate with
//! size limit validation for security.

use crate::error::{Error, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Decode Base64URL string to bytes with maximum size limit
///
/// The error carries the `base64` crate's message; callers wrap it with the
/// context of the field being decoded.
pub(crate) fn decode_bytes(input: &str, max_size: usize) -> std::result::Result<Vec<u8>, String> {
    // Tolerate padded input, some issuers publish it
    let result = URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .map_err(|e| format!("Base64URL decode failed: {e}"))?;

    if result.len() > max_size {
        return Err(format!(
            "Decoded size exceeds limit: {} bytes (max: {})",
            result.len(),
            max_size
        ));
    }

    Ok(result)
}

/// Decode a Base64URL JWT segment to a UTF-8 string with size limit
pub(crate) fn decode_segment(input: &str, max_size: usize) -> Result<String> {
    let bytes = decode_bytes(input, max_size).map_err(Error::TokenHeaderInvalid)?;
    String::from_utf8(bytes)
        .map_err(|e| Error::TokenHeaderInvalid(format!("Invalid UTF-8: {e}")))
}
