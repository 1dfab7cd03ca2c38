//! Text and binary conversions used on the wire
//!
//! Keys, IVs and MACs travel as lowercase hex. Passwords, salts, signed
//! messages and plaintext travel as "byte text": strings where every
//! character stands for exactly one byte (U+0000..=U+00FF).

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{EnvelopeError, EnvelopeResult};

/// Parse a hex string into bytes
///
/// Accepts upper or lower case digits. Fails on any non-hex character or an
/// odd number of digits.
pub fn hex_to_bytes(s: &str) -> EnvelopeResult<Vec<u8>> {
    hex::decode(s).map_err(|e| EnvelopeError::Format(format!("Invalid hex: {}", e)))
}

/// Encode bytes as lowercase, zero-padded hex
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Map each character to one byte
///
/// Characters above U+00FF keep only their low eight bits. Callers that
/// cannot guarantee byte text should check [`is_byte_text`] first.
pub fn chars_to_bytes(s: &str) -> Vec<u8> {
    s.chars().map(|c| (c as u32 & 0xff) as u8).collect()
}

/// Map each byte to the character with the same code point
pub fn bytes_to_chars(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// True when every character of `s` fits in one byte
pub fn is_byte_text(s: &str) -> bool {
    s.chars().all(|c| (c as u32) <= 0xff)
}

/// Standard (padded) base64 encoding
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Standard (padded) base64 decoding
pub fn decode_base64(s: &str) -> EnvelopeResult<Vec<u8>> {
    STANDARD
        .decode(s)
        .map_err(|e| EnvelopeError::Format(format!("Invalid base64: {}", e)))
}
