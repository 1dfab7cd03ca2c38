//! Authenticated encryption of a single envelope
//!
//! Suite "002": AES-CBC with PKCS#7 padding, then HMAC-SHA-256 over
//! `version:uuid:iv:ciphertext`. The MAC covers the ciphertext, and it is
//! always checked before any decryption is attempted.
//!
//! Wire form: `version:authHashHex:uuid:ivHex:base64Ciphertext`

use std::fmt;
use std::str::FromStr;

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

use super::codec::{
    bytes_to_chars, bytes_to_hex, chars_to_bytes, decode_base64, encode_base64, hex_to_bytes,
    is_byte_text,
};
use super::entropy::{random_array, EntropySource};
use super::keys::KeyPair;
use crate::error::{EnvelopeError, EnvelopeResult};

type HmacSha256 = Hmac<Sha256>;

/// Size of the CBC initialization vector in bytes (128 bits)
pub const IV_SIZE: usize = 16;

/// Number of colon-separated fields in an envelope
pub const ENVELOPE_FIELDS: usize = 5;

const SEPARATOR: char = ':';

/// Algorithm suite named by an envelope's version tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// AES-CBC + HMAC-SHA-256
    V002,
}

impl Version {
    /// Suite used for all new envelopes
    pub const CURRENT: Version = Version::V002;

    /// The three-character wire tag
    pub fn tag(self) -> &'static str {
        match self {
            Version::V002 => "002",
        }
    }

    /// Look up a suite by its wire tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "002" => Some(Version::V002),
            _ => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The five fields of an envelope, kept as the exact text that was signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub version: String,
    pub auth_hash: String,
    pub uuid: String,
    pub iv: String,
    pub ciphertext: String,
}

impl Envelope {
    /// Split wire text into its five fields
    pub fn parse(text: &str) -> EnvelopeResult<Self> {
        let fields: Vec<&str> = text.split(SEPARATOR).collect();
        debug!(fields = fields.len(), "parsing envelope");

        match fields.as_slice() {
            [version, auth_hash, uuid, iv, ciphertext] => Ok(Self {
                version: version.to_string(),
                auth_hash: auth_hash.to_string(),
                uuid: uuid.to_string(),
                iv: iv.to_string(),
                ciphertext: ciphertext.to_string(),
            }),
            _ => Err(EnvelopeError::Format(format!(
                "Envelope must have {} fields, found {}",
                ENVELOPE_FIELDS,
                fields.len()
            ))),
        }
    }

    /// The text covered by the authentication hash
    pub fn signed_message(&self) -> String {
        signed_message(&self.version, &self.uuid, &self.iv, &self.ciphertext)
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.version, self.auth_hash, self.uuid, self.iv, self.ciphertext
        )
    }
}

impl FromStr for Envelope {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn signed_message(version: &str, uuid: &str, iv: &str, ciphertext: &str) -> String {
    [version, uuid, iv, ciphertext].join(":")
}

fn hmac_for(auth_key: &[u8]) -> EnvelopeResult<HmacSha256> {
    <HmacSha256 as Mac>::new_from_slice(auth_key)
        .map_err(|e| EnvelopeError::Crypto(format!("Invalid authentication key: {}", e)))
}

fn invalid_key_length(len: usize) -> EnvelopeError {
    EnvelopeError::Crypto(format!(
        "Encryption key must be 16, 24 or 32 bytes, got {}",
        len
    ))
}

fn cbc_encrypt(key: &[u8], iv: &[u8; IV_SIZE], plaintext: &[u8]) -> EnvelopeResult<Vec<u8>> {
    let ciphertext = match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map(|c| c.encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(key, iv)
            .map(|c| c.encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map(|c| c.encrypt_padded_vec_mut::<Pkcs7>(plaintext)),
        n => return Err(invalid_key_length(n)),
    };
    ciphertext.map_err(|_| invalid_key_length(key.len()))
}

fn cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> EnvelopeResult<Vec<u8>> {
    let plaintext = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map(|c| c.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map(|c| c.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map(|c| c.decrypt_padded_vec_mut::<Pkcs7>(ciphertext)),
        n => return Err(invalid_key_length(n)),
    };
    plaintext
        .map_err(|_| EnvelopeError::Crypto(format!("Invalid IV length: {} bytes", iv.len())))?
        .map_err(|_| EnvelopeError::Crypto("Decryption failed: bad padding".to_string()))
}

/// Encrypt byte text under `keys`, producing envelope wire text
///
/// `plaintext` and `uuid` must be byte text. The uuid must not contain `:`.
pub fn encrypt(
    plaintext: &str,
    uuid: &str,
    keys: &KeyPair,
    entropy: &dyn EntropySource,
) -> EnvelopeResult<String> {
    if !is_byte_text(plaintext) {
        return Err(EnvelopeError::Format(
            "Plaintext contains characters outside the single-byte range".to_string(),
        ));
    }
    if uuid.contains(SEPARATOR) || !is_byte_text(uuid) {
        return Err(EnvelopeError::Format(format!(
            "Item id must be single-byte text without '{}'",
            SEPARATOR
        )));
    }

    let iv: [u8; IV_SIZE] = random_array(entropy)?;
    let iv_hex = bytes_to_hex(&iv);

    let encryption_key = keys.encryption_key.to_bytes()?;
    let ciphertext = cbc_encrypt(&encryption_key, &iv, &chars_to_bytes(plaintext))?;
    let ciphertext = encode_base64(&ciphertext);

    let version = Version::CURRENT.tag();
    let message = signed_message(version, uuid, &iv_hex, &ciphertext);

    let auth_key = keys.auth_key.to_bytes()?;
    let mut mac = hmac_for(&auth_key)?;
    mac.update(&chars_to_bytes(&message));
    let auth_hash = bytes_to_hex(&mac.finalize().into_bytes());

    Ok(Envelope {
        version: version.to_string(),
        auth_hash,
        uuid: uuid.to_string(),
        iv: iv_hex,
        ciphertext,
    }
    .to_string())
}

/// Verify the MAC of `envelope`, failing with `Authentication` on mismatch
pub fn verify(envelope: &Envelope, keys: &KeyPair) -> EnvelopeResult<Version> {
    let version = Version::from_tag(&envelope.version).ok_or_else(|| {
        warn!(uuid = %envelope.uuid, "envelope has an unknown version tag");
        EnvelopeError::Authentication
    })?;

    let auth_key = keys.auth_key.to_bytes()?;
    let expected = hex_to_bytes(&envelope.auth_hash).map_err(|_| {
        warn!(uuid = %envelope.uuid, "envelope authentication hash is not hex");
        EnvelopeError::Authentication
    })?;

    // wide characters would alias their low byte in the MAC input
    let message = envelope.signed_message();
    if !is_byte_text(&message) {
        warn!(uuid = %envelope.uuid, "envelope contains characters outside the single-byte range");
        return Err(EnvelopeError::Authentication);
    }

    let mut mac = hmac_for(&auth_key)?;
    mac.update(&chars_to_bytes(&message));
    mac.verify_slice(&expected).map_err(|_| {
        warn!(uuid = %envelope.uuid, "envelope authentication failed");
        EnvelopeError::Authentication
    })?;

    Ok(version)
}

/// Verify then decrypt envelope wire text, returning the byte-text plaintext
pub fn decrypt(text: &str, keys: &KeyPair) -> EnvelopeResult<String> {
    let envelope = Envelope::parse(text)?;

    match verify(&envelope, keys)? {
        Version::V002 => {
            let iv = hex_to_bytes(&envelope.iv)?;
            let ciphertext = decode_base64(&envelope.ciphertext)?;
            let encryption_key = keys.encryption_key.to_bytes()?;
            let plaintext = cbc_decrypt(&encryption_key, &iv, &ciphertext)?;
            Ok(bytes_to_chars(&plaintext))
        }
    }
}
