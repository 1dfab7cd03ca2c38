//! Key material and key pairs
//!
//! Key material is a hex string produced by the derivation function. It is
//! zeroed on drop and never printed by `Debug`.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::codec::hex_to_bytes;
use crate::error::{EnvelopeError, EnvelopeResult};

/// Hex-encoded bits produced by a derivation call
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    hex: String,
}

impl KeyMaterial {
    /// Wrap an existing hex string, checking that it is well-formed hex
    pub fn from_hex(hex: impl Into<String>) -> EnvelopeResult<Self> {
        let hex = hex.into();
        if hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EnvelopeError::Format(
                "Key material must be an even-length hex string".to_string(),
            ));
        }
        Ok(Self {
            hex: hex.to_ascii_lowercase(),
        })
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            hex: hex::encode(bytes),
        }
    }

    /// The hex text
    pub fn as_hex(&self) -> &str {
        &self.hex
    }

    /// Number of bits this material encodes
    pub fn bit_len(&self) -> usize {
        self.hex.len() * 4
    }

    /// Decode to raw bytes in a buffer that is wiped on drop
    pub fn to_bytes(&self) -> EnvelopeResult<Zeroizing<Vec<u8>>> {
        hex_to_bytes(&self.hex).map(Zeroizing::new)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("bits", &self.bit_len())
            .finish()
    }
}

/// An encryption key and the matching authentication key
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    pub encryption_key: KeyMaterial,
    pub auth_key: KeyMaterial,
}

impl KeyPair {
    pub fn new(encryption_key: KeyMaterial, auth_key: KeyMaterial) -> Self {
        Self {
            encryption_key,
            auth_key,
        }
    }

    /// Build a pair from the two hex strings a caller supplies
    pub fn from_hex(encryption_key: &str, auth_key: &str) -> EnvelopeResult<Self> {
        Ok(Self::new(
            KeyMaterial::from_hex(encryption_key)?,
            KeyMaterial::from_hex(auth_key)?,
        ))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("encryption_key", &self.encryption_key)
            .field("auth_key", &self.auth_key)
            .finish()
    }
}

/// Split key material at its midpoint
///
/// The first half becomes the encryption key, the second half the
/// authentication key. Odd-length input gives the extra character to the
/// authentication half.
pub fn split_key(material: &KeyMaterial) -> KeyPair {
    let hex = material.as_hex();
    let mid = hex.len() / 2;
    KeyPair {
        encryption_key: KeyMaterial {
            hex: hex[..mid].to_string(),
        },
        auth_key: KeyMaterial {
            hex: hex[mid..].to_string(),
        },
    }
}

/// Keys obtained from a stretched password
///
/// The 768-bit stretched material is cut into three 256-bit parts: a server
/// password that can be sent to a sync service for login, then the master
/// encryption key, then the master authentication key. Only the last two
/// ever touch item data.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKeys {
    pub server_password: KeyMaterial,
    pub keys: KeyPair,
}

impl MasterKeys {
    pub fn from_stretched(material: &KeyMaterial) -> EnvelopeResult<Self> {
        let hex = material.as_hex();
        if hex.len() % 3 != 0 || hex.is_empty() {
            return Err(EnvelopeError::Format(format!(
                "Stretched key material of {} bits cannot be split in thirds",
                material.bit_len()
            )));
        }
        let third = hex.len() / 3;
        let part = |i: usize| KeyMaterial {
            hex: hex[i * third..(i + 1) * third].to_string(),
        };
        Ok(Self {
            server_password: part(0),
            keys: KeyPair::new(part(1), part(2)),
        })
    }
}

impl fmt::Debug for MasterKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKeys")
            .field("server_password", &self.server_password)
            .field("keys", &self.keys)
            .finish()
    }
}
