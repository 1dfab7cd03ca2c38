//! Two-level envelope wrapping of items
//!
//! Each item is encrypted under its own random key pair. The raw 512-bit
//! material behind that pair is then encrypted under the caller's master key
//! pair. Rotating master keys only re-encrypts the small item-key envelope.

use std::io;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cipher;
use super::entropy::{EntropySource, OsEntropy};
use super::kdf::{generate_random_bits_with_cost, RANDOM_KEY_COST};
use super::keys::{split_key, KeyMaterial, KeyPair};
use crate::error::{EnvelopeError, EnvelopeResult};

/// An encrypted item and its wrapped item key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedItem {
    /// Item content, encrypted under the one-time item keys
    pub encrypted_content: String,
    /// Item key material, encrypted under the master keys
    pub enc_item_key: String,
}

/// Entry point for every operation that consumes randomness
///
/// Holds the injected entropy source. Stateless otherwise, so one `Sealer`
/// can serve any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct Sealer<E = OsEntropy> {
    entropy: E,
    random_key_cost: u32,
}

impl Default for Sealer<OsEntropy> {
    fn default() -> Self {
        Self::new(OsEntropy)
    }
}

impl<E: EntropySource> Sealer<E> {
    pub fn new(entropy: E) -> Self {
        Self {
            entropy,
            random_key_cost: RANDOM_KEY_COST,
        }
    }

    /// Override the iteration count used for random item keys
    ///
    /// Only lowers the cost of turning already-random bytes into key
    /// material; it has no effect on password stretching.
    pub fn with_random_key_cost(mut self, cost: u32) -> Self {
        self.random_key_cost = cost;
        self
    }

    /// Fresh 512-bit key material
    pub fn generate_random_bits(&self) -> EnvelopeResult<KeyMaterial> {
        generate_random_bits_with_cost(&self.entropy, self.random_key_cost)
    }

    /// Single-level encryption of byte text
    pub fn encrypt(&self, plaintext: &str, uuid: &str, keys: &KeyPair) -> EnvelopeResult<String> {
        cipher::encrypt(plaintext, uuid, keys, &self.entropy)
    }

    /// Single-level verify-then-decrypt
    pub fn decrypt(&self, text: &str, keys: &KeyPair) -> EnvelopeResult<String> {
        cipher::decrypt(text, keys)
    }

    /// Encrypt `data` under a one-time key, and that key under `master`
    pub fn encrypt_item<T: Serialize + ?Sized>(
        &self,
        data: &T,
        uuid: &str,
        master: &KeyPair,
    ) -> EnvelopeResult<WrappedItem> {
        let item_material = self.generate_random_bits()?;
        let item_keys = split_key(&item_material);

        let content = canonical_json(data)?;
        let encrypted_content = self.encrypt(&content, uuid, &item_keys)?;
        let enc_item_key = self.encrypt(item_material.as_hex(), uuid, master)?;

        debug!(uuid, content_len = content.len(), "item encrypted");

        Ok(WrappedItem {
            encrypted_content,
            enc_item_key,
        })
    }

    /// Unwrap the item key under `master`, then decrypt the content
    pub fn decrypt_item<T: DeserializeOwned>(
        &self,
        wrapped: &WrappedItem,
        master: &KeyPair,
    ) -> EnvelopeResult<T> {
        let content = self.decrypt_item_text(wrapped, master)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Like [`Sealer::decrypt_item`] but returns the decrypted JSON text
    pub fn decrypt_item_text(
        &self,
        wrapped: &WrappedItem,
        master: &KeyPair,
    ) -> EnvelopeResult<String> {
        let item_keys = split_key(&self.unwrap_item_key(wrapped, master)?);
        self.decrypt(&wrapped.encrypted_content, &item_keys)
    }

    /// Re-encrypt the item key from `old_master` to `new_master`
    ///
    /// The content envelope is carried over untouched.
    pub fn rewrap_item_key(
        &self,
        wrapped: &WrappedItem,
        old_master: &KeyPair,
        new_master: &KeyPair,
    ) -> EnvelopeResult<WrappedItem> {
        let item_material = self.unwrap_item_key(wrapped, old_master)?;
        let uuid = cipher::Envelope::parse(&wrapped.enc_item_key)?.uuid;
        let enc_item_key = self.encrypt(item_material.as_hex(), &uuid, new_master)?;

        debug!(uuid = %uuid, "item key rewrapped");

        Ok(WrappedItem {
            encrypted_content: wrapped.encrypted_content.clone(),
            enc_item_key,
        })
    }

    fn unwrap_item_key(
        &self,
        wrapped: &WrappedItem,
        master: &KeyPair,
    ) -> EnvelopeResult<KeyMaterial> {
        let raw = zeroize::Zeroizing::new(self.decrypt(&wrapped.enc_item_key, master)?);
        KeyMaterial::from_hex(raw.as_str()).map_err(|_| {
            EnvelopeError::Format("Decrypted item key is not key material".to_string())
        })
    }
}

/// Compact JSON with every non-ASCII character written as `\uXXXX`
///
/// The result is always ASCII, so it passes through the byte-text cipher
/// without loss.
pub fn canonical_json<T: Serialize + ?Sized>(data: &T) -> EnvelopeResult<String> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
    data.serialize(&mut ser)?;
    String::from_utf8(out).map_err(|e| EnvelopeError::Format(e.to_string()))
}

struct AsciiFormatter;

impl serde_json::ser::Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn sealer() -> Sealer {
        Sealer::default().with_random_key_cost(10)
    }

    fn master() -> KeyPair {
        KeyPair::from_hex(&"aa".repeat(32), &"bb".repeat(32)).unwrap()
    }

    #[test]
    fn test_item_round_trip() {
        let data = json!({"note": "hello"});
        let wrapped = sealer().encrypt_item(&data, "item-1", &master()).unwrap();
        let back: Value = sealer().decrypt_item(&wrapped, &master()).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_item_key_is_raw_random_material() {
        let wrapped = sealer().encrypt_item(&json!(1), "id", &master()).unwrap();
        let raw = sealer().decrypt(&wrapped.enc_item_key, &master()).unwrap();
        assert_eq!(raw.len(), 128);
        assert!(KeyMaterial::from_hex(raw).is_ok());
    }

    #[test]
    fn test_non_ascii_content_survives() {
        let data = json!({"note": "caf\u{e9} \u{1f600} \u{20ac}"});
        let wrapped = sealer().encrypt_item(&data, "id", &master()).unwrap();
        let back: Value = sealer().decrypt_item(&wrapped, &master()).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_canonical_json_is_ascii() {
        let text = canonical_json(&json!({"k\u{e9}y": "\u{1f600}"})).unwrap();
        assert!(text.is_ascii());
        assert_eq!(text, r#"{"k\u00e9y":"\ud83d\ude00"}"#);
    }

    #[test]
    fn test_wrong_master_never_reaches_content() {
        let wrapped = sealer().encrypt_item(&json!("x"), "id", &master()).unwrap();
        let other = KeyPair::from_hex(&"aa".repeat(32), &"bc".repeat(32)).unwrap();
        let err = sealer()
            .decrypt_item::<Value>(&wrapped, &other)
            .unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_rewrap_keeps_content() {
        let new_master = KeyPair::from_hex(&"cc".repeat(32), &"dd".repeat(32)).unwrap();
        let data = json!({"password": "hunter2"});
        let wrapped = sealer().encrypt_item(&data, "id", &master()).unwrap();

        let rewrapped = sealer()
            .rewrap_item_key(&wrapped, &master(), &new_master)
            .unwrap();

        assert_eq!(rewrapped.encrypted_content, wrapped.encrypted_content);
        assert_ne!(rewrapped.enc_item_key, wrapped.enc_item_key);
        let back: Value = sealer().decrypt_item(&rewrapped, &new_master).unwrap();
        assert_eq!(back, data);
        assert!(sealer()
            .decrypt_item::<Value>(&rewrapped, &master())
            .unwrap_err()
            .is_authentication());
    }

    #[test]
    fn test_wrapped_item_json_field_names() {
        let item = WrappedItem {
            encrypted_content: "a".into(),
            enc_item_key: "b".into(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json, json!({"encryptedContent": "a", "encItemKey": "b"}));
    }
}
