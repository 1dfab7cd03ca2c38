//! Cryptographic core for envelope-crypto
//!
//! Provides PBKDF2-HMAC-SHA-512 key stretching, AES-CBC + HMAC-SHA-256
//! authenticated envelopes, and two-level item wrapping.

pub mod cipher;
pub mod codec;
pub mod entropy;
pub mod item;
pub mod kdf;
pub mod keys;

pub use cipher::{decrypt, encrypt, Envelope, Version};
pub use entropy::{EntropySource, OsEntropy};
pub use item::{canonical_json, Sealer, WrappedItem};
pub use kdf::{derive_key_material, generate_random_bits, stretch_password};
pub use keys::{split_key, KeyMaterial, KeyPair, MasterKeys};
