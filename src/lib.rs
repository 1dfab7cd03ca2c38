//! envelope-crypto - client-side envelope encryption for local-first apps
//!
//! This library implements a two-level envelope encryption scheme for user
//! items in a note or password manager:
//!
//! 1. A password is stretched with PBKDF2-HMAC-SHA-512 into master key
//!    material. Nothing derived from it is ever persisted by this crate.
//! 2. Each item is encrypted under a fresh random key pair, and that key
//!    pair's material is itself encrypted under the master keys.
//!
//! Every ciphertext travels as a five-field envelope,
//! `version:authHash:uuid:iv:ciphertext`, whose HMAC is checked before any
//! decryption happens.
//!
//! # Architecture
//!
//! - `crypto`: codec, key derivation, key splitting, the authenticated
//!   cipher and item wrapping
//! - `service`: route-based request handling on tokio
//! - `config`: paths and settings
//! - `cli`: command handlers for the `envelope-crypto` binary
//! - `error`: error taxonomy
//!
//! # Example
//!
//! ```rust,ignore
//! use envelope_crypto::crypto::{stretch_password, MasterKeys, Sealer};
//!
//! let stretched = stretch_password("correct horse", "saltsalt", 100_000)?;
//! let master = MasterKeys::from_stretched(&stretched)?;
//! let sealer = Sealer::default();
//! let wrapped = sealer.encrypt_item(&serde_json::json!({"note": "hello"}), "item-1", &master.keys)?;
//! let data: serde_json::Value = sealer.decrypt_item(&wrapped, &master.keys)?;
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod service;

pub use error::{EnvelopeError, EnvelopeResult};
