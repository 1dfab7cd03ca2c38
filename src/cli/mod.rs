//! CLI command handlers
//!
//! This module contains the implementation of CLI commands, bridging the
//! clap argument parsing with the cryptographic core.

pub mod item;
pub mod key;
pub mod serve;

use std::io::Read;
use std::path::PathBuf;

use clap::Args;

use crate::crypto::KeyPair;
use crate::error::{EnvelopeError, EnvelopeResult};

pub use item::{handle_decrypt_command, handle_item_command, ItemCommands};
pub use key::{handle_key_command, KeyArgs};
pub use serve::handle_serve_command;

/// Master key pair as hex, from flags or the environment
#[derive(Args, Debug, Clone)]
pub struct MasterKeyArgs {
    /// Master authentication key (hex)
    #[arg(long, env = "ENVELOPE_AUTH_KEY", hide_env_values = true)]
    pub auth_key: String,

    /// Master encryption key (hex)
    #[arg(long, env = "ENVELOPE_ENCRYPTION_KEY", hide_env_values = true)]
    pub encryption_key: String,
}

impl MasterKeyArgs {
    pub fn key_pair(&self) -> EnvelopeResult<KeyPair> {
        KeyPair::from_hex(&self.encryption_key, &self.auth_key)
    }
}

/// Read a whole file, or stdin when no path (or `-`) is given
pub fn read_input(path: Option<&PathBuf>) -> EnvelopeResult<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => std::fs::read_to_string(p)
            .map_err(|e| EnvelopeError::Io(format!("Failed to read {}: {}", p.display(), e))),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
