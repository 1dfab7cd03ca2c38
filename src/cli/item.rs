//! Item encryption commands
//!
//! `item encrypt` reads a JSON value and prints a wrapped item;
//! `item decrypt` and `item rewrap` read a wrapped item back.

use std::path::PathBuf;

use clap::Subcommand;
use serde_json::Value;

use super::{read_input, MasterKeyArgs};
use crate::crypto::{KeyPair, Sealer, WrappedItem};
use crate::error::EnvelopeResult;

/// Item management commands
#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Encrypt a JSON value under a fresh item key
    Encrypt {
        /// Item id bound into both envelopes (defaults to a new UUID)
        #[arg(long)]
        uuid: Option<String>,

        #[command(flatten)]
        keys: MasterKeyArgs,

        /// JSON file to encrypt (stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Decrypt a wrapped item back to its JSON value
    Decrypt {
        /// Content envelope (otherwise read from the wrapped item JSON)
        #[arg(long, requires = "enc_item_key")]
        content: Option<String>,

        /// Item key envelope
        #[arg(long, requires = "content")]
        enc_item_key: Option<String>,

        #[command(flatten)]
        keys: MasterKeyArgs,

        /// Wrapped item JSON file (stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Move a wrapped item to new master keys without touching its content
    Rewrap {
        #[command(flatten)]
        keys: MasterKeyArgs,

        /// New master authentication key (hex)
        #[arg(long)]
        new_auth_key: String,

        /// New master encryption key (hex)
        #[arg(long)]
        new_encryption_key: String,

        /// Wrapped item JSON file (stdin when omitted)
        file: Option<PathBuf>,
    },
}

/// Handle item commands
pub fn handle_item_command(sealer: &Sealer, cmd: ItemCommands) -> EnvelopeResult<()> {
    match cmd {
        ItemCommands::Encrypt { uuid, keys, file } => {
            let data: Value = serde_json::from_str(&read_input(file.as_ref())?)?;
            let uuid = uuid.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let wrapped = sealer.encrypt_item(&data, &uuid, &keys.key_pair()?)?;
            println!("{}", serde_json::to_string(&wrapped)?);
        }
        ItemCommands::Decrypt {
            content,
            enc_item_key,
            keys,
            file,
        } => {
            let wrapped = match (content, enc_item_key) {
                (Some(encrypted_content), Some(enc_item_key)) => WrappedItem {
                    encrypted_content,
                    enc_item_key,
                },
                _ => serde_json::from_str(&read_input(file.as_ref())?)?,
            };
            let data: Value = sealer.decrypt_item(&wrapped, &keys.key_pair()?)?;
            println!("{}", data);
        }
        ItemCommands::Rewrap {
            keys,
            new_auth_key,
            new_encryption_key,
            file,
        } => {
            let wrapped: WrappedItem = serde_json::from_str(&read_input(file.as_ref())?)?;
            let new_keys = KeyPair::from_hex(&new_encryption_key, &new_auth_key)?;
            let rewrapped = sealer.rewrap_item_key(&wrapped, &keys.key_pair()?, &new_keys)?;
            println!("{}", serde_json::to_string(&rewrapped)?);
        }
    }
    Ok(())
}

/// Legacy single-level decrypt of one envelope
pub fn handle_decrypt_command(
    sealer: &Sealer,
    text: Option<String>,
    keys: &MasterKeyArgs,
) -> EnvelopeResult<()> {
    let text = match text {
        Some(text) => text,
        None => read_input(None)?.trim().to_string(),
    };
    println!("{}", sealer.decrypt(&text, &keys.key_pair()?)?);
    Ok(())
}
