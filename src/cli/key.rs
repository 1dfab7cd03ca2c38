//! Master key derivation command

use std::io::BufRead;

use clap::Args;
use serde_json::json;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::{stretch_password, MasterKeys};
use crate::error::{EnvelopeError, EnvelopeResult};

#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Salt mixed into the derivation
    #[arg(long)]
    pub salt: String,

    /// Iteration count (defaults to the configured cost)
    #[arg(long)]
    pub cost: Option<u32>,

    /// Read the password from the first line of stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,

    /// Print server password, encryption key and auth key separately
    #[arg(long)]
    pub split: bool,
}

/// Stretch a password and print the resulting key material
pub fn handle_key_command(settings: &Settings, args: KeyArgs) -> EnvelopeResult<()> {
    let cost = settings.kdf.resolve_cost(args.cost)?;

    let password = if args.password_stdin {
        read_password_line()?
    } else {
        prompt_password("Password: ")?
    };

    let material = stretch_password(&password, &args.salt, cost)?;

    if args.split {
        let master = MasterKeys::from_stretched(&material)?;
        let out = json!({
            "serverPassword": master.server_password.as_hex(),
            "encryptionKey": master.keys.encryption_key.as_hex(),
            "authKey": master.keys.auth_key.as_hex(),
        });
        println!("{}", out);
    } else {
        println!("{}", material.as_hex());
    }

    Ok(())
}

fn read_password_line() -> EnvelopeResult<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    std::io::stdin().lock().read_line(&mut line)?;
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

/// Prompt for a password (hidden input)
fn prompt_password(prompt: &str) -> EnvelopeResult<Zeroizing<String>> {
    rpassword::prompt_password(prompt)
        .map(Zeroizing::new)
        .map_err(|e| EnvelopeError::Io(format!("Failed to read password: {}", e)))
}
