//! Path management for envelope-crypto
//!
//! ## Path Resolution Order
//!
//! 1. `ENVELOPE_CRYPTO_DIR` environment variable (if set)
//! 2. The platform config directory (`~/.config/envelope-crypto` on Linux,
//!    `~/Library/Application Support/envelope-crypto` on macOS,
//!    `%APPDATA%\envelope-crypto` on Windows)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::EnvelopeError;

/// Environment variable that overrides the base directory
pub const DIR_ENV_VAR: &str = "ENVELOPE_CRYPTO_DIR";

/// Manages all paths used by envelope-crypto
#[derive(Debug, Clone)]
pub struct EnvelopePaths {
    /// Base directory for configuration
    base_dir: PathBuf,
}

impl EnvelopePaths {
    /// Create a new EnvelopePaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, EnvelopeError> {
        let base_dir = match std::env::var_os(DIR_ENV_VAR) {
            Some(custom) => PathBuf::from(custom),
            None => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create EnvelopePaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), EnvelopeError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| EnvelopeError::Io(format!("Failed to create base directory: {}", e)))
    }

    /// Check if a settings file has been written
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, EnvelopeError> {
    ProjectDirs::from("", "", "envelope-crypto")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| EnvelopeError::Config("Could not determine home directory".into()))
}
