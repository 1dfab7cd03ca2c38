//! Custom error types for envelope-crypto
//!
//! This module defines the error hierarchy for the library using thiserror
//! for ergonomic error definitions. Every failure in the cryptographic core
//! surfaces as one of these variants; nothing is recovered locally.

use thiserror::Error;

/// The main error type for envelope-crypto operations
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// Malformed input: bad hex, wrong envelope field count, bad JSON
    #[error("Format error: {0}")]
    Format(String),

    /// Integrity check failed: wrong key or tampered data
    #[error("Authentication failed: wrong key or tampered data")]
    Authentication,

    /// Cipher-level failure: bad key length, bad padding
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// A request did not finish within its deadline
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

impl EnvelopeError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Format(_) => "format",
            Self::Authentication => "authentication",
            Self::Crypto(_) => "crypto",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Timeout(_) => "timeout",
        }
    }

    /// Check if this is an authentication failure
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }

    /// Check if this is a format error
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// Check if this is a cipher-level error
    pub fn is_crypto(&self) -> bool {
        matches!(self, Self::Crypto(_))
    }
}

impl From<std::io::Error> for EnvelopeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(format!("invalid JSON: {}", err))
    }
}

/// Result type alias for envelope-crypto operations
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;
