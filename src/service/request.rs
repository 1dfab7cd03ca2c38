//! Request and response shapes for the crypto service
//!
//! Bodies are camelCase JSON, matching what browser-side callers send.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::EnvelopeError;

/// Routes understood by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Check,
    Key,
    EncryptItem,
    DecryptItem,
    Decrypt,
    RewrapItem,
}

impl Route {
    /// Parse a route path, with or without the `/crypto` prefix
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.strip_prefix("/crypto").unwrap_or(path);
        match path {
            "/check" => Some(Route::Check),
            "/key" => Some(Route::Key),
            "/encrypt-item" => Some(Route::EncryptItem),
            "/decrypt-item" => Some(Route::DecryptItem),
            "/decrypt" => Some(Route::Decrypt),
            "/rewrap-item" => Some(Route::RewrapItem),
            _ => None,
        }
    }
}

/// Derive master key material from a password
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyRequest {
    pub password: String,
    pub salt: String,
    /// Falls back to the configured default cost
    #[serde(default)]
    pub cost: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptItemRequest {
    pub data: Value,
    pub uuid: String,
    pub auth_key: String,
    pub encryption_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptItemRequest {
    pub content: String,
    pub enc_item_key: String,
    pub auth_key: String,
    pub encryption_key: String,
}

/// Legacy single-level decrypt
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptRequest {
    pub text: String,
    pub auth_key: String,
    pub encryption_key: String,
}

/// Move an item key from one master key pair to another
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewrapItemRequest {
    pub content: String,
    pub enc_item_key: String,
    pub auth_key: String,
    pub encryption_key: String,
    pub new_auth_key: String,
    pub new_encryption_key: String,
}

/// A status code and a JSON body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn bad_request() -> Self {
        Self {
            status: 400,
            body: json!({"error": "route", "message": "bad request!"}),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            body: json!({"error": "internal", "message": message.into()}),
        }
    }

    pub fn from_error(err: &EnvelopeError) -> Self {
        let status = match err {
            EnvelopeError::Format(_) => 400,
            EnvelopeError::Authentication => 401,
            EnvelopeError::Crypto(_) => 422,
            EnvelopeError::Timeout(_) => 504,
            EnvelopeError::Config(_) | EnvelopeError::Io(_) => 500,
        };
        Self {
            status,
            body: json!({"error": err.kind(), "message": err.to_string()}),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}
