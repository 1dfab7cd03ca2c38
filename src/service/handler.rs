//! Request dispatch for the crypto service
//!
//! Each request runs on its own blocking task so that a slow password
//! stretch never stalls unrelated requests. A semaphore caps how many run at
//! once, and every request carries a deadline.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::request::{
    DecryptItemRequest, DecryptRequest, EncryptItemRequest, KeyRequest, Response,
    RewrapItemRequest, Route,
};
use crate::config::settings::{KdfSettings, Settings};
use crate::crypto::entropy::{EntropySource, OsEntropy};
use crate::crypto::item::{Sealer, WrappedItem};
use crate::crypto::kdf::stretch_password;
use crate::crypto::keys::KeyPair;
use crate::error::{EnvelopeError, EnvelopeResult};

/// Stateless request handler shared by all callers
pub struct CryptoService<E = OsEntropy> {
    sealer: Arc<Sealer<E>>,
    kdf: KdfSettings,
    timeout: Duration,
    max_in_flight: usize,
    permits: Arc<Semaphore>,
}

impl CryptoService<OsEntropy> {
    /// Service backed by the OS random source
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Sealer::default(), settings)
    }
}

impl<E: EntropySource + 'static> CryptoService<E> {
    pub fn new(sealer: Sealer<E>, settings: &Settings) -> Self {
        Self {
            sealer: Arc::new(sealer),
            kdf: settings.kdf.clone(),
            timeout: Duration::from_secs(settings.service.request_timeout_secs),
            max_in_flight: settings.service.max_in_flight,
            permits: Arc::new(Semaphore::new(settings.service.max_in_flight)),
        }
    }

    /// Override the per-request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of requests allowed to execute at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Handle one request and always produce a response
    pub async fn handle(&self, path: &str, body: &str) -> Response {
        let Some(route) = Route::parse(path) else {
            debug!(path, "unknown route");
            return Response::bad_request();
        };

        if route == Route::Check {
            return Response::ok(json!("OK"));
        }

        let sealer = Arc::clone(&self.sealer);
        let kdf = self.kdf.clone();
        let permits = Arc::clone(&self.permits);
        let body = body.to_string();

        let run = async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|e| EnvelopeError::Io(format!("Service is shutting down: {}", e)))?;
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                execute(&sealer, &kdf, route, &body)
            })
            .await
            .map_err(|e| EnvelopeError::Io(format!("Request task failed: {}", e)))?
        };

        match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(value)) => Response::ok(value),
            Ok(Err(err)) => {
                debug!(?route, kind = err.kind(), "request failed");
                Response::from_error(&err)
            }
            Err(_) => {
                warn!(?route, "request exceeded its deadline");
                Response::from_error(&EnvelopeError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}

fn execute<E: EntropySource>(
    sealer: &Sealer<E>,
    kdf: &KdfSettings,
    route: Route,
    body: &str,
) -> EnvelopeResult<Value> {
    match route {
        Route::Check => Ok(json!("OK")),
        Route::Key => {
            let req: KeyRequest = serde_json::from_str(body)?;
            let cost = kdf.resolve_cost(req.cost)?;
            let key = stretch_password(&req.password, &req.salt, cost)?;
            Ok(Value::String(key.as_hex().to_string()))
        }
        Route::EncryptItem => {
            let req: EncryptItemRequest = serde_json::from_str(body)?;
            let master = KeyPair::from_hex(&req.encryption_key, &req.auth_key)?;
            let wrapped = sealer.encrypt_item(&req.data, &req.uuid, &master)?;
            Ok(serde_json::to_value(wrapped)?)
        }
        Route::DecryptItem => {
            let req: DecryptItemRequest = serde_json::from_str(body)?;
            let master = KeyPair::from_hex(&req.encryption_key, &req.auth_key)?;
            let wrapped = WrappedItem {
                encrypted_content: req.content,
                enc_item_key: req.enc_item_key,
            };
            sealer.decrypt_item(&wrapped, &master)
        }
        Route::Decrypt => {
            let req: DecryptRequest = serde_json::from_str(body)?;
            let keys = KeyPair::from_hex(&req.encryption_key, &req.auth_key)?;
            Ok(Value::String(sealer.decrypt(&req.text, &keys)?))
        }
        Route::RewrapItem => {
            let req: RewrapItemRequest = serde_json::from_str(body)?;
            let old_master = KeyPair::from_hex(&req.encryption_key, &req.auth_key)?;
            let new_master = KeyPair::from_hex(&req.new_encryption_key, &req.new_auth_key)?;
            let wrapped = WrappedItem {
                encrypted_content: req.content,
                enc_item_key: req.enc_item_key,
            };
            let rewrapped = sealer.rewrap_item_key(&wrapped, &old_master, &new_master)?;
            Ok(serde_json::to_value(rewrapped)?)
        }
    }
}
