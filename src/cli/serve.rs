//! JSON-lines request service on stdin/stdout

use std::sync::Arc;

use tokio::io::{stdin, stdout, BufReader};
use tracing::info;

use crate::config::Settings;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::service::{serve_lines, CryptoService};

/// Run the request service until stdin closes
pub fn handle_serve_command(settings: &Settings) -> EnvelopeResult<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| EnvelopeError::Io(format!("Failed to start runtime: {}", e)))?;

    let service = Arc::new(CryptoService::from_settings(settings));
    info!(
        max_in_flight = settings.service.max_in_flight,
        timeout_secs = settings.service.request_timeout_secs,
        "starting request service"
    );

    runtime.block_on(serve_lines(service, BufReader::new(stdin()), stdout()))?;

    info!("request service stopped");
    Ok(())
}
