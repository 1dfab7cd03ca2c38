//! JSON-lines transport for the crypto service
//!
//! Input lines look like `{"id": 1, "route": "/key", "body": {...}}`.
//! Each line is dispatched on its own task, and replies are written as they
//! complete, so the output order may differ from the input order. The `id`
//! is echoed back for matching.
//!
//! At most `PENDING_PER_SLOT * max_in_flight` lines are accepted but not yet
//! answered. Reading pauses at that limit until replies are written.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info};

use super::handler::CryptoService;
use super::request::Response;
use crate::crypto::entropy::EntropySource;
use crate::error::{EnvelopeError, EnvelopeResult};

/// Accepted but unanswered lines allowed per execution slot
pub const PENDING_PER_SLOT: usize = 4;

#[derive(Debug, Deserialize)]
struct LineRequest {
    #[serde(default)]
    id: Value,
    route: String,
    #[serde(default)]
    body: Value,
}

#[derive(Debug, Serialize)]
struct LineReply {
    id: Value,
    status: u16,
    body: Value,
}

async fn handle_line<E: EntropySource + 'static>(service: &CryptoService<E>, line: &str) -> String {
    let reply = match serde_json::from_str::<LineRequest>(line) {
        Ok(req) => {
            let resp = service.handle(&req.route, &req.body.to_string()).await;
            LineReply {
                id: req.id,
                status: resp.status,
                body: resp.body,
            }
        }
        Err(e) => {
            let resp = Response::from_error(&EnvelopeError::from(e));
            LineReply {
                id: Value::Null,
                status: resp.status,
                body: resp.body,
            }
        }
    };

    serde_json::to_string(&reply).unwrap_or_else(|e| {
        format!(
            r#"{{"id":null,"status":500,"body":{{"error":"internal","message":"{}"}}}}"#,
            e
        )
    })
}

/// Serve requests from `reader` until end of input, writing replies to `writer`
pub async fn serve_lines<E, R, W>(
    service: Arc<CryptoService<E>>,
    reader: R,
    mut writer: W,
) -> EnvelopeResult<()>
where
    E: EntropySource + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let limit = service.max_in_flight().max(1) * PENDING_PER_SLOT;
    let intake = Arc::new(Semaphore::new(limit));
    let (tx, mut rx) = mpsc::channel::<String>(limit);

    let read = async move {
        let mut lines = reader.lines();
        let mut count = 0usize;
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let slot = Arc::clone(&intake)
                .acquire_owned()
                .await
                .map_err(|e| EnvelopeError::Io(format!("Intake closed: {}", e)))?;
            count += 1;
            let service = Arc::clone(&service);
            let tx = tx.clone();
            tokio::spawn(async move {
                let reply = handle_line(&service, &line).await;
                // receiver only goes away if the writer failed
                let _ = tx.send(reply).await;
                drop(slot);
            });
        }
        debug!(count, "input closed");
        Ok::<(), EnvelopeError>(())
    };

    let write = async {
        while let Some(reply) = rx.recv().await {
            writer.write_all(reply.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        Ok::<(), EnvelopeError>(())
    };

    info!("serving requests");
    let (read_result, write_result) = tokio::join!(read, write);
    read_result?;
    write_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::crypto::item::Sealer;

    fn service() -> Arc<CryptoService> {
        Arc::new(CryptoService::new(
            Sealer::default().with_random_key_cost(10),
            &Settings::default(),
        ))
    }

    async fn run(input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        serve_lines(service(), input.as_bytes(), &mut output)
            .await
            .unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_replies_echo_ids() {
        let input = concat!(
            r#"{"id": 1, "route": "/check"}"#,
            "\n\n",
            r#"{"id": "b", "route": "/key", "body": {"password": "p", "salt": "s", "cost": 100}}"#,
            "\n",
        );
        let replies = run(input).await;
        assert_eq!(replies.len(), 2);

        let check = replies.iter().find(|r| r["id"] == 1).unwrap();
        assert_eq!(check["body"], "OK");
        let key = replies.iter().find(|r| r["id"] == "b").unwrap();
        assert_eq!(key["status"], 200);
        assert_eq!(key["body"].as_str().unwrap().len(), 192);
    }

    #[tokio::test]
    async fn test_malformed_line_gets_400() {
        let replies = run("this is not json\n").await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["status"], 400);
        assert_eq!(replies[0]["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_more_lines_than_pending_limit() {
        let mut settings = Settings::default();
        settings.service.max_in_flight = 1;
        let service = Arc::new(CryptoService::new(
            Sealer::default().with_random_key_cost(10),
            &settings,
        ));

        let total = PENDING_PER_SLOT * 5;
        let input: String = (0..total)
            .map(|i| {
                let line = serde_json::json!({
                    "id": i,
                    "route": "/key",
                    "body": {"password": "p", "salt": "s", "cost": 10},
                });
                format!("{}\n", line)
            })
            .collect();

        let mut output = Vec::new();
        serve_lines(service, input.as_bytes(), &mut output)
            .await
            .unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(replies.len(), total);
        for i in 0..total {
            let reply = replies.iter().find(|r| r["id"] == i).unwrap();
            assert_eq!(reply["status"], 200);
        }
    }

    #[tokio::test]
    async fn test_empty_input() {
        assert!(run("").await.is_empty());
    }
}
