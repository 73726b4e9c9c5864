//! Substrate node client.
//!
//! One-shot storage queries go over HTTP JSON-RPC (`state_getStorage`);
//! the change-notification feed is a WebSocket JSON-RPC subscription
//! (`state_subscribeStorage`) scoped to a single storage key. A reader
//! task decodes storage change sets and forwards them into the feed
//! channel; transport failures surface as feed items, after which the
//! channel closes.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, info, warn};

use crate::accounts::AccountId;
use crate::connectors::storage::{system_account_key, StorageKey};
use crate::events::{decode_account_record, AccountInfo, ChangeNotification, CodecError};

/// Default node endpoints (local dev node).
const DEFAULT_HTTP_URL: &str = "http://127.0.0.1:9933";
const DEFAULT_WS_URL: &str = "ws://127.0.0.1:9944";

/// Capacity of the feed channel between the reader task and a watcher.
const FEED_BUFFER: usize = 1000;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("node request failed: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("node returned rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("account has no on-chain record")]
    NotFound,

    #[error("subscription failed: {0}")]
    Subscription(String),

    #[error("malformed storage value: {0}")]
    BadValue(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Error delivered on a change feed. Fatal to the owning monitor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("feed transport failed: {0}")]
    Transport(String),

    #[error("malformed change notification: {0}")]
    BadPayload(String),

    #[error("subscription closed by node: {0}")]
    Closed(String),
}

/// A change-notification feed for one storage key.
///
/// Collapses the data/error race into a single stream of tagged
/// outcomes: each item is either a notification or a fatal feed error.
/// `next()` returning `None` means the feed is closed.
pub struct ChangeFeed {
    rx: mpsc::Receiver<Result<ChangeNotification, FeedError>>,
}

impl ChangeFeed {
    /// Creates a feed plus the sender that drives it.
    pub fn channel() -> (mpsc::Sender<Result<ChangeNotification, FeedError>>, Self) {
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        (tx, Self { rx })
    }

    /// Waits for the next notification or error.
    ///
    /// This is the only blocking point in a monitor's steady-state loop;
    /// no timeout is applied by design.
    pub async fn next(&mut self) -> Option<Result<ChangeNotification, FeedError>> {
        self.rx.recv().await
    }
}

/// Read-only ledger access shared by all monitors.
///
/// Implementations must be safe for concurrent use: monitors issue
/// independent queries and open independent feeds over one client.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Fetches the current account record for `id`.
    async fn account_balance(&self, id: &AccountId) -> Result<AccountInfo, ClientError>;

    /// Opens a change-notification feed scoped to `key`.
    async fn open_change_feed(&self, key: &StorageKey) -> Result<ChangeFeed, ClientError>;
}

/// JSON-RPC client for a Substrate node.
#[derive(Debug, Clone)]
pub struct NodeClient {
    http: Client,
    http_url: String,
    ws_url: String,
}

impl NodeClient {
    /// Creates a client for the given HTTP and WebSocket endpoints.
    pub fn new(http_url: String, ws_url: String) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("default tls backend is available");

        Self {
            http,
            http_url,
            ws_url,
        }
    }

    /// Creates a client from `NODE_HTTP_URL` / `NODE_WS_URL`, falling back
    /// to the local dev node.
    pub fn from_env() -> Self {
        let http_url =
            std::env::var("NODE_HTTP_URL").unwrap_or_else(|_| DEFAULT_HTTP_URL.to_string());
        let ws_url = std::env::var("NODE_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.to_string());
        Self::new(http_url, ws_url)
    }

    pub fn http_url(&self) -> &str {
        &self.http_url
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Performs a one-shot JSON-RPC call over HTTP.
    async fn rpc(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response: RpcEnvelope = self
            .http
            .post(&self.http_url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(ClientError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(response.result.unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl LedgerClient for NodeClient {
    async fn account_balance(&self, id: &AccountId) -> Result<AccountInfo, ClientError> {
        let key = system_account_key(id);
        debug!("Fetching account record for {}", id);

        let result = self.rpc("state_getStorage", json!([key.to_hex()])).await?;
        let value = match result {
            serde_json::Value::Null => return Err(ClientError::NotFound),
            serde_json::Value::String(s) => s,
            other => {
                return Err(ClientError::BadValue(format!(
                    "expected hex string, got {}",
                    other
                )))
            }
        };

        let raw = decode_hex_bytes(&value).map_err(ClientError::BadValue)?;
        Ok(decode_account_record(&raw)?)
    }

    async fn open_change_feed(&self, key: &StorageKey) -> Result<ChangeFeed, ClientError> {
        info!("Subscribing to storage changes at {}", self.ws_url);

        let (ws, _response) = connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| ClientError::Subscription(e.to_string()))?;
        let (mut write, mut read) = ws.split();

        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "state_subscribeStorage",
            "params": [[key.to_hex()]],
        });
        write
            .send(Message::Text(request.to_string()))
            .await
            .map_err(|e| ClientError::Subscription(e.to_string()))?;

        // Wait for the subscription id before handing out the feed.
        let subscription_id = loop {
            match read.next().await {
                Some(Ok(Message::Text(text))) => {
                    let envelope: RpcEnvelope = serde_json::from_str(&text)
                        .map_err(|e| ClientError::Subscription(e.to_string()))?;
                    if let Some(err) = envelope.error {
                        return Err(ClientError::Rpc {
                            code: err.code,
                            message: err.message,
                        });
                    }
                    match envelope.result {
                        Some(serde_json::Value::String(id)) => break id,
                        other => {
                            return Err(ClientError::Subscription(format!(
                                "unexpected subscription reply: {:?}",
                                other
                            )))
                        }
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    let _ = write.send(Message::Pong(payload)).await;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(ClientError::Subscription(e.to_string())),
                None => {
                    return Err(ClientError::Subscription(
                        "connection closed during handshake".to_string(),
                    ))
                }
            }
        };
        debug!("Storage subscription established: {}", subscription_id);

        let (feed_tx, feed) = ChangeFeed::channel();

        // Reader task: decode change sets and forward them until the
        // socket or the receiving monitor goes away.
        tokio::spawn(async move {
            loop {
                let message = match read.next().await {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        let _ = feed_tx.send(Err(FeedError::Transport(e.to_string()))).await;
                        break;
                    }
                    None => break,
                };

                match message {
                    Message::Text(text) => {
                        let item = parse_change_set(&text);
                        match item {
                            Ok(notifications) => {
                                for note in notifications {
                                    if feed_tx.send(Ok(note)).await.is_err() {
                                        return;
                                    }
                                }
                            }
                            Err(e) => {
                                let _ = feed_tx.send(Err(e)).await;
                                break;
                            }
                        }
                    }
                    Message::Ping(payload) => {
                        let _ = write.send(Message::Pong(payload)).await;
                    }
                    Message::Close(frame) => {
                        let reason = frame
                            .map(|f| f.reason.to_string())
                            .unwrap_or_else(|| "no close reason".to_string());
                        let _ = feed_tx.send(Err(FeedError::Closed(reason))).await;
                        break;
                    }
                    _ => {}
                }
            }
            debug!("Storage subscription reader stopped");
        });

        Ok(feed)
    }
}

/// Parses one WebSocket frame into the notifications it carries.
///
/// Frames that are not `state_storage` notifications (late call replies,
/// for instance) yield nothing. Deleted storage entries arrive as null
/// values and are skipped.
fn parse_change_set(text: &str) -> Result<Vec<ChangeNotification>, FeedError> {
    let envelope: RpcEnvelope =
        serde_json::from_str(text).map_err(|e| FeedError::BadPayload(e.to_string()))?;

    if envelope.method.as_deref() != Some("state_storage") {
        debug!("Ignoring non-subscription frame");
        return Ok(Vec::new());
    }
    let params = envelope
        .params
        .ok_or_else(|| FeedError::BadPayload("notification without params".to_string()))?;

    let mut notifications = Vec::new();
    for (key, value) in params.result.changes {
        let Some(value) = value else {
            warn!("Storage entry {} was deleted; skipping", key);
            continue;
        };
        let raw = decode_hex_bytes(&value).map_err(FeedError::BadPayload)?;
        notifications.push(ChangeNotification::new(raw));
    }
    Ok(notifications)
}

fn decode_hex_bytes(value: &str) -> Result<Vec<u8>, String> {
    hex::decode(value.strip_prefix("0x").unwrap_or(value)).map_err(|e| e.to_string())
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<SubscriptionParams>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionParams {
    result: StorageChangeSet,
}

#[derive(Debug, Deserialize)]
struct StorageChangeSet {
    #[allow(dead_code)]
    block: String,
    changes: Vec<(String, Option<String>)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_change_set() {
        let frame = r#"{
            "jsonrpc": "2.0",
            "method": "state_storage",
            "params": {
                "subscription": "abc123",
                "result": {
                    "block": "0x01",
                    "changes": [["0xkey00", "0xdeadbeef"]]
                }
            }
        }"#;

        let notes = parse_change_set(frame).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].raw, vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_parse_skips_deleted_entries() {
        let frame = r#"{
            "jsonrpc": "2.0",
            "method": "state_storage",
            "params": {
                "subscription": "abc123",
                "result": {
                    "block": "0x01",
                    "changes": [["0xkey00", null], ["0xkey00", "0x00"]]
                }
            }
        }"#;

        let notes = parse_change_set(frame).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].raw, vec![0x00]);
    }

    #[test]
    fn test_parse_ignores_call_replies() {
        let frame = r#"{"jsonrpc": "2.0", "id": 1, "result": "abc123"}"#;
        assert!(parse_change_set(frame).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_change_set("not json"),
            Err(FeedError::BadPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_feed_channel_delivers_in_order() {
        let (tx, mut feed) = ChangeFeed::channel();
        tx.send(Ok(ChangeNotification::new(vec![1]))).await.unwrap();
        tx.send(Err(FeedError::Transport("gone".to_string())))
            .await
            .unwrap();
        drop(tx);

        assert_eq!(feed.next().await.unwrap().unwrap().raw, vec![1]);
        assert!(feed.next().await.unwrap().is_err());
        assert!(feed.next().await.is_none());
    }

    #[test]
    fn test_from_env_defaults() {
        // Env vars are absent in the test environment.
        let client = NodeClient::from_env();
        assert_eq!(client.http_url(), DEFAULT_HTTP_URL);
        assert_eq!(client.ws_url(), DEFAULT_WS_URL);
    }
}
