// src/rpc.rs
use async_trait::async_trait;
use eyre::Result;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::debug;

use crate::models::{Block, Transaction};
use crate::retry::{RetryPolicy, Retryable};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("remote API error: {0}")]
    Remote(String),
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl Retryable for TransportError {
    fn is_retryable(&self) -> bool {
        match self {
            TransportError::Network(_) | TransportError::RateLimited(_) => true,
            TransportError::Status(code) => *code == 429 || (500..600).contains(code),
            TransportError::Remote(_) | TransportError::Decode(_) => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid head response: {0}")]
    InvalidHeadResponse(String),
    #[error("block {0} not found")]
    BlockNotFound(u64),
    #[error("invalid body for block {number}: {reason}")]
    InvalidBlockResponse { number: u64, reason: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// One GET against the block explorer API, returning the decoded JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, params: &[(&str, String)]) -> Result<Value, TransportError>;
}

/// Etherscan-style `?module=proxy&action=...` endpoint
pub struct EtherscanTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl EtherscanTransport {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl Transport for EtherscanTransport {
    async fn get(&self, params: &[(&str, String)]) -> Result<Value, TransportError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| TransportError::Network(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        // error text must not carry the URL, it holds the API key
        resp.json::<Value>().await.map_err(|e| {
            let e = e.without_url();
            if e.is_decode() {
                TransportError::Decode(e.to_string())
            } else {
                TransportError::Network(e.to_string())
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    #[serde(default)]
    transactions: Vec<Transaction>,
}

/// Unwrap the `result` field, turning Etherscan's in-band failures into errors.
/// Throttling arrives as HTTP 200 with a text result, so it is recognised here.
fn into_result(body: Value) -> Result<Value, TransportError> {
    let envelope: EtherscanResponse =
        serde_json::from_value(body).map_err(|e| TransportError::Decode(e.to_string()))?;

    if let Some(err) = envelope.error {
        return Err(TransportError::Remote(format!("{} ({})", err.message, err.code)));
    }
    if let Value::String(text) = &envelope.result {
        if text.to_ascii_lowercase().contains("rate limit") {
            return Err(TransportError::RateLimited(text.clone()));
        }
    }
    if envelope.status.as_deref() == Some("0") && envelope.result.is_null() {
        let message = envelope.message.unwrap_or_default();
        if message.to_ascii_lowercase().contains("rate limit") {
            return Err(TransportError::RateLimited(message));
        }
    }

    Ok(envelope.result)
}

pub fn parse_hex_u64(raw: &str) -> Option<u64> {
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Head and block lookups, each wrapped in the retry policy.
#[derive(Clone)]
pub struct BlockClient {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl BlockClient {
    pub fn new(transport: Arc<dyn Transport>, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    pub async fn fetch_head_number(&self) -> Result<u64, FetchError> {
        self.retry
            .run("eth_blockNumber", move || self.head_once())
            .await
    }

    pub async fn fetch_block(&self, number: u64) -> Result<Block, FetchError> {
        let what = format!("eth_getBlockByNumber({})", number);
        self.retry
            .run(&what, move || self.block_once(number))
            .await
    }

    async fn call(&self, params: &[(&str, String)]) -> Result<Value, FetchError> {
        let body = self.transport.get(params).await?;
        Ok(into_result(body)?)
    }

    async fn head_once(&self) -> Result<u64, FetchError> {
        let params = [
            ("module", "proxy".to_string()),
            ("action", "eth_blockNumber".to_string()),
        ];
        let result = self.call(&params).await?;

        let raw = result
            .as_str()
            .ok_or_else(|| FetchError::InvalidHeadResponse(result.to_string()))?;
        let head =
            parse_hex_u64(raw).ok_or_else(|| FetchError::InvalidHeadResponse(raw.to_string()))?;

        debug!("Got latest block number: {}", head);
        Ok(head)
    }

    async fn block_once(&self, number: u64) -> Result<Block, FetchError> {
        let params = [
            ("module", "proxy".to_string()),
            ("action", "eth_getBlockByNumber".to_string()),
            ("tag", format!("0x{:x}", number)),
            ("boolean", "true".to_string()),
        ];
        let result = self.call(&params).await?;

        let empty = match &result {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if empty {
            return Err(FetchError::BlockNotFound(number));
        }

        let raw: RawBlock =
            serde_json::from_value(result).map_err(|e| FetchError::InvalidBlockResponse {
                number,
                reason: e.to_string(),
            })?;

        debug!("Block {}: {} transactions", number, raw.transactions.len());
        Ok(Block {
            number,
            transactions: raw.transactions,
        })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use serde_json::json;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory chain answering the two proxy actions.
    pub struct FakeChain {
        head: Result<Value, TransportError>,
        blocks: HashMap<u64, Vec<Value>>,
        broken: HashSet<u64>,
        delays: HashMap<u64, Duration>,
        calls: AtomicUsize,
    }

    impl FakeChain {
        pub fn new(head: u64) -> Self {
            Self {
                head: Ok(json!(format!("0x{:x}", head))),
                blocks: HashMap::new(),
                broken: HashSet::new(),
                delays: HashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_block(mut self, number: u64, txs: Vec<Value>) -> Self {
            self.blocks.insert(number, txs);
            self
        }

        pub fn with_broken_block(mut self, number: u64) -> Self {
            self.broken.insert(number);
            self
        }

        pub fn with_delay(mut self, number: u64, delay: Duration) -> Self {
            self.delays.insert(number, delay);
            self
        }

        pub fn with_head_result(mut self, result: Value) -> Self {
            self.head = Ok(result);
            self
        }

        pub fn with_head_error(mut self, err: TransportError) -> Self {
            self.head = Err(err);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    pub fn tx(from: &str, to: Option<&str>, value: &str) -> Value {
        json!({ "from": from, "to": to, "value": value, "hash": "0x00" })
    }

    fn param<'a>(params: &'a [(&str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[async_trait]
    impl Transport for FakeChain {
        async fn get(&self, params: &[(&str, String)]) -> Result<Value, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match param(params, "action") {
                Some("eth_blockNumber") => {
                    let result = self.head.clone()?;
                    Ok(json!({ "jsonrpc": "2.0", "id": 83, "result": result }))
                }
                Some("eth_getBlockByNumber") => {
                    let number = param(params, "tag")
                        .and_then(parse_hex_u64)
                        .ok_or_else(|| TransportError::Status(400))?;
                    if let Some(delay) = self.delays.get(&number) {
                        tokio::time::sleep(*delay).await;
                    }
                    if self.broken.contains(&number) {
                        return Err(TransportError::Network("connection reset".into()));
                    }
                    let result = match self.blocks.get(&number) {
                        Some(txs) => json!({
                            "number": format!("0x{:x}", number),
                            "transactions": txs,
                        }),
                        None => Value::Null,
                    };
                    Ok(json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
                }
                _ => Err(TransportError::Status(400)),
            }
        }
    }
}
