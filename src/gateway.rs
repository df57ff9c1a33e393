//! Rate-limited, multi-key gateway to the ledger-data provider.
//!
//! Every outbound call goes through here: API keys rotate round-robin (one
//! key per call, a pure counter independent of request identity), every
//! failure mode is downgraded to `None`, and a process-wide call counter
//! feeds budget bookkeeping. Retry and fallback policy belong to callers;
//! the gateway itself never retries.

use governor::{
    clock::DefaultClock,
    state::{direct::NotKeyed, InMemoryState},
    Quota, RateLimiter,
};
use reqwest::Client;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the provider's REST holder/activity API.
    pub rest_url: String,
    /// JSON-RPC endpoint for ledger queries.
    pub rpc_url: String,
    /// API keys rotated round-robin across REST calls.
    pub api_keys: Vec<String>,
    /// Outbound requests per second across all callers.
    pub requests_per_second: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            rest_url: "https://pro-api.solscan.io/v2.0".to_string(),
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            api_keys: Vec::new(),
            requests_per_second: 20,
        }
    }
}

/// HTTP gateway with round-robin key rotation and a call counter.
pub struct ApiGateway {
    http: Client,
    config: GatewayConfig,
    /// Next key slot; a plain counter, not tied to request identity.
    key_cursor: AtomicUsize,
    /// Calls made since the counter was last drained.
    call_count: AtomicU64,
    throttle: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl ApiGateway {
    /// Create a gateway over a pre-configured HTTP client. Request timeouts
    /// are the client's responsibility.
    pub fn new(config: GatewayConfig, http: Client) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second.max(1))
                .unwrap_or_else(|| NonZeroU32::new(20).unwrap()),
        );

        Self {
            http,
            config,
            key_cursor: AtomicUsize::new(0),
            call_count: AtomicU64::new(0),
            throttle: Arc::new(RateLimiter::direct(quota)),
        }
    }

    fn next_key(&self) -> Option<&str> {
        if self.config.api_keys.is_empty() {
            return None;
        }
        let idx = self.key_cursor.fetch_add(1, Ordering::Relaxed) % self.config.api_keys.len();
        Some(self.config.api_keys[idx].as_str())
    }

    /// GET against the provider's REST API. `None` on any failure: network
    /// error, non-2xx status, or a body that is not JSON.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Option<Value> {
        self.throttle.until_ready().await;
        self.call_count.fetch_add(1, Ordering::Relaxed);

        let url = format!(
            "{}/{}",
            self.config.rest_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut request = self.http.get(&url).query(query);
        if let Some(key) = self.next_key() {
            request = request.header("token", key);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<Value>().await {
                    Ok(body) => Some(body),
                    Err(e) => {
                        warn!("Malformed body from {}: {}", path, e);
                        None
                    }
                }
            }
            Ok(response) => {
                warn!("Provider returned {} for {}", response.status(), path);
                None
            }
            Err(e) => {
                warn!("Request to {} failed: {}", path, e);
                None
            }
        }
    }

    /// JSON-RPC call against the ledger endpoint. Same failure contract as
    /// [`ApiGateway::get`].
    pub async fn rpc(&self, method: &str, params: Value) -> Option<Value> {
        self.throttle.until_ready().await;
        self.call_count.fetch_add(1, Ordering::Relaxed);

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        debug!("RPC {} -> {}", method, self.config.rpc_url);
        match self.http.post(&self.config.rpc_url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<Value>().await {
                    Ok(body) => Some(body),
                    Err(e) => {
                        warn!("Malformed RPC body for {}: {}", method, e);
                        None
                    }
                }
            }
            Ok(response) => {
                warn!("RPC {} returned {}", method, response.status());
                None
            }
            Err(e) => {
                warn!("RPC {} failed: {}", method, e);
                None
            }
        }
    }

    /// Calls made since the last read. Resets on read.
    pub fn take_call_count(&self) -> u64 {
        self.call_count.swap(0, Ordering::Relaxed)
    }
}
