//! Typed access to the ledger-data provider.
//!
//! [`LedgerDataSource`] is the seam between the analysis pipeline and the
//! outside world; [`RestLedgerSource`] implements it over the [`ApiGateway`].
//! Transport failures surface as `None`; a response that arrived but is
//! missing expected fields degrades to an empty collection or default value
//! instead.

use crate::gateway::ApiGateway;
use crate::types::{Address, Transfer, WalletActivity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Raw holder row from the provider's largest-accounts listing.
#[derive(Debug, Clone)]
pub struct RawHolder {
    pub owner: Address,
    /// Balance in base units.
    pub amount: u64,
    pub decimals: u8,
}

/// Read-only view of the ledger-data provider.
#[async_trait]
pub trait LedgerDataSource: Send + Sync {
    /// One page of the token's largest holders, provider rank order.
    /// `None` means the call itself failed.
    async fn holders_page(
        &self,
        token: &str,
        page: usize,
        page_size: usize,
    ) -> Option<Vec<RawHolder>>;

    /// Total token supply in base units.
    async fn token_supply(&self, token: &str) -> Option<f64>;

    /// Swap activity of one wallet in the given token.
    async fn wallet_activity(&self, token: &str, wallet: &str) -> Option<WalletActivity>;

    /// Inbound native-currency transfers to `wallet` at or above
    /// `min_amount` native units.
    async fn incoming_transfers(&self, wallet: &str, min_amount: f64) -> Option<Vec<Transfer>>;

    /// Provider calls consumed since the last read. Resets on read.
    fn take_call_count(&self) -> u64;
}

/// Unwrap the provider's response envelope.
///
/// REST responses arrive as `{"success": bool, "data": ...}`, JSON-RPC
/// responses as `{"result": {"value": ...}}`. Anything else is a shape
/// failure.
pub(crate) fn unwrap_envelope(body: Value) -> Option<Value> {
    let Value::Object(mut map) = body else {
        return None;
    };

    if let Some(data) = map.remove("data") {
        if map.get("success").and_then(Value::as_bool).unwrap_or(true) {
            return Some(data);
        }
        return None;
    }

    if let Some(Value::Object(mut result)) = map.remove("result") {
        if let Some(value) = result.remove("value") {
            return Some(value);
        }
        return Some(Value::Object(result));
    }

    None
}

fn field_u64(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn field_f64(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn field_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn field_timestamp(value: &Value, key: &str) -> Option<DateTime<Utc>> {
    let secs = field_u64(value, key)?;
    DateTime::from_timestamp(secs as i64, 0)
}

fn parse_holder(item: &Value) -> Option<RawHolder> {
    // Providers disagree on the owner field name.
    let owner = field_str(item, "owner").or_else(|| field_str(item, "address"))?;
    let amount = field_u64(item, "amount")?;
    let decimals = field_u64(item, "decimals").unwrap_or(0) as u8;

    Some(RawHolder {
        owner,
        amount,
        decimals,
    })
}

fn parse_transfer(item: &Value) -> Option<Transfer> {
    let from = field_str(item, "from")?;
    let to = field_str(item, "to")?;
    let amount = field_f64(item, "amount")?;
    let timestamp = field_timestamp(item, "block_time").unwrap_or(DateTime::UNIX_EPOCH);

    Some(Transfer {
        from,
        to,
        amount,
        timestamp,
    })
}

/// REST + JSON-RPC implementation over the key-rotating gateway.
pub struct RestLedgerSource {
    gateway: Arc<ApiGateway>,
}

impl RestLedgerSource {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl LedgerDataSource for RestLedgerSource {
    async fn holders_page(
        &self,
        token: &str,
        page: usize,
        page_size: usize,
    ) -> Option<Vec<RawHolder>> {
        let body = self
            .gateway
            .get(
                "token/holders",
                &[
                    ("address", token.to_string()),
                    ("page", (page + 1).to_string()),
                    ("page_size", page_size.to_string()),
                ],
            )
            .await?;

        let data = unwrap_envelope(body)?;
        let items = data
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        debug!("Holders page {} for {}: {} rows", page, token, items.len());
        Some(items.iter().filter_map(parse_holder).collect())
    }

    async fn token_supply(&self, token: &str) -> Option<f64> {
        let body = self
            .gateway
            .rpc("getTokenSupply", serde_json::json!([token]))
            .await?;
        let value = unwrap_envelope(body)?;
        field_f64(&value, "amount")
    }

    async fn wallet_activity(&self, token: &str, wallet: &str) -> Option<WalletActivity> {
        let body = self
            .gateway
            .get(
                "token/trader",
                &[
                    ("address", token.to_string()),
                    ("wallet", wallet.to_string()),
                ],
            )
            .await?;

        let data = unwrap_envelope(body)?;
        Some(WalletActivity {
            buys: field_u64(&data, "buys").unwrap_or(0) as u32,
            sells: field_u64(&data, "sells").unwrap_or(0) as u32,
            bought_pct: field_f64(&data, "bought_pct").unwrap_or(0.0),
            sold_pct: field_f64(&data, "sold_pct").unwrap_or(0.0),
            tx_count: field_u64(&data, "tx_count").unwrap_or(0) as u32,
            last_sell_time: field_timestamp(&data, "last_sell_time"),
        })
    }

    async fn incoming_transfers(&self, wallet: &str, min_amount: f64) -> Option<Vec<Transfer>> {
        let body = self
            .gateway
            .get(
                "account/transfers",
                &[
                    ("address", wallet.to_string()),
                    ("flow", "in".to_string()),
                    ("min_amount", min_amount.to_string()),
                ],
            )
            .await?;

        let data = unwrap_envelope(body)?;
        let items = data
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Some(items.iter().filter_map(parse_transfer).collect())
    }

    fn take_call_count(&self) -> u64 {
        self.gateway.take_call_count()
    }
}
