//! Shared mock ledger provider for integration tests.

use async_trait::async_trait;
use chrono::DateTime;
use clusterscan::data_source::{LedgerDataSource, RawHolder};
use clusterscan::types::{Transfer, WalletActivity};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Scripted provider: every fetch counts against the call counter exactly
/// like the real gateway.
pub struct MockLedger {
    holders: Vec<RawHolder>,
    supply: Option<f64>,
    activities: HashMap<String, WalletActivity>,
    transfers: HashMap<String, Vec<Transfer>>,
    calls: AtomicU64,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            holders: Vec::new(),
            supply: Some(1e9),
            activities: HashMap::new(),
            transfers: HashMap::new(),
            calls: AtomicU64::new(0),
        }
    }

    pub fn with_holder(mut self, address: &str, amount: u64) -> Self {
        self.holders.push(RawHolder {
            owner: address.to_string(),
            amount,
            decimals: 6,
        });
        self
    }

    pub fn with_supply(mut self, supply: f64) -> Self {
        self.supply = Some(supply);
        self
    }

    /// Make the supply call fail outright.
    pub fn without_supply(mut self) -> Self {
        self.supply = None;
        self
    }

    pub fn with_activity(mut self, wallet: &str, activity: WalletActivity) -> Self {
        self.activities.insert(wallet.to_string(), activity);
        self
    }

    /// Record one qualifying native transfer `funder -> recipient`.
    pub fn funded_by(mut self, funder: &str, recipient: &str, amount: f64) -> Self {
        self.transfers
            .entry(recipient.to_string())
            .or_default()
            .push(Transfer {
                from: funder.to_string(),
                to: recipient.to_string(),
                amount,
                timestamp: DateTime::UNIX_EPOCH,
            });
        self
    }
}

pub fn activity(buys: u32, sells: u32, bought_pct: f64, sold_pct: f64, tx_count: u32) -> WalletActivity {
    WalletActivity {
        buys,
        sells,
        bought_pct,
        sold_pct,
        tx_count,
        last_sell_time: None,
    }
}

#[async_trait]
impl LedgerDataSource for MockLedger {
    async fn holders_page(
        &self,
        _token: &str,
        page: usize,
        page_size: usize,
    ) -> Option<Vec<RawHolder>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let start = page * page_size;
        if start >= self.holders.len() {
            return Some(Vec::new());
        }
        let end = (start + page_size).min(self.holders.len());
        Some(self.holders[start..end].to_vec())
    }

    async fn token_supply(&self, _token: &str) -> Option<f64> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.supply
    }

    async fn wallet_activity(&self, _token: &str, wallet: &str) -> Option<WalletActivity> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.activities.get(wallet).cloned()
    }

    async fn incoming_transfers(&self, wallet: &str, min_amount: f64) -> Option<Vec<Transfer>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Some(
            self.transfers
                .get(wallet)
                .map(|transfers| {
                    transfers
                        .iter()
                        .filter(|t| t.amount >= min_amount)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
        )
    }

    fn take_call_count(&self) -> u64 {
        self.calls.swap(0, Ordering::Relaxed)
    }
}
