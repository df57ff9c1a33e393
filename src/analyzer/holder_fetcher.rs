//! Top-holder retrieval and activity enrichment.
//!
//! Pages of the holder list are fetched concurrently and flattened in rank
//! order; swap activity is merged per holder with bounded concurrency. A
//! holder whose activity fetch fails keeps its place in the list with
//! `activity: None`; identity is preserved, activity is best-effort.

use crate::data_source::LedgerDataSource;
use crate::types::{Address, Holder, Supply};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

/// Pump.fun bonding-curve program; shows up in every holder list and is
/// never a real holder.
pub const DEFAULT_BONDING_CURVE_ADDRESS: &str = "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P";

/// Holder fetch configuration.
#[derive(Debug, Clone)]
pub struct HolderFetchConfig {
    /// Holders per page request.
    pub page_size: usize,
    /// Concurrent activity lookups.
    pub activity_concurrency: usize,
    /// Program address filtered out of the holder list.
    pub bonding_curve_address: Address,
}

impl Default for HolderFetchConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            activity_concurrency: 10,
            bonding_curve_address: DEFAULT_BONDING_CURVE_ADDRESS.to_string(),
        }
    }
}

/// Fetches a token's top holders and their swap activity.
pub struct HolderFetcher {
    source: Arc<dyn LedgerDataSource>,
    config: HolderFetchConfig,
}

impl HolderFetcher {
    pub fn new(source: Arc<dyn LedgerDataSource>, config: HolderFetchConfig) -> Self {
        Self { source, config }
    }

    /// Fetch the token supply. A failed or nonsensical response falls back
    /// to the conservative default so downstream divisions stay finite.
    pub async fn fetch_supply(&self, token: &str) -> Supply {
        match self.source.token_supply(token).await {
            Some(base_units) if base_units > 0.0 => Supply::reported(base_units),
            _ => {
                warn!("Supply unavailable for {}, using fallback", token);
                Supply::fallback()
            }
        }
    }

    /// Top `max_holders` holders in provider rank order. All pages are
    /// requested concurrently; a failed page contributes nothing.
    pub async fn fetch_top_holders(
        &self,
        token: &str,
        max_holders: usize,
        supply: Supply,
    ) -> Vec<Holder> {
        let page_size = self.config.page_size.max(1);
        let pages = (max_holders + page_size - 1) / page_size;

        let fetches = (0..pages).map(|page| self.source.holders_page(token, page, page_size));
        let results = join_all(fetches).await;

        let mut holders = Vec::with_capacity(max_holders);
        for page in results {
            for raw in page.unwrap_or_default() {
                if raw.owner == self.config.bonding_curve_address {
                    continue;
                }
                let holding_pct = raw.amount as f64 / supply.base_units * 100.0;
                holders.push(Holder {
                    address: raw.owner,
                    raw_amount: raw.amount,
                    decimals: raw.decimals,
                    holding_pct,
                    activity: None,
                });
            }
        }
        holders.truncate(max_holders);

        debug!("Fetched {} holders for {}", holders.len(), token);
        holders
    }

    /// Merge swap activity into each holder, preserving rank order.
    pub async fn enrich_with_activity(&self, holders: Vec<Holder>, token: &str) -> Vec<Holder> {
        let mut enriched: Vec<(usize, Holder)> = stream::iter(holders.into_iter().enumerate())
            .map(|(rank, mut holder)| {
                let source = self.source.clone();
                let token = token.to_string();
                async move {
                    holder.activity = source.wallet_activity(&token, &holder.address).await;
                    if holder.activity.is_none() {
                        warn!("No activity data for {}", holder.address);
                    }
                    (rank, holder)
                }
            })
            .buffer_unordered(self.config.activity_concurrency.max(1))
            .collect()
            .await;

        enriched.sort_by_key(|(rank, _)| *rank);
        enriched.into_iter().map(|(_, holder)| holder).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::RawHolder;
    use crate::types::{Transfer, WalletActivity};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StubSource {
        holders: Vec<RawHolder>,
        supply: Option<f64>,
        activities: HashMap<String, WalletActivity>,
        fail_page: Option<usize>,
    }

    impl StubSource {
        fn new(holders: Vec<RawHolder>) -> Self {
            Self {
                holders,
                supply: Some(1_000_000.0),
                activities: HashMap::new(),
                fail_page: None,
            }
        }
    }

    fn raw(owner: &str, amount: u64) -> RawHolder {
        RawHolder {
            owner: owner.to_string(),
            amount,
            decimals: 6,
        }
    }

    #[async_trait]
    impl LedgerDataSource for StubSource {
        async fn holders_page(
            &self,
            _token: &str,
            page: usize,
            page_size: usize,
        ) -> Option<Vec<RawHolder>> {
            if self.fail_page == Some(page) {
                return None;
            }
            let start = page * page_size;
            let end = (start + page_size).min(self.holders.len());
            if start >= self.holders.len() {
                return Some(Vec::new());
            }
            Some(self.holders[start..end].to_vec())
        }

        async fn token_supply(&self, _token: &str) -> Option<f64> {
            self.supply
        }

        async fn wallet_activity(&self, _token: &str, wallet: &str) -> Option<WalletActivity> {
            self.activities.get(wallet).cloned()
        }

        async fn incoming_transfers(
            &self,
            _wallet: &str,
            _min_amount: f64,
        ) -> Option<Vec<Transfer>> {
            Some(Vec::new())
        }

        fn take_call_count(&self) -> u64 {
            0
        }
    }

    fn fetcher(source: StubSource) -> HolderFetcher {
        HolderFetcher::new(Arc::new(source), HolderFetchConfig::default())
    }

    #[tokio::test]
    async fn test_fetch_top_holders_preserves_rank_order() {
        let holders: Vec<RawHolder> = (0..25).map(|i| raw(&format!("w{}", i), 100 - i)).collect();
        let fetcher = fetcher(StubSource::new(holders));

        let result = fetcher
            .fetch_top_holders("mint", 25, Supply::reported(1_000_000.0))
            .await;

        assert_eq!(result.len(), 25);
        for (i, holder) in result.iter().enumerate() {
            assert_eq!(holder.address, format!("w{}", i));
        }
    }

    #[tokio::test]
    async fn test_fetch_top_holders_filters_bonding_curve() {
        let holders = vec![
            raw("w0", 500),
            raw(DEFAULT_BONDING_CURVE_ADDRESS, 9_000),
            raw("w1", 300),
        ];
        let fetcher = fetcher(StubSource::new(holders));

        let result = fetcher
            .fetch_top_holders("mint", 10, Supply::reported(1_000_000.0))
            .await;

        assert_eq!(result.len(), 2);
        assert!(result
            .iter()
            .all(|h| h.address != DEFAULT_BONDING_CURVE_ADDRESS));
    }

    #[tokio::test]
    async fn test_fetch_top_holders_survives_failed_page() {
        let holders: Vec<RawHolder> = (0..20).map(|i| raw(&format!("w{}", i), 100)).collect();
        let mut source = StubSource::new(holders);
        source.fail_page = Some(0);
        let fetcher = fetcher(source);

        let result = fetcher
            .fetch_top_holders("mint", 20, Supply::reported(1_000_000.0))
            .await;

        // First page lost, second page still present.
        assert_eq!(result.len(), 10);
        assert_eq!(result[0].address, "w10");
    }

    #[tokio::test]
    async fn test_holding_pct_against_fallback_supply() {
        let fetcher = fetcher(StubSource::new(vec![raw("w0", 10_000_000)]));

        let result = fetcher
            .fetch_top_holders("mint", 10, Supply::fallback())
            .await;

        assert_eq!(result[0].holding_pct, 1.0);
        assert!(result[0].holding_pct.is_finite());
    }

    #[tokio::test]
    async fn test_supply_fallback_on_failure() {
        let mut source = StubSource::new(Vec::new());
        source.supply = None;
        let fetcher = fetcher(source);

        let supply = fetcher.fetch_supply("mint").await;
        assert!(supply.is_fallback());
    }

    #[tokio::test]
    async fn test_supply_fallback_on_zero() {
        let mut source = StubSource::new(Vec::new());
        source.supply = Some(0.0);
        let fetcher = fetcher(source);

        let supply = fetcher.fetch_supply("mint").await;
        assert!(supply.is_fallback());
    }

    #[tokio::test]
    async fn test_enrichment_keeps_holder_on_missing_activity() {
        let mut source = StubSource::new(vec![raw("w0", 100), raw("w1", 50)]);
        source.activities.insert(
            "w0".to_string(),
            WalletActivity {
                buys: 3,
                sells: 1,
                tx_count: 12,
                ..Default::default()
            },
        );
        let fetcher = fetcher(source);

        let holders = fetcher
            .fetch_top_holders("mint", 10, Supply::reported(1_000_000.0))
            .await;
        let enriched = fetcher.enrich_with_activity(holders, "mint").await;

        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].address, "w0");
        assert_eq!(enriched[0].buys(), 3);
        // w1's fetch failed: still present, counters zeroed.
        assert_eq!(enriched[1].address, "w1");
        assert!(enriched[1].activity.is_none());
        assert_eq!(enriched[1].buys(), 0);
    }
}
