//! Core domain types shared across the analysis pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wallet address on the ledger. Kept as a plain string: the engine never
/// signs or derives keys, it only compares and groups addresses.
pub type Address = String;

/// Supply assumed when the provider cannot report one. Keeps every holding
/// percentage finite; the resulting numbers are conservative, not exact.
pub const DEFAULT_SUPPLY_BASE_UNITS: f64 = 1e9;

/// Where a supply figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplySource {
    /// Reported by the ledger-data provider.
    Reported,
    /// Provider call failed; the default constant was substituted.
    Fallback,
}

/// Token supply snapshot used to derive holding percentages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Supply {
    /// Total supply in base units (pre-decimals).
    pub base_units: f64,
    pub source: SupplySource,
}

impl Supply {
    pub fn reported(base_units: f64) -> Self {
        Self {
            base_units,
            source: SupplySource::Reported,
        }
    }

    pub fn fallback() -> Self {
        Self {
            base_units: DEFAULT_SUPPLY_BASE_UNITS,
            source: SupplySource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == SupplySource::Fallback
    }
}

/// Swap activity observed for one holder wallet in the analyzed token.
///
/// Absent entirely (`Holder::activity == None`) when the activity fetch
/// failed; the holder is still reported with zeroed counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletActivity {
    pub buys: u32,
    pub sells: u32,
    /// Percentage of supply this wallet bought over its lifetime.
    pub bought_pct: f64,
    /// Percentage of supply this wallet sold over its lifetime.
    pub sold_pct: f64,
    /// Total transaction count for the wallet, all programs included.
    pub tx_count: u32,
    pub last_sell_time: Option<DateTime<Utc>>,
}

/// One of the token's top holders at analysis time.
///
/// Immutable once computed for a given snapshot; holding percentages are
/// derived from `raw_amount / supply` and recomputed whenever the supply is
/// refreshed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holder {
    pub address: Address,
    /// Balance in base units.
    pub raw_amount: u64,
    pub decimals: u8,
    /// Share of total supply, 0-100.
    pub holding_pct: f64,
    pub activity: Option<WalletActivity>,
}

impl Holder {
    pub fn buys(&self) -> u32 {
        self.activity.as_ref().map_or(0, |a| a.buys)
    }

    pub fn sells(&self) -> u32 {
        self.activity.as_ref().map_or(0, |a| a.sells)
    }

    pub fn bought_pct(&self) -> f64 {
        self.activity.as_ref().map_or(0.0, |a| a.bought_pct)
    }

    pub fn sold_pct(&self) -> f64 {
        self.activity.as_ref().map_or(0.0, |a| a.sold_pct)
    }

    pub fn tx_count(&self) -> u32 {
        self.activity.as_ref().map_or(0, |a| a.tx_count)
    }
}

/// Native-currency transfer into a holder wallet. Build-time input for the
/// funding graph, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    /// Amount in native units (e.g. SOL).
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// Holders attributed to a single funding wallet.
///
/// Rebuilt from scratch every run. Always `recipients.len() > 1` and the
/// funder is never one of the excluded infrastructure addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub funder: Address,
    pub recipients: Vec<Address>,
    /// Combined share of supply held by the recipients, 0-100.
    pub total_holding_pct: f64,
}

/// Aggregate counters over the top-N holder slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolderSummary {
    pub total_holders: usize,
    /// Holders matching at least one suspicion rule.
    pub suspicious: usize,
    /// Holders that sold at least once.
    pub sold_any: usize,
    /// Holders with zero recorded buys but a nonzero balance.
    pub zero_buys: usize,
    /// Holders that belong to a funding cluster.
    pub bundled: usize,
    /// Bundled holders that are also fresh wallets.
    pub bundled_fresh: usize,
    /// Fresh wallets outside any cluster.
    pub fresh_not_bundled: usize,
    /// Combined holding of the whole top-N slice, 0-100.
    pub top_holding_pct: f64,
}

/// Analysis depth requested by the caller. Deep scans more holders and
/// therefore reserves a larger slice of the call budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    Standard,
    Deep,
}

impl AnalysisMode {
    pub fn max_holders(&self) -> usize {
        match self {
            Self::Standard => 20,
            Self::Deep => 50,
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Deep => write!(f, "deep"),
        }
    }
}

/// Timing and accounting stamped on every report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Provider calls consumed by this run.
    pub calls_used: u64,
    pub analysis_ms: u64,
    pub queue_wait_ms: u64,
}

/// Complete result of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub token: Address,
    pub mode: AnalysisMode,
    pub supply: Supply,
    /// Top holders in provider rank order.
    pub holders: Vec<Holder>,
    /// Funding clusters, largest combined holding first.
    pub clusters: Vec<Cluster>,
    pub summary: HolderSummary,
    pub metadata: ReportMetadata,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    /// Cache key: token address and mode flag, string-concatenated.
    pub fn cache_key(token: &str, mode: AnalysisMode) -> String {
        format!("{}_{}", token, mode)
    }
}

/// Round a percentage for rendering: two decimals, never NaN or infinite.
pub fn round_pct(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        0.0
    }
}
