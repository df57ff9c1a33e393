//! Heuristic suspicion scoring for individual holders.
//!
//! Five rules, any one of which flags a wallet: cluster membership, low
//! lifetime transaction count, a balance with zero recorded buys, selling
//! more than was bought, and a balance that does not match the buy history
//! despite zero sells. All pure functions over the holder snapshot.

use crate::types::{Cluster, Holder, HolderSummary};
use std::collections::HashSet;

/// Wallets below this lifetime transaction count are considered fresh.
pub const FRESH_TX_THRESHOLD: u32 = 10;

/// Very low transaction count suggests a recently created (sybil) wallet.
pub fn is_fresh(holder: &Holder) -> bool {
    holder.tx_count() < FRESH_TX_THRESHOLD
}

/// Holds tokens without a single recorded buy: airdropped or transferred
/// in from elsewhere.
pub fn has_phantom_holding(holder: &Holder) -> bool {
    holder.buys() == 0 && holder.holding_pct > 0.0
}

/// Sold more of the supply than it ever bought.
pub fn sold_more_than_bought(holder: &Holder) -> bool {
    holder.sold_pct() > holder.bought_pct()
}

/// Balance diverges from the buy history with no sells to explain it.
pub fn unexplained_balance_gap(holder: &Holder) -> bool {
    holder.bought_pct() != holder.holding_pct && holder.sells() == 0
}

/// Whether a holder matches any suspicion rule.
pub fn is_suspicious(holder: &Holder, clusters: &[Cluster]) -> bool {
    let bundled = clusters
        .iter()
        .any(|c| c.recipients.iter().any(|r| r == &holder.address));

    bundled
        || is_fresh(holder)
        || has_phantom_holding(holder)
        || sold_more_than_bought(holder)
        || unexplained_balance_gap(holder)
}

/// Aggregate counters over the top-N holder slice, single pass.
pub fn summarize(holders: &[Holder], clusters: &[Cluster]) -> HolderSummary {
    let bundled: HashSet<&str> = clusters
        .iter()
        .flat_map(|c| c.recipients.iter().map(String::as_str))
        .collect();

    let mut summary = HolderSummary {
        total_holders: holders.len(),
        ..Default::default()
    };

    for holder in holders {
        let in_cluster = bundled.contains(holder.address.as_str());
        let fresh = is_fresh(holder);

        if holder.sells() > 0 {
            summary.sold_any += 1;
        }
        if has_phantom_holding(holder) {
            summary.zero_buys += 1;
        }
        if in_cluster {
            summary.bundled += 1;
            if fresh {
                summary.bundled_fresh += 1;
            }
        } else if fresh {
            summary.fresh_not_bundled += 1;
        }
        if in_cluster
            || fresh
            || has_phantom_holding(holder)
            || sold_more_than_bought(holder)
            || unexplained_balance_gap(holder)
        {
            summary.suspicious += 1;
        }
        summary.top_holding_pct += holder.holding_pct;
    }

    summary
}
