//! Cluster aggregation over the resolved funding graph.
//!
//! Groups recipients by funder and sums their holding percentages. Clusters
//! of one carry no signal and are dropped; the output is sorted descending
//! by combined holding, and downstream rendering relies on `clusters[0]`
//! being the largest.

use crate::analyzer::funding_graph::FundingGraph;
use crate::types::{Address, Cluster, Holder};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Cluster aggregation configuration.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Minimum recipients for a cluster to be reported.
    pub min_cluster_size: usize,
    /// Funders whose clusters are suppressed regardless of size.
    pub ignored_funders: Vec<Address>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 2,
            ignored_funders: Vec::new(),
        }
    }
}

/// Aggregate the funding graph into ranked clusters.
pub fn compute_clusters(
    holders: &[Holder],
    graph: &FundingGraph,
    config: &ClusterConfig,
) -> Vec<Cluster> {
    let pct_of: HashMap<&str, f64> = holders
        .iter()
        .map(|h| (h.address.as_str(), h.holding_pct))
        .collect();
    let ignored: HashSet<&str> = config.ignored_funders.iter().map(String::as_str).collect();

    let mut clusters = Vec::new();
    for (funder, recipients) in graph.iter() {
        if recipients.len() < config.min_cluster_size.max(2) {
            continue;
        }
        if ignored.contains(funder.as_str()) {
            continue;
        }

        // Recipients without a holder record contribute nothing.
        let total_holding_pct: f64 = recipients
            .iter()
            .filter_map(|r| pct_of.get(r.as_str()))
            .sum();
        if total_holding_pct <= 0.0 {
            continue;
        }

        clusters.push(Cluster {
            funder: funder.clone(),
            recipients: recipients.to_vec(),
            total_holding_pct,
        });
    }

    // Stable: equal totals keep first-seen funder order.
    clusters.sort_by(|a, b| {
        b.total_holding_pct
            .partial_cmp(&a.total_holding_pct)
            .unwrap_or(Ordering::Equal)
    });

    debug!("Aggregated {} clusters", clusters.len());
    clusters
}
