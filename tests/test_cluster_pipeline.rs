//! Integration tests for the full analysis pipeline: holders, funding
//! graph, clusters, suspicion summary, report assembly.

mod common;

use clusterscan::{AnalysisMode, AnalyzerConfig, ClusterAnalyzer};
use common::{activity, MockLedger};
use std::sync::Arc;

fn analyzer(ledger: MockLedger) -> ClusterAnalyzer {
    ClusterAnalyzer::new(Arc::new(ledger), AnalyzerConfig::default())
}

/// Three holders: A and B funded by X, C funded by Y. Y funds only one
/// wallet, so only X forms a cluster.
#[tokio::test]
async fn test_common_funder_forms_single_cluster() {
    let ledger = MockLedger::new()
        .with_supply(1_000_000.0)
        .with_holder("holder_a", 100_000)
        .with_holder("holder_b", 50_000)
        .with_holder("holder_c", 20_000)
        .with_activity("holder_a", activity(2, 0, 10.0, 0.0, 50))
        .with_activity("holder_b", activity(1, 0, 5.0, 0.0, 40))
        .with_activity("holder_c", activity(3, 1, 2.0, 0.5, 60))
        .funded_by("wallet_x", "holder_a", 1.0)
        .funded_by("wallet_x", "holder_b", 1.0)
        .funded_by("wallet_y", "holder_c", 1.0);

    let report = analyzer(ledger)
        .analyze("mint", AnalysisMode::Standard)
        .await;

    assert_eq!(report.clusters.len(), 1);
    let cluster = &report.clusters[0];
    assert_eq!(cluster.funder, "wallet_x");
    assert_eq!(
        cluster.recipients,
        vec!["holder_a".to_string(), "holder_b".to_string()]
    );
    assert_eq!(cluster.total_holding_pct, 15.0);

    // Holder rank order survives the pipeline.
    let addresses: Vec<&str> = report.holders.iter().map(|h| h.address.as_str()).collect();
    assert_eq!(addresses, vec!["holder_a", "holder_b", "holder_c"]);

    assert_eq!(report.summary.bundled, 2);
    assert_eq!(report.summary.total_holders, 3);
}

/// Every recipient lands in at most one cluster even when funders overlap.
#[tokio::test]
async fn test_clusters_partition_holders() {
    let ledger = MockLedger::new()
        .with_supply(1_000_000.0)
        .with_holder("a", 10_000)
        .with_holder("b", 10_000)
        .with_holder("c", 10_000)
        .with_holder("d", 10_000)
        // Both funders touch every holder; repeat transfers decide.
        .funded_by("x", "a", 1.0)
        .funded_by("x", "a", 1.0)
        .funded_by("y", "a", 1.0)
        .funded_by("x", "b", 1.0)
        .funded_by("x", "b", 1.0)
        .funded_by("y", "b", 1.0)
        .funded_by("y", "c", 1.0)
        .funded_by("y", "c", 1.0)
        .funded_by("x", "c", 1.0)
        .funded_by("y", "d", 1.0)
        .funded_by("y", "d", 1.0)
        .funded_by("x", "d", 1.0);

    let report = analyzer(ledger)
        .analyze("mint", AnalysisMode::Standard)
        .await;

    assert_eq!(report.clusters.len(), 2);
    let mut seen = std::collections::HashSet::new();
    for cluster in &report.clusters {
        assert!(cluster.recipients.len() > 1);
        for recipient in &cluster.recipients {
            assert!(
                seen.insert(recipient.clone()),
                "{} appears in two clusters",
                recipient
            );
        }
    }
    assert_eq!(seen.len(), 4);
}

/// Supply fetch fails: percentages are computed against the fallback
/// constant instead of dividing by zero.
#[tokio::test]
async fn test_supply_failure_degrades_to_fallback() {
    let ledger = MockLedger::new()
        .without_supply()
        .with_holder("a", 10_000_000)
        .with_holder("b", 5_000_000);

    let report = analyzer(ledger)
        .analyze("mint", AnalysisMode::Standard)
        .await;

    assert!(report.supply.is_fallback());
    assert_eq!(report.holders.len(), 2);
    for holder in &report.holders {
        assert!(holder.holding_pct.is_finite());
    }
    // 10M of the 1e9 fallback supply.
    assert_eq!(report.holders[0].holding_pct, 1.0);
    assert_eq!(report.holders[1].holding_pct, 0.5);
}

/// Low transaction counts flag every holder, cluster membership or not.
#[tokio::test]
async fn test_fresh_wallets_all_flagged() {
    let ledger = MockLedger::new()
        .with_supply(1_000_000.0)
        .with_holder("a", 10_000)
        .with_holder("b", 10_000)
        .with_holder("c", 10_000)
        .with_activity("a", activity(1, 0, 1.0, 0.0, 5))
        .with_activity("b", activity(1, 0, 1.0, 0.0, 5))
        .with_activity("c", activity(1, 0, 1.0, 0.0, 5));

    let report = analyzer(ledger)
        .analyze("mint", AnalysisMode::Standard)
        .await;

    assert!(report.clusters.is_empty());
    assert_eq!(report.summary.suspicious, 3);
    assert_eq!(report.summary.fresh_not_bundled, 3);
}

/// A holder whose activity fetch fails stays in the report with zeroed
/// counters instead of disappearing.
#[tokio::test]
async fn test_partial_activity_keeps_holder() {
    let ledger = MockLedger::new()
        .with_supply(1_000_000.0)
        .with_holder("a", 10_000)
        .with_holder("b", 10_000)
        .with_activity("a", activity(2, 1, 1.0, 0.2, 30));

    let report = analyzer(ledger)
        .analyze("mint", AnalysisMode::Standard)
        .await;

    assert_eq!(report.holders.len(), 2);
    assert_eq!(report.summary.total_holders, 2);
    let b = &report.holders[1];
    assert_eq!(b.address, "b");
    assert!(b.activity.is_none());
    assert_eq!(b.buys(), 0);
}

/// Empty provider data produces an empty report, not an error.
#[tokio::test]
async fn test_empty_token_degrades_gracefully() {
    let ledger = MockLedger::new().without_supply();

    let report = analyzer(ledger)
        .analyze("mint", AnalysisMode::Standard)
        .await;

    assert!(report.holders.is_empty());
    assert!(report.clusters.is_empty());
    assert_eq!(report.summary.total_holders, 0);
    assert_eq!(report.summary.top_holding_pct, 0.0);
}

/// Call accounting covers every provider round trip of the run.
#[tokio::test]
async fn test_call_accounting() {
    let ledger = MockLedger::new()
        .with_supply(1_000_000.0)
        .with_holder("a", 10_000)
        .with_holder("b", 10_000)
        .with_holder("c", 10_000);

    let report = analyzer(ledger)
        .analyze("mint", AnalysisMode::Standard)
        .await;

    // 1 supply + 2 holder pages + 3 activity + 3 transfer lookups.
    assert_eq!(report.metadata.calls_used, 9);
}

/// Deep mode widens the holder slice.
#[tokio::test]
async fn test_deep_mode_scans_more_holders() {
    let mut ledger = MockLedger::new().with_supply(1_000_000_000.0);
    for i in 0..60 {
        ledger = ledger.with_holder(&format!("w{:02}", i), 1_000_000 - i as u64);
    }

    let report = analyzer(ledger).analyze("mint", AnalysisMode::Deep).await;

    assert_eq!(report.holders.len(), 50);
    assert_eq!(report.mode, AnalysisMode::Deep);
}
