//! End-to-end analysis pipeline.
//!
//! Supply, then holders, then activity, then the funding graph, clusters
//! and summary, all through the injected data source. Missing data degrades
//! each stage to an empty or default result; the pipeline itself never
//! fails.

use crate::analyzer::clustering::{compute_clusters, ClusterConfig};
use crate::analyzer::funding_graph::{FundingGraphBuilder, FundingGraphConfig};
use crate::analyzer::holder_fetcher::{HolderFetchConfig, HolderFetcher};
use crate::analyzer::suspicion::summarize;
use crate::data_source::LedgerDataSource;
use crate::types::{round_pct, AnalysisMode, AnalysisReport, ReportMetadata};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Pipeline configuration, one section per stage.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    pub fetch: HolderFetchConfig,
    pub funding: FundingGraphConfig,
    pub cluster: ClusterConfig,
}

/// Runs the full holder-cluster analysis for one token.
pub struct ClusterAnalyzer {
    source: Arc<dyn LedgerDataSource>,
    fetcher: HolderFetcher,
    graph_builder: FundingGraphBuilder,
    cluster_config: ClusterConfig,
}

impl ClusterAnalyzer {
    pub fn new(source: Arc<dyn LedgerDataSource>, config: AnalyzerConfig) -> Self {
        let fetcher = HolderFetcher::new(source.clone(), config.fetch);
        let graph_builder = FundingGraphBuilder::new(source.clone(), config.funding);

        Self {
            source,
            fetcher,
            graph_builder,
            cluster_config: config.cluster,
        }
    }

    /// Run the pipeline and assemble a report. Worst case is an empty or
    /// partially populated report, never an error.
    #[instrument(skip(self))]
    pub async fn analyze(&self, token: &str, mode: AnalysisMode) -> AnalysisReport {
        let started = Instant::now();
        // Drain any stale counter residue so this run's accounting is clean.
        let _ = self.source.take_call_count();

        let supply = self.fetcher.fetch_supply(token).await;
        let holders = self
            .fetcher
            .fetch_top_holders(token, mode.max_holders(), supply)
            .await;
        let holders = self.fetcher.enrich_with_activity(holders, token).await;

        let graph = self.graph_builder.build(&holders).await;
        let clusters = compute_clusters(&holders, &graph, &self.cluster_config);
        let summary = summarize(&holders, &clusters);

        let mut report = AnalysisReport {
            token: token.to_string(),
            mode,
            supply,
            holders,
            clusters,
            summary,
            metadata: ReportMetadata {
                calls_used: self.source.take_call_count(),
                analysis_ms: started.elapsed().as_millis() as u64,
                queue_wait_ms: 0,
            },
            generated_at: Utc::now(),
        };
        round_report(&mut report);

        info!(
            "Analysis of {} ({}): {} holders, {} clusters, {} suspicious, {} calls, {}ms",
            token,
            mode,
            report.holders.len(),
            report.clusters.len(),
            report.summary.suspicious,
            report.metadata.calls_used,
            report.metadata.analysis_ms,
        );
        report
    }
}

/// Round every rendered percentage to two decimals. Scoring runs on the raw
/// values before this.
fn round_report(report: &mut AnalysisReport) {
    for holder in &mut report.holders {
        holder.holding_pct = round_pct(holder.holding_pct);
        if let Some(activity) = &mut holder.activity {
            activity.bought_pct = round_pct(activity.bought_pct);
            activity.sold_pct = round_pct(activity.sold_pct);
        }
    }
    for cluster in &mut report.clusters {
        cluster.total_holding_pct = round_pct(cluster.total_holding_pct);
    }
    report.summary.top_holding_pct = round_pct(report.summary.top_holding_pct);
}
