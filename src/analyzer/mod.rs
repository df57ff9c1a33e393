//! Holder analysis: fetch, funding graph, clusters, suspicion scoring.
//!
//! The stages compose into [`ClusterAnalyzer`], the one entry point the
//! orchestrator admits requests into.

pub mod clustering;
pub mod funding_graph;
pub mod holder_fetcher;
pub mod pipeline;
pub mod report_cache;
pub mod suspicion;

pub use clustering::{compute_clusters, ClusterConfig};
pub use funding_graph::{
    FundingGraph, FundingGraphBuilder, FundingGraphConfig, DEFAULT_EXCLUDED_SENDERS,
};
pub use holder_fetcher::{HolderFetchConfig, HolderFetcher, DEFAULT_BONDING_CURVE_ADDRESS};
pub use pipeline::{AnalyzerConfig, ClusterAnalyzer};
pub use report_cache::{CacheMetricsSnapshot, ReportCache};
pub use suspicion::{is_suspicious, summarize, FRESH_TX_THRESHOLD};
