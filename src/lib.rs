//! clusterscan - holder funding-graph and cluster analysis for SPL tokens.
//!
//! Reconstructs who funded a token's top holders from native-transfer
//! history, groups holders that share a funding source into clusters, flags
//! suspicious wallets, and gates the expensive multi-call pipeline behind a
//! TTL cache and a budget-admitted FIFO queue.

pub mod analyzer;
pub mod budget;
pub mod data_source;
pub mod gateway;
pub mod orchestrator;
pub mod types;

// Re-export main types for convenience
pub use analyzer::{AnalyzerConfig, ClusterAnalyzer, ReportCache};
pub use budget::{BudgetConfig, CallBudget, CooldownRegistry};
pub use data_source::{LedgerDataSource, RawHolder, RestLedgerSource};
pub use gateway::{ApiGateway, GatewayConfig};
pub use orchestrator::{
    AnalysisOrchestrator, AnalysisOutcome, OrchestratorConfig, OrchestratorError, RequestState,
};
pub use types::{AnalysisMode, AnalysisReport, Cluster, Holder, HolderSummary, Supply};
