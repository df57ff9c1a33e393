//! CLI for the holder-cluster analyzer.
//!
//! Runs a single funding-graph analysis for a token and prints the report
//! as JSON. API keys come from the environment.

use anyhow::{Context, Result};
use clusterscan::{
    AnalysisMode, AnalysisOrchestrator, AnalyzerConfig, ApiGateway, ClusterAnalyzer,
    GatewayConfig, OrchestratorConfig, RestLedgerSource,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        return Ok(());
    }

    let mut token = None;
    let mut mode = AnalysisMode::Standard;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--deep" => mode = AnalysisMode::Deep,
            "help" | "--help" | "-h" => {
                print_usage(&args[0]);
                return Ok(());
            }
            other => token = Some(other.to_string()),
        }
        i += 1;
    }

    let token = token.context("No token address given")?;

    let mut gateway_config = GatewayConfig::default();
    if let Ok(keys) = std::env::var("CLUSTERSCAN_API_KEYS") {
        gateway_config.api_keys = keys
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Ok(url) = std::env::var("CLUSTERSCAN_REST_URL") {
        gateway_config.rest_url = url;
    }
    if let Ok(url) = std::env::var("CLUSTERSCAN_RPC_URL") {
        gateway_config.rpc_url = url;
    }

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;
    let gateway = Arc::new(ApiGateway::new(gateway_config, http));
    let source = Arc::new(RestLedgerSource::new(gateway));
    let analyzer = Arc::new(ClusterAnalyzer::new(source, AnalyzerConfig::default()));
    let orchestrator = AnalysisOrchestrator::new(analyzer, OrchestratorConfig::default());

    let outcome = orchestrator
        .request_analysis("cli", &token, mode)
        .await
        .context("Analysis request rejected")?;

    println!("{}", serde_json::to_string_pretty(&*outcome.report)?);
    Ok(())
}

fn print_usage(program_name: &str) {
    println!("Holder Cluster Analyzer CLI");
    println!();
    println!("Usage: {} <token_mint> [--deep]", program_name);
    println!();
    println!("Options:");
    println!("  --deep    Scan 50 holders instead of 20");
    println!();
    println!("Environment:");
    println!("  CLUSTERSCAN_API_KEYS   Comma-separated provider API keys");
    println!("  CLUSTERSCAN_REST_URL   Override the REST API base URL");
    println!("  CLUSTERSCAN_RPC_URL    Override the JSON-RPC endpoint");
}
