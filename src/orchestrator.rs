//! Admission-controlled analysis orchestration.
//!
//! One global FIFO queue feeds a single consumer task; the head is admitted
//! only once the shared call budget covers the request's estimated cost,
//! rechecked on a fixed tick. The estimate is debited in full before the
//! pipeline runs and the unused portion credited back afterwards, so the
//! provider quota holds even under worst-case fan-out. A TTL cache
//! short-circuits repeat requests and a per-caller cooldown throttles
//! individual chatters independently of the global budget.

use crate::analyzer::{ClusterAnalyzer, ReportCache};
use crate::budget::{BudgetConfig, CallBudget, CooldownRegistry};
use crate::types::{AnalysisMode, AnalysisReport};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Fixed call overhead of a run on top of the per-holder lookups.
pub const BASE_CALL_OVERHEAD: f64 = 30.0;

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
    /// Minimum spacing between enqueues from one caller.
    pub cooldown: Duration,
    /// How often the consumer rechecks the budget for the queue head.
    pub admission_recheck: Duration,
    /// Maximum queued requests before callers are turned away.
    pub queue_depth: usize,
    pub budget: BudgetConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 512,
            cache_ttl_secs: 25,
            cooldown: Duration::from_secs(5),
            admission_recheck: Duration::from_millis(500),
            queue_depth: 64,
            budget: BudgetConfig::default(),
        }
    }
}

/// Lifecycle of one analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Queued,
    Admitted,
    Running,
    Done,
    /// Served from cache without touching the queue or budget.
    Cached,
}

/// Why a request was turned away before enqueueing.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("caller is cooling down, retry in {0:?}")]
    CooldownActive(Duration),
    #[error("analysis queue is full")]
    QueueFull,
    #[error("analysis queue is shut down")]
    QueueClosed,
}

/// A report plus how it was produced.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: Arc<AnalysisReport>,
    pub state: RequestState,
}

struct QueuedRequest {
    token: String,
    mode: AnalysisMode,
    enqueued_at: Instant,
    reply: oneshot::Sender<AnalysisOutcome>,
}

/// Front door for all analysis requests.
pub struct AnalysisOrchestrator {
    queue: mpsc::Sender<QueuedRequest>,
    cache: ReportCache,
    budget: Arc<CallBudget>,
    cooldowns: CooldownRegistry,
}

impl AnalysisOrchestrator {
    /// Spawn the consumer task and return the shared front door.
    pub fn new(analyzer: Arc<ClusterAnalyzer>, config: OrchestratorConfig) -> Arc<Self> {
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_depth.max(1));
        let cache = ReportCache::new(config.cache_capacity, config.cache_ttl_secs);
        let budget = Arc::new(CallBudget::new(config.budget.clone()));

        tokio::spawn(consume(
            queue_rx,
            analyzer,
            budget.clone(),
            cache.clone(),
            config.admission_recheck,
        ));

        Arc::new(Self {
            queue: queue_tx,
            cache,
            budget,
            cooldowns: CooldownRegistry::new(config.cooldown),
        })
    }

    /// Analyze `token` on behalf of `caller`.
    ///
    /// A fresh cached report returns immediately and charges nothing, no
    /// budget and no cooldown. Otherwise the request joins the global queue
    /// and this future resolves when its turn completes.
    pub async fn request_analysis(
        &self,
        caller: &str,
        token: &str,
        mode: AnalysisMode,
    ) -> Result<AnalysisOutcome, OrchestratorError> {
        if let Some(report) = self.cache.get(token, mode).await {
            debug!("Serving {} ({}) from cache", token, mode);
            return Ok(AnalysisOutcome {
                report,
                state: RequestState::Cached,
            });
        }

        self.cooldowns
            .check_and_touch(caller)
            .await
            .map_err(OrchestratorError::CooldownActive)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        let request = QueuedRequest {
            token: token.to_string(),
            mode,
            enqueued_at: Instant::now(),
            reply: reply_tx,
        };

        self.queue.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => OrchestratorError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => OrchestratorError::QueueClosed,
        })?;
        debug!("Queued {} ({}) for {}", token, mode, caller);

        reply_rx.await.map_err(|_| OrchestratorError::QueueClosed)
    }

    /// Upfront estimate for one run: supply + holder pages are a rounding
    /// error next to the three per-holder lookups, covered by the overhead.
    pub fn estimated_cost(mode: AnalysisMode) -> f64 {
        3.0 * mode.max_holders() as f64 + BASE_CALL_OVERHEAD
    }

    /// Current budget balance.
    pub async fn budget_available(&self) -> f64 {
        self.budget.available().await
    }

    pub fn cache(&self) -> &ReportCache {
        &self.cache
    }

    /// Drop stale cooldown entries; call periodically.
    pub async fn cleanup_cooldowns(&self) {
        self.cooldowns.cleanup_stale().await;
    }
}

/// Single consumer: strict FIFO, at most one request past admission at a
/// time.
async fn consume(
    mut queue: mpsc::Receiver<QueuedRequest>,
    analyzer: Arc<ClusterAnalyzer>,
    budget: Arc<CallBudget>,
    cache: ReportCache,
    recheck: Duration,
) {
    while let Some(request) = queue.recv().await {
        let cost = AnalysisOrchestrator::estimated_cost(request.mode);

        // QUEUED: hold the head until the budget covers the estimate.
        let mut tick = tokio::time::interval(recheck.max(Duration::from_millis(1)));
        loop {
            tick.tick().await;
            if budget.try_debit(cost).await {
                break;
            }
            debug!(
                "Budget short of {:.0} calls, holding {} at queue head",
                cost, request.token
            );
        }

        // ADMITTED: an identical request may have landed in the cache while
        // this one waited; serving it refunds the debit untouched.
        if let Some(report) = cache.get(&request.token, request.mode).await {
            budget.credit(cost).await;
            let _ = request.reply.send(AnalysisOutcome {
                report,
                state: RequestState::Cached,
            });
            continue;
        }

        // RUNNING
        let queue_wait_ms = request.enqueued_at.elapsed().as_millis() as u64;
        info!(
            "Admitted {} ({}) after {}ms in queue",
            request.token, request.mode, queue_wait_ms
        );

        let mut report = analyzer.analyze(&request.token, request.mode).await;
        report.metadata.queue_wait_ms = queue_wait_ms;

        let actual = report.metadata.calls_used as f64;
        if actual > cost {
            warn!(
                "Run for {} used {:.0} calls against an estimate of {:.0}",
                request.token, actual, cost
            );
        } else {
            budget.credit(cost - actual).await;
        }

        let report = Arc::new(report);
        cache.set(report.clone()).await;

        // DONE
        let _ = request.reply.send(AnalysisOutcome {
            report,
            state: RequestState::Done,
        });
    }
}
