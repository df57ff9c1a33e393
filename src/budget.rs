//! Shared call budget and per-caller cooldowns.
//!
//! [`CallBudget`] models the provider's per-minute quota as a token bucket:
//! admitted requests debit their full estimated cost upfront and the bucket
//! refills at a fixed rate with one-second granularity. The balance can
//! never go negative: a debit either fits or is rejected whole.
//!
//! [`CooldownRegistry`] independently throttles how often a single caller
//! may enqueue a new request, regardless of global budget state.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Token-bucket configuration.
#[derive(Debug, Clone)]
pub struct BudgetConfig {
    /// Bucket capacity; the provider's per-minute call quota.
    pub max_calls: f64,
    /// Calls restored per second of wall time.
    pub refill_per_second: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_calls: 3000.0,
            refill_per_second: 50.0,
        }
    }
}

struct BudgetState {
    available: f64,
    last_refill: Instant,
}

/// Process-wide call budget shared by all analysis requests.
pub struct CallBudget {
    config: BudgetConfig,
    state: Mutex<BudgetState>,
}

impl CallBudget {
    /// Create a budget starting at full capacity.
    pub fn new(config: BudgetConfig) -> Self {
        let state = BudgetState {
            available: config.max_calls,
            last_refill: Instant::now(),
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Apply whole elapsed seconds of refill toward the cap.
    fn refill(&self, state: &mut BudgetState) {
        let elapsed = state.last_refill.elapsed().as_secs();
        if elapsed > 0 {
            state.available = (state.available + elapsed as f64 * self.config.refill_per_second)
                .min(self.config.max_calls);
            state.last_refill += Duration::from_secs(elapsed);
        }
    }

    /// Debit `cost` if the balance covers it. Returns whether the debit
    /// happened; the balance never goes negative.
    pub async fn try_debit(&self, cost: f64) -> bool {
        let mut state = self.state.lock().await;
        self.refill(&mut state);

        if state.available >= cost {
            state.available -= cost;
            debug!("Debited {:.0} calls, {:.0} remaining", cost, state.available);
            true
        } else {
            false
        }
    }

    /// Return unused budget, clamped to the cap. Used when an admitted
    /// request consumed fewer calls than its upfront estimate.
    pub async fn credit(&self, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.available = (state.available + amount).min(self.config.max_calls);
    }

    /// Current balance after applying pending refill.
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.available
    }
}

/// Per-caller enqueue throttle with a fixed interval.
pub struct CooldownRegistry {
    interval: Duration,
    last_seen: Mutex<HashMap<String, Instant>>,
}

impl CooldownRegistry {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Record an enqueue attempt for `caller`. `Err` carries the remaining
    /// wait when the caller is still cooling down; the attempt is only
    /// recorded on success.
    pub async fn check_and_touch(&self, caller: &str) -> Result<(), Duration> {
        let mut last_seen = self.last_seen.lock().await;
        let now = Instant::now();

        if let Some(previous) = last_seen.get(caller) {
            let since = now.duration_since(*previous);
            if since < self.interval {
                return Err(self.interval - since);
            }
        }

        last_seen.insert(caller.to_string(), now);
        Ok(())
    }

    /// Drop entries whose cooldown has long expired (call periodically).
    pub async fn cleanup_stale(&self) {
        let mut last_seen = self.last_seen.lock().await;
        let cutoff = self.interval * 2;
        last_seen.retain(|_, seen| seen.elapsed() < cutoff);

        if !last_seen.is_empty() {
            debug!("Cooldown cleanup: {} active callers", last_seen.len());
        }
    }
}
