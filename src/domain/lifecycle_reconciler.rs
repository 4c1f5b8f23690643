//! Periodic reconciliation of slot lifecycles.
//!
//! Two idempotent sweeps per tick: booked slots whose start has passed
//! become `Completed`, and stale `Available` slots are pruned. Both are
//! bulk repository operations keyed on the injected clock, so replaying
//! a tick converges instead of compounding.
//!
//! Connection-class repository failures are retried with doubling
//! backoff through an injected sleeper; query-class failures propagate
//! to the job runner, which logs and waits for the next tick.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::Error;
use crate::domain::ports::{SlotRepository, SlotRepositoryError};

/// Suspends the task between retry attempts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry tunables for one reconciliation sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Total attempts per sweep, the first included.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles afterwards.
    pub initial_backoff: Duration,
    /// Ceiling for the doubling backoff.
    pub max_backoff: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl ReconcilerConfig {
    /// Delay after the given failed attempt (1-based).
    fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << (attempt.saturating_sub(1)).min(16);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Summary of one reconciliation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Booked slots moved to `Completed`.
    pub completed: u64,
    /// Stale available slots removed.
    pub pruned: u64,
}

/// Periodic job converging slot statuses with wall-clock time.
pub struct LifecycleReconciler {
    slots: Arc<dyn SlotRepository>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    config: ReconcilerConfig,
}

impl LifecycleReconciler {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            slots,
            clock,
            sleeper,
            config,
        }
    }

    /// Run both sweeps once against the current time.
    pub async fn run_once(&self) -> Result<ReconcileOutcome, Error> {
        let now = self.clock.utc();

        let completed = self
            .with_retry("complete_expired", || {
                let slots = Arc::clone(&self.slots);
                async move { slots.complete_expired(now).await }
            })
            .await?;
        let pruned = self
            .with_retry("prune_expired_available", || {
                let slots = Arc::clone(&self.slots);
                async move { slots.prune_expired_available(now).await }
            })
            .await?;

        info!(completed, pruned, "lifecycle reconciliation finished");
        Ok(ReconcileOutcome { completed, pruned })
    }

    async fn with_retry<F, Fut>(&self, operation: &str, mut call: F) -> Result<u64, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<u64, SlotRepositoryError>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < self.config.max_attempts => {
                    let delay = self.config.backoff_for(attempt);
                    warn!(
                        %error,
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retryable reconciliation failure"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(Error::from(error)),
            }
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_reconciler_tests.rs"]
mod tests;
