//! Background job runner.
//!
//! Each job gets its own interval timer on the shared runtime. Every
//! tick runs under a time budget: a tick that fails or overruns is
//! logged and abandoned, and the loop waits for the next one. The jobs
//! never take the process down.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::error;

use crate::domain::{AvailabilityScheduler, Error, LifecycleReconciler};

async fn bounded_tick<F>(job: &'static str, budget: Duration, tick: F)
where
    F: Future<Output = Result<(), Error>>,
{
    match tokio::time::timeout(budget, tick).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!(error = %err, job, "job tick failed"),
        Err(_) => error!(
            job,
            budget_ms = budget.as_millis() as u64,
            "job tick exceeded its budget, abandoned until the next tick"
        ),
    }
}

/// Start the weekly generation loop. The first tick fires immediately,
/// so a fresh deployment schedules next week without waiting.
pub fn spawn_weekly_generation(
    scheduler: Arc<AvailabilityScheduler>,
    every: Duration,
    budget: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            bounded_tick("weekly_generation", budget, async {
                scheduler.run_weekly_generation().await.map(|_| ())
            })
            .await;
        }
    })
}

/// Start the lifecycle reconciliation loop.
pub fn spawn_lifecycle_reconciliation(
    reconciler: Arc<LifecycleReconciler>,
    every: Duration,
    budget: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            bounded_tick("lifecycle_reconciliation", budget, async {
                reconciler.run_once().await.map(|_| ())
            })
            .await;
        }
    })
}
