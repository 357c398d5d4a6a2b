//! The scheduler (spec §4.2): a fixed-cadence admission loop that hands
//! queued jobs to workers up to the concurrency ceiling.

use std::sync::Arc;
use std::time::Duration;

use vodkeep_store::JobStore;
use vodkeep_telemetry::Metrics;

use crate::active::ActiveMap;
use crate::worker::{self, WorkerContext};

/// Cadence the scheduler polls the queue at (spec §4.2).
const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Drive the scheduler loop until the process exits. Never returns; an
/// error reading the store in one tick is logged and the loop continues
/// at the next tick rather than aborting.
pub(crate) async fn run(
    store: JobStore,
    active: ActiveMap,
    metrics: Metrics,
    worker_ctx: Arc<WorkerContext>,
    max_concurrent_downloads: usize,
) -> ! {
    loop {
        metrics.set_active_jobs(i64::try_from(active.len()).unwrap_or(i64::MAX));
        match store.count_queued().await {
            Ok(depth) => metrics.set_queue_depth(depth),
            Err(err) => tracing::error!(error = %err, "failed to read queue depth"),
        }

        let available = max_concurrent_downloads.saturating_sub(active.len());
        if available > 0 {
            match store.queued_ids(u32::try_from(available).unwrap_or(u32::MAX)).await {
                Ok(ids) => dispatch(&ids, &active, &metrics, &worker_ctx),
                Err(err) => tracing::error!(error = %err, "failed to fetch queued job ids"),
            }
        }

        tokio::time::sleep(TICK_INTERVAL).await;
    }
}

fn dispatch(ids: &[String], active: &ActiveMap, metrics: &Metrics, worker_ctx: &Arc<WorkerContext>) {
    for id in ids {
        let (cancel, inserted) = active.try_insert(id);
        if !inserted {
            continue;
        }

        metrics.job_started();
        let job_id = id.clone();
        let active = active.clone();
        let worker_ctx = Arc::clone(worker_ctx);

        tokio::spawn(async move {
            worker::run_job(job_id.clone(), cancel, worker_ctx).await;
            active.remove(&job_id);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_interval_matches_the_documented_cadence() {
        assert_eq!(TICK_INTERVAL, Duration::from_millis(500));
    }
}
