use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::CleanupService;

// Roughly 30 years, well inside `Instant` range on every platform.
const FAR_FUTURE_SECS: u64 = 86_400 * 365 * 30;

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Background loop that runs one cleanup batch per interval.
///
/// A worker runs at most one loop over its lifetime: the first `start` spawns
/// it, later calls are ignored. Batches never overlap; a batch that outlasts
/// the interval delays the next tick instead of queueing extra ones.
pub struct CleanupWorker {
    service: Arc<CleanupService>,
    interval: Duration,
    started: AtomicBool,
    running: Mutex<Option<Running>>,
}

impl CleanupWorker {
    pub fn new(service: Arc<CleanupService>) -> Self {
        let interval = service.config().interval();
        Self {
            service,
            interval,
            started: AtomicBool::new(false),
            running: Mutex::new(None),
        }
    }

    /// Spawn the loop. Returns `false` if this worker was already started.
    ///
    /// The loop exits when `shutdown` (or [`stop`](Self::stop)) is cancelled.
    pub fn start(&self, shutdown: CancellationToken) -> bool {
        // Held until the handle is stored so a concurrent `stop` cannot miss it.
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);

        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Cleanup worker already started");
            return false;
        }

        let cancel = shutdown.child_token();
        let handle = tokio::spawn(run(self.service.clone(), self.interval, cancel.clone()));

        *running = Some(Running { cancel, handle });
        true
    }

    /// Cancel the loop and wait for it to exit.
    ///
    /// An in-flight batch is allowed to finish. Calling `stop` on a worker
    /// that is not running does nothing.
    pub async fn stop(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(Running { cancel, handle }) = running else {
            return;
        };

        cancel.cancel();
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Cleanup worker task panicked");
        }
    }
}

/// `now + period`, saturating far in the future instead of overflowing.
fn first_deadline(now: Instant, period: Duration) -> Instant {
    now.checked_add(period)
        .unwrap_or_else(|| now + Duration::from_secs(FAR_FUTURE_SECS))
}

async fn run(service: Arc<CleanupService>, period: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = period.as_secs(),
        batch_size = service.config().batch_size,
        "Cleanup worker started"
    );

    let mut ticker = interval_at(first_deadline(Instant::now(), period), period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if cancel.is_cancelled() {
            break;
        }

        match service.cleanup_batch().await {
            Ok(result) if result.is_empty() => {}
            Ok(result) => {
                tracing::info!(
                    processed = result.processed,
                    failed = result.failed,
                    "Cleanup batch completed"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Cleanup batch failed");
            }
        }
    }

    tracing::info!("Cleanup worker stopped");
}
