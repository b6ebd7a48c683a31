use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::trace;
use tracing::warn;

/// Background task that restores a permit pool to full capacity once per window
///
/// The first reset happens one full window after spawning. Missed ticks are
/// skipped rather than replayed, so a stalled clock never produces more than
/// `capacity` permits. The task is aborted when the resetter is stopped or
/// dropped and exits on its own once the pool is closed or gone.
pub struct WindowResetter {
    handle: JoinHandle<()>,
    counters: Arc<ResetCounters>,
}

#[derive(Debug, Default)]
struct ResetCounters {
    resets: AtomicU64,
    late: AtomicU64,
}

impl WindowResetter {
    /// Spawn the reset loop for `permits` on `runtime`
    pub fn spawn(runtime: &Handle, permits: &Arc<Semaphore>, capacity: u32, window: Duration) -> Self {
        let counters = Arc::new(ResetCounters::default());
        let first_reset = Instant::now() + window;

        let handle = runtime.spawn(run(Arc::downgrade(permits), capacity, window, first_reset, Arc::clone(&counters)));

        Self { handle, counters }
    }

    /// Number of window resets performed so far
    pub fn resets(&self) -> u64 {
        self.counters.resets.load(Ordering::Relaxed)
    }

    /// Number of ticks that fired at least one full window behind schedule
    pub fn late_ticks(&self) -> u64 {
        self.counters.late.load(Ordering::Relaxed)
    }

    /// Abort the reset loop
    pub fn stop(&self) {
        self.handle.abort();
    }

    /// True once the reset loop has exited or been aborted
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for WindowResetter {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(permits: Weak<Semaphore>, capacity: u32, window: Duration, first_reset: Instant, counters: Arc<ResetCounters>) {
    let mut interval = tokio::time::interval_at(first_reset, window);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let scheduled = interval.tick().await;

        let lateness = Instant::now().saturating_duration_since(scheduled);
        if lateness >= window {
            counters.late.fetch_add(1, Ordering::Relaxed);
            warn!(?lateness, ?window, "Window reset ran late, skipped windows are not replayed");
        }

        let Some(permits) = permits.upgrade() else {
            debug!("Permit pool dropped, stopping window resetter");
            return;
        };

        if permits.is_closed() {
            debug!("Permit pool closed, stopping window resetter");
            return;
        }

        let restored = refill(&permits, capacity);
        let total = counters.resets.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(restored, capacity, resets = total, "Window reset");
    }
}

/// Top the pool back up to `capacity`, returning how many permits were added
///
/// Only the resetter adds permits, so a concurrent acquire between the read
/// and the add can only leave the pool below capacity, never above it.
pub(crate) fn refill(permits: &Semaphore, capacity: u32) -> u32 {
    let capacity = capacity as usize;
    let available = permits.available_permits();

    if available >= capacity {
        return 0;
    }

    let missing = capacity - available;
    permits.add_permits(missing);
    missing as u32
}
