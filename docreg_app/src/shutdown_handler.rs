use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use docreg_ratelimit::WindowLimiter;

/// Sets up a Ctrl+C handler that clears the running flag and shuts the limiter down
///
/// Submissions still waiting for admission then fail with an interrupted wait
/// instead of holding the process open until the next window.
pub fn setup(running: Arc<AtomicBool>, limiter: Arc<WindowLimiter>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        tracing::info!("Shutdown signal received");
        running.store(false, Ordering::Relaxed);
        limiter.shutdown();
    })
}
