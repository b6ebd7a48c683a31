use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::sync::TryAcquireError;
use tracing::debug;
use tracing::info;

use crate::error::RateLimitError;
use crate::error::Result;
use crate::limiter::RateLimiter;
use crate::resetter::WindowResetter;

/// Fixed window admission limiter with timer-driven resets
///
/// At most `capacity` callers are admitted per window. Admission consumes a
/// permit for good: finishing a request does not give it back. At every window
/// boundary the [`WindowResetter`] restores the pool to exactly `capacity`,
/// waking blocked callers in the order they started waiting. Callers queued
/// beyond capacity keep waiting for the following window.
pub struct WindowLimiter {
    /// Permit pool, fair (FIFO) for waiters
    permits: Arc<Semaphore>,

    /// Permits restored at every window boundary
    capacity: u32,

    /// Window duration
    window: Duration,

    /// Reset loop, aborted on shutdown or drop
    resetter: WindowResetter,
}

impl WindowLimiter {
    /// Create a new limiter and start its reset loop on the current tokio runtime
    pub fn new(capacity: u32, window: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(RateLimitError::InvalidConfig("capacity must be greater than 0"));
        }
        if window.is_zero() {
            return Err(RateLimitError::InvalidConfig("window duration must be greater than 0"));
        }
        if capacity as usize > Semaphore::MAX_PERMITS {
            return Err(RateLimitError::InvalidConfig("capacity exceeds the maximum permit count"));
        }

        let runtime = Handle::try_current().map_err(|_| RateLimitError::NoRuntime)?;
        let permits = Arc::new(Semaphore::new(capacity as usize));
        let resetter = WindowResetter::spawn(&runtime, &permits, capacity, window);

        debug!(capacity, ?window, "Window limiter started");

        Ok(Self { permits, capacity, window, resetter })
    }

    /// Create a limiter admitting `capacity` requests per second
    pub fn per_second(capacity: u32) -> Result<Self> {
        Self::new(capacity, Duration::from_secs(1))
    }

    /// Create a limiter admitting `capacity` requests per minute
    pub fn per_minute(capacity: u32) -> Result<Self> {
        Self::new(capacity, Duration::from_secs(60))
    }

    /// Create a builder for configuring a window limiter
    pub fn builder() -> WindowLimiterBuilder {
        WindowLimiterBuilder::new()
    }

    /// Window duration
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of window resets performed so far
    pub fn resets(&self) -> u64 {
        self.resetter.resets()
    }

    /// Number of window resets that ran a full window or more behind schedule
    pub fn late_resets(&self) -> u64 {
        self.resetter.late_ticks()
    }

    /// Stop the reset loop and close the pool
    ///
    /// Every caller blocked in `acquire` wakes with [`RateLimitError::Closed`],
    /// as does every later acquire. Calling this more than once is harmless.
    pub fn shutdown(&self) {
        if self.permits.is_closed() {
            return;
        }

        self.resetter.stop();
        self.permits.close();
        info!(capacity = self.capacity, "Window limiter shut down");
    }

    /// True once [`WindowLimiter::shutdown`] has been called
    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }
}

impl RateLimiter for WindowLimiter {
    fn try_acquire(&self) -> Result<()> {
        match self.permits.try_acquire() {
            Ok(permit) => {
                permit.forget();
                Ok(())
            }
            Err(TryAcquireError::NoPermits) => Err(RateLimitError::Exhausted),
            Err(TryAcquireError::Closed) => Err(RateLimitError::Closed),
        }
    }

    fn acquire(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            // Dropping this future while queued removes the waiter without taking a permit
            let permit = self.permits.acquire().await.map_err(|_| RateLimitError::Closed)?;
            permit.forget();
            Ok(())
        })
    }

    fn available(&self) -> u32 {
        self.permits.available_permits().min(self.capacity as usize) as u32
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// Builder for configuring a window limiter
pub struct WindowLimiterBuilder {
    capacity: Option<u32>,
    window: Option<Duration>,
}

impl WindowLimiterBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self { capacity: None, window: None }
    }

    /// Set the capacity (max requests per window)
    pub fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the window duration
    pub fn window(mut self, window: Duration) -> Self {
        self.window = Some(window);
        self
    }

    /// Set window to 1 second
    pub fn per_second(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self.window = Some(Duration::from_secs(1));
        self
    }

    /// Set window to 1 minute
    pub fn per_minute(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self.window = Some(Duration::from_secs(60));
        self
    }

    /// Set window to 1 hour
    pub fn per_hour(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self.window = Some(Duration::from_secs(3600));
        self
    }

    /// Build the window limiter
    pub fn build(self) -> Result<WindowLimiter> {
        let capacity = self.capacity.ok_or(RateLimitError::InvalidConfig("capacity must be set"))?;
        let window = self.window.ok_or(RateLimitError::InvalidConfig("window must be set"))?;
        WindowLimiter::new(capacity, window)
    }
}

impl Default for WindowLimiterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
