use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::RateLimitError;
use crate::error::Result;

/// Core trait for admission control in front of outbound requests
///
/// A permit represents the right to initiate one request. Permits are consumed
/// on admission and are never handed back by the caller.
pub trait RateLimiter: Send + Sync {
    /// Take a permit if one is available right now
    fn try_acquire(&self) -> Result<()>;

    /// Wait until a permit becomes available, then take it
    ///
    /// Dropping the returned future before it resolves consumes nothing.
    fn acquire(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Like [`RateLimiter::acquire`], but give up after `timeout`
    fn acquire_timeout(&self, timeout: Duration) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { tokio::time::timeout(timeout, self.acquire()).await.map_err(|_| RateLimitError::Timeout(timeout))? })
    }

    /// Get the number of permits left in the current window
    fn available(&self) -> u32;

    /// Get the number of permits restored at every window boundary
    fn capacity(&self) -> u32;
}
