//! # docreg_ratelimit
//!
//! Window-based admission control for outbound registry requests.
//!
//! A [`WindowLimiter`] hands out at most `capacity` permits per window. Permits
//! are never returned by callers; a background [`WindowResetter`] restores the
//! pool to full capacity at every window boundary.

pub mod error;
pub mod limiter;
pub mod resetter;
pub mod window_limiter;

pub use error::RateLimitError;
pub use error::Result;
pub use limiter::RateLimiter;
pub use resetter::WindowResetter;
pub use window_limiter::WindowLimiter;
pub use window_limiter::WindowLimiterBuilder;
