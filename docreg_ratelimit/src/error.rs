use std::fmt;
use std::time::Duration;

/// Result type for admission operations
pub type Result<T> = std::result::Result<T, RateLimitError>;

/// Errors that can occur while waiting for or configuring admission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    /// No permit left in the current window (non-blocking path only)
    Exhausted,

    /// No permit was granted before the wait deadline
    Timeout(Duration),

    /// The limiter was shut down while or before waiting
    Closed,

    /// Invalid configuration
    InvalidConfig(&'static str),

    /// Limiter was constructed outside a tokio runtime
    NoRuntime,
}

impl RateLimitError {
    /// True when the caller gave up or was woken without a permit
    pub fn is_interrupted(&self) -> bool {
        matches!(self, RateLimitError::Timeout(_) | RateLimitError::Closed)
    }
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitError::Exhausted => write!(f, "No permits left in the current window"),
            RateLimitError::Timeout(waited) => write!(f, "No permit granted within {:?}", waited),
            RateLimitError::Closed => write!(f, "Rate limiter has been shut down"),
            RateLimitError::InvalidConfig(msg) => write!(f, "Invalid rate limiter configuration: {}", msg),
            RateLimitError::NoRuntime => write!(f, "Rate limiter requires a running tokio runtime"),
        }
    }
}

impl std::error::Error for RateLimitError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupted_kinds() {
        assert!(RateLimitError::Timeout(Duration::from_millis(5)).is_interrupted());
        assert!(RateLimitError::Closed.is_interrupted());
        assert!(!RateLimitError::Exhausted.is_interrupted());
        assert!(!RateLimitError::InvalidConfig("x").is_interrupted());
    }

    #[test]
    fn test_display() {
        assert_eq!(RateLimitError::InvalidConfig("capacity must be greater than 0").to_string(), "Invalid rate limiter configuration: capacity must be greater than 0");
        assert_eq!(RateLimitError::Timeout(Duration::from_secs(2)).to_string(), "No permit granted within 2s");
    }
}
