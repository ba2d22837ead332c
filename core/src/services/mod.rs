//! Business services containing domain logic and use cases.

pub mod auth;
pub mod monitor;
pub mod security_core;

// Re-export commonly used types
pub use auth::{
    AttemptTracker, FailureRecord, LoginGuard, RateLimitStatus, RateLimiter,
    ACCOUNT_LOCKED_REASON, ATTEMPT_WINDOW_MINUTES, LOCKOUT_DURATION_MINUTES, MAX_ATTEMPTS,
    RATE_LIMIT_WINDOW_SECONDS,
};
pub use monitor::{SecurityMonitor, REPEATED_LOCKOUT_REASON};
pub use security_core::SecurityCore;
