//! Authentication defense module
//!
//! This module provides the login protection building blocks:
//! - Failed attempt tracking and account lockout
//! - Per-key sliding-window rate limiting
//! - The login guard tying both to the audit log

mod attempt_tracker;
mod rate_limiter;
mod service;

#[cfg(test)]
pub(crate) mod tests;

pub use attempt_tracker::{
    AttemptTracker, FailureRecord, ATTEMPT_WINDOW_MINUTES, LOCKOUT_DURATION_MINUTES, MAX_ATTEMPTS,
};
pub use rate_limiter::{RateLimitStatus, RateLimiter, RATE_LIMIT_WINDOW_SECONDS};
pub use service::{LoginGuard, ACCOUNT_LOCKED_REASON};
