//! Authentication-flow error types

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Authentication-related errors surfaced to the login flow
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Account is locked. Please try again in {minutes} minutes")]
    AccountLocked {
        minutes: i64,
        unlock_at: DateTime<Utc>,
    },

    #[error("Too many requests. Please try again in {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },
}

impl AuthError {
    /// Stable code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::AccountLocked { .. } => "ACCOUNT_LOCKED",
            AuthError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
        }
    }

    /// Seconds the caller should wait before retrying
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> u64 {
        match self {
            AuthError::AccountLocked { unlock_at, .. } => {
                (*unlock_at - now).num_seconds().max(0) as u64
            }
            AuthError::RateLimitExceeded {
                retry_after_seconds,
            } => *retry_after_seconds,
        }
    }
}
