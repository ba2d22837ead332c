//! Result of recording a failed login

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the login flow should tell the caller after a failed attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginFailureOutcome {
    /// Attempts left before the account locks
    pub remaining_attempts: u32,

    /// Whether the account is now locked
    pub locked: bool,

    /// Present when locked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_at: Option<DateTime<Utc>>,

    /// "Try again in N minutes", present when locked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_minutes: Option<i64>,

    /// True only for the failure that created the lock
    pub newly_locked: bool,

    /// Id of the audit entry, `None` when the write failed under a fail-open policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_id: Option<i64>,
}
