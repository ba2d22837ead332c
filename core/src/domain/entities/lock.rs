//! Account lock snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A currently locked identity as reported to operators and the login flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedAccount {
    pub username: String,
    pub unlock_at: DateTime<Utc>,
    /// Whole minutes until unlock, rounded up and never below 1
    pub remaining_minutes: i64,
}

impl LockedAccount {
    pub fn new(username: impl Into<String>, unlock_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            unlock_at,
            remaining_minutes: remaining_minutes(unlock_at, now),
        }
    }
}

/// Minutes until `unlock_at`, rounded up, at least 1
pub fn remaining_minutes(unlock_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (unlock_at - now).num_milliseconds();
    ((millis + 59_999) / 60_000).max(1)
}
