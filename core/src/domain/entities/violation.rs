//! Security monitor violation accounting

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Kind of violation the security monitor correlates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A request rejected by the rate limiter
    RateLimit,
    /// A failed login that locked the account
    Lockout,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::RateLimit => "rate_limit",
            ViolationKind::Lockout => "lockout",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-(kind, key) counter held by the security monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub kind: ViolationKind,
    pub key: String,
    /// Violations inside the trailing window not yet reported
    pub count: u32,
    /// Violations since the counter was created
    pub total: u64,
    /// Oldest violation still counted
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// When the last composite alert for this key was emitted
    pub alerted_at: Option<DateTime<Utc>>,
    /// Times of the counted violations, oldest first
    #[serde(skip)]
    pub(crate) recent: VecDeque<DateTime<Utc>>,
}

impl ViolationRecord {
    pub fn new(kind: ViolationKind, key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            kind,
            key: key.into(),
            count: 0,
            total: 0,
            first_seen: now,
            last_seen: now,
            alerted_at: None,
            recent: VecDeque::new(),
        }
    }

    /// Count a violation at `now`, forgetting those older than `window`
    pub(crate) fn observe(&mut self, now: DateTime<Utc>, window: Duration) {
        self.expire(now, window);
        self.recent.push_back(now);
        self.total += 1;
        self.last_seen = now;
        self.sync();
    }

    /// Forget violations at or before `now - window`
    pub(crate) fn expire(&mut self, now: DateTime<Utc>, window: Duration) {
        let cutoff = now - window;
        while self.recent.front().map_or(false, |ts| *ts <= cutoff) {
            self.recent.pop_front();
        }
        self.sync();
    }

    /// Start counting afresh after an alert
    pub(crate) fn clear_recent(&mut self) {
        self.recent.clear();
        self.sync();
    }

    /// Put back violations consumed by an alert that was never stored
    pub(crate) fn merge_unreported(&mut self, unreported: &VecDeque<DateTime<Utc>>) {
        let mut merged: VecDeque<DateTime<Utc>> = unreported.clone();
        merged.extend(self.recent.iter().copied());
        self.recent = merged;
        self.sync();
    }

    fn sync(&mut self) {
        self.count = self.recent.len() as u32;
        if let Some(oldest) = self.recent.front() {
            self.first_seen = *oldest;
        }
    }

    pub fn alerted(&self) -> bool {
        self.alerted_at.is_some()
    }
}
