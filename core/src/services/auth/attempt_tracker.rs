//! Failed login tracking and account lockout
//!
//! Failures are counted per identity over a sliding window. When the count
//! inside the window reaches the configured maximum the identity is locked
//! for a fixed duration. A lock expires by itself once its unlock time has
//! passed, or is removed early by a successful login or an operator.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rw_shared::LoginProtectionConfig;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SharedClock};
use crate::domain::entities::lock::LockedAccount;
use crate::sync::lock;

/// Failures inside the window that lock an identity
pub const MAX_ATTEMPTS: u32 = 5;

/// Sliding window for counting failures
pub const ATTEMPT_WINDOW_MINUTES: i64 = 15;

/// How long a lock lasts
pub const LOCKOUT_DURATION_MINUTES: i64 = 30;

/// State after a failure has been recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureRecord {
    /// Failures currently counted inside the window
    pub recent_failures: u32,
    /// Unlock time when the identity is locked
    pub locked_until: Option<DateTime<Utc>>,
    /// True only when this failure created the lock
    pub newly_locked: bool,
}

#[derive(Debug, Default)]
struct TrackerState {
    attempts: HashMap<String, VecDeque<DateTime<Utc>>>,
    locks: HashMap<String, DateTime<Utc>>,
    last_sweep: Option<DateTime<Utc>>,
}

impl TrackerState {
    /// Drop expired locks and histories that left the window, at most once per window
    fn sweep(&mut self, now: DateTime<Utc>, window: Duration) {
        if self.last_sweep.map_or(false, |at| now - at < window) {
            return;
        }
        self.last_sweep = Some(now);

        let expired: Vec<(String, DateTime<Utc>)> = self
            .locks
            .iter()
            .filter(|(_, unlock_at)| **unlock_at <= now)
            .map(|(identity, unlock_at)| (identity.clone(), *unlock_at))
            .collect();
        for (identity, unlock_at) in expired {
            expire(self, &identity, unlock_at);
        }

        let cutoff = now - window;
        let locks = &self.locks;
        let before = self.attempts.len();
        self.attempts.retain(|identity, attempts| {
            if locks.contains_key(identity) {
                return true;
            }
            prune(attempts, cutoff);
            !attempts.is_empty()
        });
        let evicted = before - self.attempts.len();
        if evicted > 0 {
            debug!(evicted, tracked = self.attempts.len(), "Stale failure histories evicted");
        }
    }
}

/// Per-identity failure counter and lock table
#[derive(Debug)]
pub struct AttemptTracker {
    state: Mutex<TrackerState>,
    config: LoginProtectionConfig,
    clock: SharedClock,
}

impl AttemptTracker {
    pub fn new(config: LoginProtectionConfig, clock: SharedClock) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            config,
            clock,
        }
    }

    /// Tracker with the standard 5 failures / 15 minutes / 30 minute lock policy
    pub fn with_defaults(clock: SharedClock) -> Self {
        Self::new(LoginProtectionConfig::default(), clock)
    }

    pub fn config(&self) -> &LoginProtectionConfig {
        &self.config
    }

    /// The clock used for every window and lock calculation
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    fn window(&self) -> Duration {
        Duration::seconds(self.config.attempt_window_seconds as i64)
    }

    fn lockout(&self) -> Duration {
        Duration::seconds(self.config.lockout_duration_seconds as i64)
    }

    /// Record one failed login for `identity`
    pub fn record_failed_attempt(&self, identity: &str) {
        self.record_failure(identity);
    }

    /// Record one failed login and report the resulting state
    pub fn record_failure(&self, identity: &str) -> FailureRecord {
        let now = self.clock.now();
        let cutoff = now - self.window();
        let max = self.config.max_attempts;
        let mut state = lock(&self.state);
        state.sweep(now, self.window());

        if let Some(&unlock_at) = state.locks.get(identity) {
            if now < unlock_at {
                // Already locked; the failure is not stored
                let recent = state
                    .attempts
                    .get(identity)
                    .map_or(0, |attempts| count_within(attempts, cutoff));
                debug!(identity, %unlock_at, "Failed attempt on locked account");
                return FailureRecord {
                    recent_failures: recent,
                    locked_until: Some(unlock_at),
                    newly_locked: false,
                };
            }
            expire(&mut state, identity, unlock_at);
        }

        let attempts = state.attempts.entry(identity.to_string()).or_default();
        prune(attempts, cutoff);
        attempts.push_back(now);
        while attempts.len() > max as usize {
            attempts.pop_front();
        }
        let recent = attempts.len() as u32;

        if recent >= max {
            let unlock_at = now + self.lockout();
            state.locks.insert(identity.to_string(), unlock_at);
            warn!(
                identity,
                failures = recent,
                %unlock_at,
                "Account locked after repeated failed login attempts"
            );
            return FailureRecord {
                recent_failures: recent,
                locked_until: Some(unlock_at),
                newly_locked: true,
            };
        }

        debug!(identity, failures = recent, "Failed login attempt recorded");
        FailureRecord {
            recent_failures: recent,
            locked_until: None,
            newly_locked: false,
        }
    }

    /// Whether `identity` is locked, and until when
    ///
    /// An expired lock is removed together with the failure history. Repeated
    /// calls during a lock return the same unlock time.
    pub fn is_locked(&self, identity: &str) -> (bool, Option<DateTime<Utc>>) {
        let now = self.clock.now();
        let mut state = lock(&self.state);
        match self.check_lock(&mut state, identity, now) {
            Some(unlock_at) => (true, Some(unlock_at)),
            None => (false, None),
        }
    }

    /// Snapshot of the lock on `identity`, if one is live
    pub fn lock_info(&self, identity: &str) -> Option<LockedAccount> {
        let now = self.clock.now();
        let mut state = lock(&self.state);
        self.check_lock(&mut state, identity, now)
            .map(|unlock_at| LockedAccount::new(identity, unlock_at, now))
    }

    fn check_lock(
        &self,
        state: &mut TrackerState,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        state.sweep(now, self.window());
        if let Some(&unlock_at) = state.locks.get(identity) {
            if now < unlock_at {
                return Some(unlock_at);
            }
            expire(state, identity, unlock_at);
            return None;
        }

        let cutoff = now - self.window();
        let recent = match state.attempts.get_mut(identity) {
            Some(attempts) => {
                prune(attempts, cutoff);
                attempts.len() as u32
            }
            None => return None,
        };

        if recent == 0 {
            state.attempts.remove(identity);
            return None;
        }

        if recent >= self.config.max_attempts {
            let unlock_at = now + self.lockout();
            state.locks.insert(identity.to_string(), unlock_at);
            warn!(identity, failures = recent, %unlock_at, "Account locked on check");
            return Some(unlock_at);
        }

        None
    }

    /// Forget failures and any lock for `identity`; called after a successful login
    pub fn clear_attempts(&self, identity: &str) {
        let mut state = lock(&self.state);
        state.attempts.remove(identity);
        if state.locks.remove(identity).is_some() {
            info!(identity, "Account lock cleared by successful login");
        }
    }

    /// Failures left before `identity` is locked
    pub fn get_remaining_attempts(&self, identity: &str) -> u32 {
        let now = self.clock.now();
        let cutoff = now - self.window();
        let max = self.config.max_attempts;
        let state = lock(&self.state);

        match state.locks.get(identity) {
            Some(&unlock_at) if now < unlock_at => return 0,
            // An expired lock takes its history with it
            Some(_) => return max,
            None => {}
        }

        let recent = state
            .attempts
            .get(identity)
            .map_or(0, |attempts| count_within(attempts, cutoff));
        max.saturating_sub(recent)
    }

    /// Operator unlock; returns false when there was nothing to clear
    pub fn unlock_account(&self, identity: &str) -> bool {
        let mut state = lock(&self.state);
        let had_lock = state.locks.remove(identity).is_some();
        let had_attempts = state
            .attempts
            .remove(identity)
            .map_or(false, |attempts| !attempts.is_empty());

        let cleared = had_lock || had_attempts;
        if cleared {
            info!(identity, had_lock, "Account unlocked by operator");
        }
        cleared
    }

    /// Identities with a failure history or a lock currently held in memory
    pub fn tracked_identities(&self) -> usize {
        let state = lock(&self.state);
        let unlocked_histories = state
            .attempts
            .keys()
            .filter(|identity| !state.locks.contains_key(*identity))
            .count();
        unlocked_histories + state.locks.len()
    }

    /// Every live lock, soonest unlock first
    pub fn get_locked_accounts(&self) -> Vec<LockedAccount> {
        let now = self.clock.now();
        let mut state = lock(&self.state);

        let expired: Vec<(String, DateTime<Utc>)> = state
            .locks
            .iter()
            .filter(|(_, unlock_at)| **unlock_at <= now)
            .map(|(identity, unlock_at)| (identity.clone(), *unlock_at))
            .collect();
        for (identity, unlock_at) in expired {
            expire(&mut state, &identity, unlock_at);
        }

        let mut accounts: Vec<LockedAccount> = state
            .locks
            .iter()
            .map(|(identity, unlock_at)| LockedAccount::new(identity.as_str(), *unlock_at, now))
            .collect();
        accounts.sort_by(|a, b| {
            a.unlock_at
                .cmp(&b.unlock_at)
                .then_with(|| a.username.cmp(&b.username))
        });
        accounts
    }
}

fn expire(state: &mut TrackerState, identity: &str, unlock_at: DateTime<Utc>) {
    state.locks.remove(identity);
    state.attempts.remove(identity);
    info!(identity, %unlock_at, "Account lock expired");
}

fn prune(attempts: &mut VecDeque<DateTime<Utc>>, cutoff: DateTime<Utc>) {
    while attempts.front().map_or(false, |ts| *ts <= cutoff) {
        attempts.pop_front();
    }
}

fn count_within(attempts: &VecDeque<DateTime<Utc>>, cutoff: DateTime<Utc>) -> u32 {
    attempts.iter().filter(|ts| **ts > cutoff).count() as u32
}
