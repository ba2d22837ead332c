//! Sliding-window request limiter keyed by arbitrary strings
//!
//! Used both for login throttling and for outbound third-party API calls,
//! where the key is the API name.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rw_shared::config::MAX_DURATION_SECONDS;
use rw_shared::RateLimitConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{Clock, SharedClock};
use crate::sync::lock;

/// Length of the trailing window
pub const RATE_LIMIT_WINDOW_SECONDS: u64 = 60;

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateLimitStatus {
    /// Request allowed and counted
    Ok {
        remaining: u32,
        limit: u32,
        window_seconds: u64,
    },
    /// Request rejected and not counted
    Exceeded {
        retry_after_seconds: u64,
        limit: u32,
        window_seconds: u64,
    },
}

impl RateLimitStatus {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitStatus::Ok { .. })
    }
}

#[derive(Debug, Default)]
struct LimiterState {
    windows: HashMap<String, VecDeque<DateTime<Utc>>>,
    last_sweep: Option<DateTime<Utc>>,
}

impl LimiterState {
    /// Drop every key whose window has emptied, at most once per window
    fn sweep(&mut self, now: DateTime<Utc>, window: Duration) {
        if self.last_sweep.map_or(false, |at| now - at < window) {
            return;
        }
        let cutoff = now - window;
        let before = self.windows.len();
        self.windows.retain(|_, timestamps| {
            prune(timestamps, cutoff);
            !timestamps.is_empty()
        });
        self.last_sweep = Some(now);
        let evicted = before - self.windows.len();
        if evicted > 0 {
            debug!(evicted, tracked = self.windows.len(), "Idle rate limit windows evicted");
        }
    }

    /// Pruned window for `key`; an emptied window is removed
    fn live_window(&mut self, key: &str, cutoff: DateTime<Utc>) -> Option<&VecDeque<DateTime<Utc>>> {
        let timestamps = self.windows.get_mut(key)?;
        prune(timestamps, cutoff);
        if timestamps.is_empty() {
            self.windows.remove(key);
            return None;
        }
        self.windows.get(key)
    }
}

/// Per-key counter over a trailing window
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<LimiterState>,
    config: RateLimitConfig,
    clock: SharedClock,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: SharedClock) -> Self {
        Self {
            state: Mutex::new(LimiterState::default()),
            config,
            clock,
        }
    }

    /// Limiter with the default per-API limits
    pub fn with_defaults(clock: SharedClock) -> Self {
        Self::new(RateLimitConfig::default(), clock)
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Configured per-minute limit for `key`, falling back to the default
    pub fn limit_for(&self, key: &str) -> u32 {
        self.config.limit_for(key)
    }

    fn window(&self) -> Duration {
        // Unvalidated configs are clamped rather than overflowing
        Duration::seconds(self.config.window_seconds.min(MAX_DURATION_SECONDS) as i64)
    }

    /// Allow and count one request for `key` if fewer than `limit_per_minute`
    /// are already inside the window
    pub fn is_allowed(&self, key: &str, limit_per_minute: u32) -> bool {
        self.check(key, limit_per_minute).is_allowed()
    }

    /// Same as [`RateLimiter::is_allowed`] using the configured limit for `key`
    pub fn is_allowed_for(&self, key: &str) -> bool {
        self.is_allowed(key, self.limit_for(key))
    }

    /// Check and record atomically, reporting remaining quota or wait time
    pub fn check(&self, key: &str, limit_per_minute: u32) -> RateLimitStatus {
        let window_seconds = self.config.window_seconds;
        if !self.config.enabled {
            return RateLimitStatus::Ok {
                remaining: limit_per_minute,
                limit: limit_per_minute,
                window_seconds,
            };
        }

        let now = self.clock.now();
        let window = self.window();
        let mut state = lock(&self.state);
        state.sweep(now, window);
        let windows = &mut state.windows;
        let timestamps = windows.entry(key.to_string()).or_default();
        prune(timestamps, now - window);

        let count = timestamps.len() as u32;
        if count < limit_per_minute {
            timestamps.push_back(now);
            debug!(key, count = count + 1, limit = limit_per_minute, "Request allowed");
            RateLimitStatus::Ok {
                remaining: limit_per_minute - count - 1,
                limit: limit_per_minute,
                window_seconds,
            }
        } else {
            let retry_after_seconds = wait_seconds(timestamps, window, now);
            if timestamps.is_empty() {
                windows.remove(key);
            }
            warn!(
                key,
                limit = limit_per_minute,
                retry_after_seconds,
                "Rate limit exceeded"
            );
            RateLimitStatus::Exceeded {
                retry_after_seconds,
                limit: limit_per_minute,
                window_seconds,
            }
        }
    }

    /// Seconds until the oldest counted request leaves the window; 0 when none
    pub fn get_wait_time(&self, key: &str) -> u64 {
        let now = self.clock.now();
        let window = self.window();
        let mut state = lock(&self.state);
        state
            .live_window(key, now - window)
            .map_or(0, |timestamps| wait_seconds(timestamps, window, now))
    }

    /// Requests still allowed for `key` inside the current window
    pub fn get_remaining_requests(&self, key: &str, limit_per_minute: u32) -> u32 {
        let now = self.clock.now();
        let mut state = lock(&self.state);
        let used = state
            .live_window(key, now - self.window())
            .map_or(0, |timestamps| timestamps.len() as u32);
        limit_per_minute.saturating_sub(used)
    }

    /// Forget the window for `key`
    pub fn reset(&self, key: &str) {
        lock(&self.state).windows.remove(key);
    }

    /// Number of keys with a window currently held in memory
    pub fn tracked_keys(&self) -> usize {
        lock(&self.state).windows.len()
    }
}

fn prune(timestamps: &mut VecDeque<DateTime<Utc>>, cutoff: DateTime<Utc>) {
    while timestamps.front().map_or(false, |ts| *ts <= cutoff) {
        timestamps.pop_front();
    }
}

fn wait_seconds(timestamps: &VecDeque<DateTime<Utc>>, window: Duration, now: DateTime<Utc>) -> u64 {
    match timestamps.front() {
        Some(oldest) => {
            let millis = (*oldest + window - now).num_milliseconds().max(0);
            ((millis + 999) / 1000) as u64
        }
        None => 0,
    }
}
