//! Rate limiting configuration module

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::login::check_duration;
use crate::errors::{ConfigError, ConfigResult};

/// Per-key request limits for outbound API calls and other throttled resources
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,

    /// Trailing window length in seconds
    pub window_seconds: u64,

    /// Limit applied to keys without an explicit entry
    pub default_per_minute: u32,

    /// Limits for named APIs (e.g. "anilist", "gmail")
    pub api_limits: HashMap<String, u32>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let mut api_limits = HashMap::new();
        api_limits.insert("anilist".to_string(), 90);
        api_limits.insert("gmail".to_string(), 20);
        api_limits.insert("google_calendar".to_string(), 60);
        api_limits.insert("rss".to_string(), 30);

        Self {
            enabled: true,
            window_seconds: 60,
            default_per_minute: 60,
            api_limits,
        }
    }
}

impl RateLimitConfig {
    /// Limit for a key, falling back to `default_per_minute`
    pub fn limit_for(&self, key: &str) -> u32 {
        self.api_limits
            .get(key)
            .copied()
            .unwrap_or(self.default_per_minute)
    }

    /// Add or replace a named limit
    pub fn with_limit(mut self, key: impl Into<String>, per_minute: u32) -> Self {
        self.api_limits.insert(key.into(), per_minute);
        self
    }

    /// Create a development configuration (more lenient limits)
    pub fn development() -> Self {
        Self {
            default_per_minute: 300,
            ..Default::default()
        }
    }

    /// Create a production configuration
    pub fn production() -> Self {
        Self::default()
    }

    /// Validate the limiter settings
    pub fn validate(&self) -> ConfigResult<()> {
        check_duration("rate_limit.window_seconds", self.window_seconds)?;
        if self.default_per_minute == 0 {
            return Err(ConfigError::invalid(
                "rate_limit.default_per_minute",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}
