//! Login protection (failed-attempt lockout) configuration

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};

/// Upper bound accepted for any duration setting (one year)
pub const MAX_DURATION_SECONDS: u64 = 31_536_000;

/// Failed-login lockout settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginProtectionConfig {
    /// Failures inside the window that trigger a lock
    pub max_attempts: u32,

    /// Sliding window for counting failures, in seconds
    pub attempt_window_seconds: u64,

    /// How long a lock lasts, in seconds
    pub lockout_duration_seconds: u64,
}

impl Default for LoginProtectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            attempt_window_seconds: 900,    // 15 minutes
            lockout_duration_seconds: 1800, // 30 minutes
        }
    }
}

impl LoginProtectionConfig {
    /// Validate the lockout settings
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "login.max_attempts",
                "must be at least 1",
            ));
        }
        check_duration("login.attempt_window_seconds", self.attempt_window_seconds)?;
        check_duration(
            "login.lockout_duration_seconds",
            self.lockout_duration_seconds,
        )?;
        Ok(())
    }
}

/// Reject zero and absurdly large durations
pub(crate) fn check_duration(field: &str, seconds: u64) -> ConfigResult<()> {
    if seconds == 0 {
        return Err(ConfigError::invalid(field, "must be greater than zero"));
    }
    if seconds > MAX_DURATION_SECONDS {
        return Err(ConfigError::invalid(
            field,
            format!("must not exceed {} seconds", MAX_DURATION_SECONDS),
        ));
    }
    Ok(())
}
