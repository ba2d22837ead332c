//! Security monitor alert thresholds

use serde::{Deserialize, Serialize};

use super::login::check_duration;
use crate::errors::{ConfigError, ConfigResult};

/// Threshold rule: `threshold` violations within `window_seconds` raise one alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct MonitorRule {
    pub threshold: u32,
    pub window_seconds: u64,
}

impl MonitorRule {
    pub fn new(threshold: u32, window_seconds: u64) -> Self {
        Self {
            threshold,
            window_seconds,
        }
    }
}

/// Composite alert configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Repeated rate-limit rejections for one key
    pub rate_limit: MonitorRule,

    /// Repeated lockouts of one identity
    pub lockout: MonitorRule,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            rate_limit: MonitorRule::new(5, 300), // 5 in 5 minutes
            lockout: MonitorRule::new(3, 3600),   // 3 in 1 hour
        }
    }
}

impl MonitorConfig {
    /// Validate both rules
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, rule) in [("monitor.rate_limit", self.rate_limit), ("monitor.lockout", self.lockout)] {
            if rule.threshold == 0 {
                return Err(ConfigError::invalid(
                    format!("{}.threshold", name),
                    "must be at least 1",
                ));
            }
            check_duration(&format!("{}.window_seconds", name), rule.window_seconds)?;
        }
        Ok(())
    }
}
