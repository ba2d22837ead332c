//! Configuration module with concern-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `audit` - Audit store backend and failure policy
//! - `database` - SQLite connection and pool configuration
//! - `environment` - Environment detection and logging configuration
//! - `login` - Failed-login lockout thresholds
//! - `monitor` - Composite alert thresholds
//! - `rate_limit` - Per-key request limits

pub mod audit;
pub mod database;
pub mod environment;
pub mod login;
pub mod monitor;
pub mod rate_limit;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigResult;

// Re-export commonly used types
pub use audit::{AuditBackend, AuditConfig, AuditFailurePolicy};
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use login::{LoginProtectionConfig, MAX_DURATION_SECONDS};
pub use monitor::{MonitorConfig, MonitorRule};
pub use rate_limit::RateLimitConfig;

/// Prefix for environment variable overrides, e.g. `RW_LOGIN__MAX_ATTEMPTS=3`
pub const ENV_PREFIX: &str = "RW";

/// Complete security core configuration combining all sub-configurations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Failed-login lockout configuration
    pub login: LoginProtectionConfig,

    /// Request rate limiting configuration
    pub rate_limit: RateLimitConfig,

    /// Composite alert configuration
    pub monitor: MonitorConfig,

    /// Audit store configuration
    pub audit: AuditConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl SecurityConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            rate_limit: RateLimitConfig::development(),
            database: DatabaseConfig::new("sqlite://data/releasewatch_dev.db").with_logging(true),
            logging: LoggingConfig::for_environment(Environment::Development),
            ..Default::default()
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            rate_limit: RateLimitConfig::production(),
            database: DatabaseConfig::new("sqlite:///var/lib/releasewatch/audit.db")
                .with_max_connections(10),
            logging: LoggingConfig::for_environment(Environment::Production),
            ..Default::default()
        }
    }

    /// Preset for the given environment
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
            Environment::Staging => {
                let mut config = Self::production();
                config.environment = Environment::Staging;
                config.logging = LoggingConfig::for_environment(Environment::Staging);
                config
            }
        }
    }

    /// Build a configuration in-memory; useful for tests and embedding
    pub fn memory() -> Self {
        Self {
            audit: AuditConfig::memory(),
            database: DatabaseConfig::in_memory(),
            ..Default::default()
        }
    }

    /// Load configuration in layers
    ///
    /// Layers, lowest precedence first: the preset for the detected
    /// environment, the environment's config file (optional), the explicit
    /// `path` (required when given), then `RW_*` environment variables using
    /// `__` as the nesting separator. The result is validated.
    pub fn load(path: Option<&str>) -> ConfigResult<Self> {
        let env = Environment::from_env();
        let preset = Self::for_environment(env);

        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&preset)?)
            .add_source(config::File::with_name(env.config_file()).required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: SecurityConfig = settings.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Load configuration from environment variables and the environment preset
    pub fn from_env() -> ConfigResult<Self> {
        Self::load(None)
    }

    /// Validate every section; construction of the security core calls this
    pub fn validate(&self) -> ConfigResult<()> {
        self.login.validate()?;
        self.rate_limit.validate()?;
        self.monitor.validate()?;
        if self.audit.backend == AuditBackend::Sqlite {
            self.database.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(SecurityConfig::development().validate().is_ok());
        assert!(SecurityConfig::production().validate().is_ok());
        assert!(SecurityConfig::for_environment(Environment::Staging).validate().is_ok());
        assert!(SecurityConfig::memory().validate().is_ok());
    }

    #[test]
    fn test_sqlite_backend_requires_database_url() {
        let mut config = SecurityConfig::default();
        config.database.url = String::new();
        assert!(config.validate().is_err());

        config.audit.backend = AuditBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_toml_keeps_defaults() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                "[login]\nmax_attempts = 3\n[audit]\nbackend = \"memory\"\nfailure_policy = \"fail_open\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let loaded: SecurityConfig = settings.try_deserialize().unwrap();

        assert_eq!(loaded.login.max_attempts, 3);
        assert_eq!(loaded.login.lockout_duration_seconds, 1800);
        assert_eq!(loaded.audit.backend, AuditBackend::Memory);
        assert_eq!(loaded.audit.failure_policy, AuditFailurePolicy::FailOpen);
        assert_eq!(loaded.rate_limit.limit_for("anilist"), 90);
    }
}
