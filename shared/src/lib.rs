//! Shared configuration and error types for the ReleaseWatch security core
//!
//! This crate provides the pieces used across all workspace members:
//! - Configuration types for login protection, rate limiting, monitoring,
//!   audit storage, database access and logging
//! - Configuration validation errors

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AuditBackend, AuditConfig, AuditFailurePolicy, DatabaseConfig, Environment, LogFormat,
    LoggingConfig, LoginProtectionConfig, MonitorConfig, MonitorRule, RateLimitConfig,
    SecurityConfig,
};
pub use errors::{ConfigError, ConfigResult};
