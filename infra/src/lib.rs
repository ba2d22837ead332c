//! # Infrastructure Layer
//!
//! This crate wires the ReleaseWatch security core to its runtime
//! environment. It provides the persistent audit store, the logging
//! subscriber and the startup routine that picks a store backend from
//! configuration.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Database**: SQLite connection pool, schema and the audit store using SQLx
//! - **Telemetry**: `tracing-subscriber` setup driven by `LoggingConfig`
//! - **Startup**: configuration loading and [`initialize`]

use std::sync::Arc;

use rw_core::{AuditStore, InMemoryAuditStore, SecurityCore, SharedClock, SystemClock};
use rw_shared::{AuditBackend, ConfigError, SecurityConfig};

// Re-export core types for convenience
pub use rw_core::errors::*;

/// Database module - SQLite implementations using SQLx
pub mod database;

/// Logging subscriber setup
pub mod telemetry;

pub use database::{DatabasePool, PersistentAuditStore, PoolStatistics, SqliteAuditStore};
pub use telemetry::init_telemetry;

/// Security core over whichever audit backend the configuration selected
pub type DynSecurityCore = SecurityCore<dyn AuditStore>;

/// Initialize the security core with wall-clock time
///
/// This function sets up:
/// - The audit store named by `config.audit.backend`
/// - The SQLite pool and schema when the backend is `sqlite`
/// - Tracker, limiter, monitor and login guard sharing one clock
pub async fn initialize(config: SecurityConfig) -> Result<DynSecurityCore, InfrastructureError> {
    initialize_with_clock(config, SystemClock::shared()).await
}

/// Initialize the security core around an explicit clock
pub async fn initialize_with_clock(
    config: SecurityConfig,
    clock: SharedClock,
) -> Result<DynSecurityCore, InfrastructureError> {
    tracing::info!(
        environment = %config.environment,
        backend = ?config.audit.backend,
        "Initializing security core"
    );

    config.validate()?;
    let store = open_audit_store(&config, clock.clone()).await?;
    let core = SecurityCore::init(config, store, clock)?;

    tracing::info!("Security core ready");
    Ok(core)
}

/// Build the audit store selected by `config.audit.backend`
pub async fn open_audit_store(
    config: &SecurityConfig,
    clock: SharedClock,
) -> Result<Arc<dyn AuditStore>, InfrastructureError> {
    match config.audit.backend {
        AuditBackend::Memory => {
            tracing::info!("Using in-memory audit store");
            Ok(Arc::new(InMemoryAuditStore::new(clock)))
        }
        AuditBackend::Sqlite => {
            let pool = DatabasePool::new(config.database.clone()).await?;
            let store = SqliteAuditStore::new(pool, clock).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Load configuration from files and environment
///
/// A `.env` file in the working directory is read first when present, so
/// its `RW_*` entries take part in the environment layer.
pub fn load_config(path: Option<&str>) -> Result<SecurityConfig, InfrastructureError> {
    dotenvy::dotenv().ok(); // Load .env file if present

    let config = SecurityConfig::load(path)?;
    tracing::debug!(
        environment = %config.environment,
        backend = ?config.audit.backend,
        "Configuration loaded"
    );
    Ok(config)
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error raised by a core component during wiring
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

impl From<ConfigError> for InfrastructureError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        match err {
            InfrastructureError::Domain(inner) => inner,
            InfrastructureError::Database(e) => DomainError::storage(e.to_string()),
            InfrastructureError::Config(message) => DomainError::storage(message),
            InfrastructureError::General(message) => DomainError::internal(message),
        }
    }
}
