//! Security core startup and shutdown through `initialize`

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rw_core::{
    AuditEventType, AuditQuery, AuditStore, MockClock, RequestContext, SharedClock, MAX_ATTEMPTS,
};
use rw_infra::{
    initialize, initialize_with_clock, open_audit_store, DomainError, InfrastructureError,
};
use rw_shared::{AuditBackend, AuditConfig, DatabaseConfig, LoggingConfig, SecurityConfig};

fn clock() -> SharedClock {
    Arc::new(MockClock::new(
        Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap(),
    ))
}

fn sqlite_config(url: String) -> SecurityConfig {
    SecurityConfig {
        audit: AuditConfig::default(),
        database: DatabaseConfig::new(url),
        ..SecurityConfig::default()
    }
}

#[tokio::test]
async fn test_memory_backend_lifecycle() {
    let core = initialize(SecurityConfig::memory()).await.unwrap();
    let ctx = RequestContext::unknown();

    core.login_guard().record_failure("alice", &ctx).await.unwrap();
    let stats = core.store().get_statistics().await.unwrap();
    assert_eq!(stats.total_logs, 1);

    core.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_sqlite_backend_persists_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("audit.db").display());
    let ctx = RequestContext::new(Some("198.51.100.20"), None);

    {
        let core = initialize_with_clock(sqlite_config(url.clone()), clock())
            .await
            .unwrap();
        assert_eq!(core.config().audit.backend, AuditBackend::Sqlite);
        for _ in 0..MAX_ATTEMPTS {
            core.login_guard().record_failure("alice", &ctx).await.unwrap();
        }
        core.shutdown().await.unwrap();
    }

    // Lock state is process-local; the audit trail is not
    let core = initialize_with_clock(sqlite_config(url), clock())
        .await
        .unwrap();
    assert!(core.login_guard().check("alice").is_ok());

    let failures = core
        .store()
        .get_logs(&AuditQuery::new().event_type(AuditEventType::AuthLoginFailure))
        .await
        .unwrap();
    assert_eq!(failures.len(), MAX_ATTEMPTS as usize);
    assert_eq!(failures[0].ip_address, "198.51.100.20");
    core.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_throttle_through_initialized_core() {
    let mut config = SecurityConfig::memory();
    config.rate_limit = config.rate_limit.with_limit("tvdb", 1);
    let core = initialize_with_clock(config, clock()).await.unwrap();
    let ctx = RequestContext::unknown();

    core.throttle("tvdb", &ctx).await.unwrap();
    let err = core.throttle("tvdb", &ctx).await.unwrap_err();
    assert!(matches!(err, DomainError::Auth(_)));
}

#[tokio::test]
async fn test_invalid_config_fails_fast() {
    let mut config = SecurityConfig::memory();
    config.login.max_attempts = 0;

    let result = initialize(config).await;
    assert!(matches!(result, Err(InfrastructureError::Config(_))));
}

#[tokio::test]
async fn test_open_audit_store_rejects_bad_database_url() {
    let config = sqlite_config("postgres://localhost/audit".to_string());
    let result = open_audit_store(&config, clock()).await;
    assert!(matches!(result, Err(InfrastructureError::Config(_))));
}

#[test]
fn test_infrastructure_errors_map_to_storage() {
    let err: DomainError = InfrastructureError::Database(sqlx::Error::PoolClosed).into();
    assert!(err.is_storage());

    let err: DomainError = InfrastructureError::General("boom".to_string()).into();
    assert!(matches!(err, DomainError::Internal { .. }));
}

#[test]
fn test_telemetry_installs_once() {
    let config = LoggingConfig::default();
    rw_infra::init_telemetry(&config);
    // The global subscriber can only be set once per process
    assert!(!rw_infra::init_telemetry(&config));
}
