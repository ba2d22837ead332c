//! Unit tests for domain error types

use chrono::{Duration, TimeZone, Utc};
use rw_shared::ConfigError;

use crate::errors::{AuthError, DomainError};

#[test]
fn test_account_locked_message_mentions_minutes() {
    let unlock_at = Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap();
    let error = AuthError::AccountLocked {
        minutes: 30,
        unlock_at,
    };
    assert!(error.to_string().contains("try again in 30 minutes"));
    assert_eq!(error.code(), "ACCOUNT_LOCKED");
}

#[test]
fn test_retry_after_for_lock_never_negative() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
    let error = AuthError::AccountLocked {
        minutes: 1,
        unlock_at: now + Duration::seconds(42),
    };
    assert_eq!(error.retry_after_seconds(now), 42);
    assert_eq!(error.retry_after_seconds(now + Duration::minutes(5)), 0);
}

#[test]
fn test_rate_limit_error() {
    let error = AuthError::RateLimitExceeded {
        retry_after_seconds: 17,
    };
    assert_eq!(error.code(), "RATE_LIMIT_EXCEEDED");
    assert_eq!(error.retry_after_seconds(Utc::now()), 17);
    assert!(error.to_string().contains("17 seconds"));
}

#[test]
fn test_bridged_errors() {
    let auth: DomainError = AuthError::RateLimitExceeded {
        retry_after_seconds: 1,
    }
    .into();
    assert!(matches!(auth, DomainError::Auth(_)));

    let config: DomainError = ConfigError::invalid("login.max_attempts", "must be at least 1").into();
    assert!(config.to_string().contains("login.max_attempts"));

    let json: DomainError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(matches!(json, DomainError::Serialization { .. }));
}

#[test]
fn test_storage_classification() {
    assert!(DomainError::storage("disk full").is_storage());
    assert!(!DomainError::internal("bug").is_storage());
}
