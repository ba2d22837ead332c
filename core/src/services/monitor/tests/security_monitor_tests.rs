//! Tests for composite alert correlation

use std::sync::Arc;

use chrono::Duration;
use rw_shared::{MonitorConfig, MonitorRule};
use serde_json::json;

use crate::clock::{Clock, MockClock};
use crate::domain::entities::audit::AuditEventType;
use crate::domain::entities::violation::ViolationKind;
use crate::domain::value_objects::RequestContext;
use crate::services::auth::tests::mocks::{mock_clock, FlakyAuditStore};
use crate::services::auth::RateLimiter;
use crate::services::monitor::{SecurityMonitor, REPEATED_LOCKOUT_REASON};

fn monitor() -> (
    Arc<MockClock>,
    Arc<FlakyAuditStore>,
    SecurityMonitor<FlakyAuditStore>,
) {
    let clock = mock_clock();
    let store = Arc::new(FlakyAuditStore::new(clock.clone()));
    let monitor = SecurityMonitor::with_defaults(store.clone(), clock.clone());
    (clock, store, monitor)
}

async fn violate(
    monitor: &SecurityMonitor<FlakyAuditStore>,
    kind: ViolationKind,
    key: &str,
    times: usize,
) -> Vec<Option<i64>> {
    let mut results = Vec::new();
    for _ in 0..times {
        results.push(
            monitor
                .record_violation(kind, key, &RequestContext::unknown())
                .await
                .unwrap(),
        );
    }
    results
}

#[tokio::test]
async fn test_fifth_violation_raises_one_alert() {
    let (_clock, store, monitor) = monitor();

    let results = violate(&monitor, ViolationKind::RateLimit, "anilist", 5).await;
    assert!(results[..4].iter().all(Option::is_none));
    let id = results[4].expect("alert id");

    let alerts = store.entries_of(AuditEventType::SecurityRateLimitAbuse);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].id, id);
    assert_eq!(alerts[0].details["key"], json!("anilist"));
    assert_eq!(alerts[0].details["violations"], json!(5));
    assert_eq!(alerts[0].details["window_seconds"], json!(300));
    assert!(!alerts[0].success);
}

#[tokio::test]
async fn test_one_alert_per_window() {
    let (clock, store, monitor) = monitor();

    violate(&monitor, ViolationKind::RateLimit, "anilist", 5).await;
    clock.advance(Duration::seconds(10));
    let more = violate(&monitor, ViolationKind::RateLimit, "anilist", 10).await;
    assert!(more.iter().all(Option::is_none));
    assert_eq!(store.entries_of(AuditEventType::SecurityRateLimitAbuse).len(), 1);

    // Sustained abuse after the cooldown alerts again
    clock.advance(Duration::seconds(295));
    let later = violate(&monitor, ViolationKind::RateLimit, "anilist", 1).await;
    assert!(later[0].is_some());
    assert_eq!(store.entries_of(AuditEventType::SecurityRateLimitAbuse).len(), 2);
}

#[tokio::test]
async fn test_quiet_period_restarts_burst() {
    let (clock, store, monitor) = monitor();

    violate(&monitor, ViolationKind::RateLimit, "gmail", 4).await;
    clock.advance(Duration::seconds(301));
    let results = violate(&monitor, ViolationKind::RateLimit, "gmail", 4).await;
    assert!(results.iter().all(Option::is_none));
    assert!(store.entries().is_empty());

    let snapshot = monitor.violation_snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].count, 4);
    assert_eq!(snapshot[0].total, 4);
}

#[tokio::test]
async fn test_violations_spread_past_window_do_not_alert() {
    let (clock, store, monitor) = monitor();

    // Never more than 300s apart, but no five of them fit in one window
    for _ in 0..4 {
        violate(&monitor, ViolationKind::RateLimit, "rss", 1).await;
        clock.advance(Duration::seconds(240));
    }
    let last = violate(&monitor, ViolationKind::RateLimit, "rss", 1).await;
    assert!(last[0].is_none());
    assert!(store.entries().is_empty());

    // Violations at 720s and 960s are the only ones inside the window
    let snapshot = monitor.violation_snapshot();
    assert_eq!(snapshot[0].count, 2);
    assert_eq!(snapshot[0].total, 5);
    assert_eq!(snapshot[0].first_seen, clock.now() - Duration::seconds(240));
}

#[tokio::test]
async fn test_violations_inside_window_alert() {
    let (clock, store, monitor) = monitor();

    for _ in 0..4 {
        violate(&monitor, ViolationKind::RateLimit, "rss", 1).await;
        clock.advance(Duration::seconds(60));
    }
    let last = violate(&monitor, ViolationKind::RateLimit, "rss", 1).await;
    assert!(last[0].is_some());

    let alerts = store.entries_of(AuditEventType::SecurityRateLimitAbuse);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].details["violations"], json!(5));
    let first_seen = (clock.now() - Duration::seconds(240)).to_rfc3339();
    assert_eq!(alerts[0].details["first_seen"], json!(first_seen));
}

#[tokio::test]
async fn test_window_slides_over_oldest_violation() {
    let (clock, store, monitor) = monitor();

    violate(&monitor, ViolationKind::RateLimit, "gmail", 1).await;
    clock.advance(Duration::seconds(200));
    violate(&monitor, ViolationKind::RateLimit, "gmail", 3).await;
    // The first violation leaves the window exactly at 300s
    clock.advance(Duration::seconds(100));
    let results = violate(&monitor, ViolationKind::RateLimit, "gmail", 1).await;
    assert!(results[0].is_none());
    assert!(store.entries().is_empty());

    let results = violate(&monitor, ViolationKind::RateLimit, "gmail", 1).await;
    assert!(results[0].is_some());
}

#[tokio::test]
async fn test_repeated_lockout_alert() {
    let (clock, store, monitor) = monitor();
    let ctx = RequestContext::new(Some("198.51.100.4"), None);

    for _ in 0..2 {
        let unlock_at = clock.now() + Duration::minutes(30);
        assert!(monitor
            .observe_lockout("mallory", unlock_at, &ctx)
            .await
            .unwrap()
            .is_none());
        clock.advance(Duration::minutes(20));
    }
    let unlock_at = clock.now() + Duration::minutes(30);
    let id = monitor
        .observe_lockout("mallory", unlock_at, &ctx)
        .await
        .unwrap();
    assert!(id.is_some());

    let alerts = store.entries_of(AuditEventType::SecuritySuspiciousActivity);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].username.as_deref(), Some("mallory"));
    assert_eq!(alerts[0].ip_address, "198.51.100.4");
    assert_eq!(alerts[0].details["reason"], json!(REPEATED_LOCKOUT_REASON));
    assert_eq!(alerts[0].details["unlock_at"], json!(unlock_at.to_rfc3339()));
}

#[tokio::test]
async fn test_kinds_and_keys_are_independent() {
    let (_clock, store, monitor) = monitor();

    violate(&monitor, ViolationKind::RateLimit, "alice", 4).await;
    violate(&monitor, ViolationKind::Lockout, "alice", 2).await;
    violate(&monitor, ViolationKind::RateLimit, "bob", 4).await;
    assert!(store.entries().is_empty());

    let snapshot = monitor.violation_snapshot();
    let keys: Vec<(ViolationKind, &str)> =
        snapshot.iter().map(|r| (r.kind, r.key.as_str())).collect();
    assert_eq!(
        keys,
        vec![
            (ViolationKind::RateLimit, "alice"),
            (ViolationKind::RateLimit, "bob"),
            (ViolationKind::Lockout, "alice"),
        ]
    );
}

#[tokio::test]
async fn test_failed_alert_is_retried() {
    let (_clock, store, monitor) = monitor();

    violate(&monitor, ViolationKind::RateLimit, "anilist", 4).await;
    store.set_failing(true);
    let err = monitor
        .record_violation(ViolationKind::RateLimit, "anilist", &RequestContext::unknown())
        .await
        .unwrap_err();
    assert!(err.is_storage());

    store.set_failing(false);
    let retried = violate(&monitor, ViolationKind::RateLimit, "anilist", 1).await;
    assert!(retried[0].is_some());
    let alerts = store.entries_of(AuditEventType::SecurityRateLimitAbuse);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].details["violations"], json!(6));
}

#[tokio::test]
async fn test_guard_request_counts_rejections() {
    let (clock, _store, monitor) = monitor();
    let limiter = RateLimiter::with_defaults(clock.clone());
    let ctx = RequestContext::unknown();

    assert!(monitor.guard_request(&limiter, "gmail", 2, &ctx).await.unwrap());
    assert!(monitor.guard_request(&limiter, "gmail", 2, &ctx).await.unwrap());
    assert!(!monitor.guard_request(&limiter, "gmail", 2, &ctx).await.unwrap());

    let snapshot = monitor.violation_snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].kind, ViolationKind::RateLimit);
    assert_eq!(snapshot[0].key, "gmail");
    assert_eq!(snapshot[0].count, 1);
}

#[tokio::test]
async fn test_reset_and_pruning() {
    let (clock, _store, monitor) = monitor();

    violate(&monitor, ViolationKind::RateLimit, "anilist", 2).await;
    assert!(monitor.reset(ViolationKind::RateLimit, "anilist"));
    assert!(!monitor.reset(ViolationKind::RateLimit, "anilist"));

    violate(&monitor, ViolationKind::RateLimit, "gmail", 1).await;
    clock.advance(Duration::seconds(301));
    assert!(monitor.violation_snapshot().is_empty());
}

#[tokio::test]
async fn test_custom_thresholds() {
    let clock = mock_clock();
    let store = Arc::new(FlakyAuditStore::new(clock.clone()));
    let config = MonitorConfig {
        rate_limit: MonitorRule::new(2, 60),
        ..Default::default()
    };
    let monitor = SecurityMonitor::new(store.clone(), config, clock);

    let results = violate(&monitor, ViolationKind::RateLimit, "api", 2).await;
    assert!(results[1].is_some());
}
