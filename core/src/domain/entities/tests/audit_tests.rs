//! Tests for the audit entities

use chrono::{Duration, TimeZone, Utc};
use serde::Serialize;
use serde_json::json;

use crate::domain::entities::audit::{
    AuditCategory, AuditEvent, AuditEventType, AuditLogEntry, AuditQuery, AuditSeverity,
    AuditStatistics, DEFAULT_QUERY_LIMIT,
};
use crate::domain::value_objects::RequestContext;

fn entry(id: i64, event: AuditEvent, minutes_ago: i64) -> AuditLogEntry {
    let base = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
    AuditLogEntry::from_event(id, base - Duration::minutes(minutes_ago), event)
}

#[test]
fn test_event_type_string_round_trip() {
    for event_type in AuditEventType::ALL {
        let parsed: AuditEventType = event_type.as_str().parse().unwrap();
        assert_eq!(parsed, event_type);
    }
    assert!("LOGIN_SUCCESS".parse::<AuditEventType>().is_err());
}

#[test]
fn test_event_type_serializes_as_stored_string() {
    let value = serde_json::to_value(AuditEventType::SecurityRateLimitAbuse).unwrap();
    assert_eq!(value, json!("SECURITY_RATE_LIMIT_ABUSE"));
}

#[test]
fn test_category_and_severity() {
    assert_eq!(
        AuditEventType::ConfigFeedToggle.category(),
        AuditCategory::Configuration
    );
    assert_eq!(AuditEventType::ApiKeyRevoke.category(), AuditCategory::Api);
    assert_eq!(
        AuditEventType::SecurityRateLimitAbuse.severity(),
        AuditSeverity::Critical
    );
    assert_eq!(
        AuditEventType::AuthLoginFailure.severity(),
        AuditSeverity::Warning
    );
    assert_eq!(AuditEventType::ApiCall.severity(), AuditSeverity::Info);
}

#[test]
fn test_new_event_defaults() {
    let event = AuditEvent::new(AuditEventType::AuthLoginFailure);
    assert_eq!(event.ip_address, "unknown");
    assert_eq!(event.user_agent, "unknown");
    assert!(event.details.is_empty());
    assert!(!event.success);

    assert!(AuditEvent::new(AuditEventType::UserCreate).success);
}

#[test]
fn test_builder_pattern() {
    let ctx = RequestContext::new(Some("192.168.1.1"), Some("Mozilla/5.0"));
    let event = AuditEvent::new(AuditEventType::AuthLoginSuccess)
        .with_user_id("42")
        .with_username("alice")
        .with_request_context(&ctx)
        .with_detail("method", "password")
        .with_success(true);

    assert_eq!(event.user_id.as_deref(), Some("42"));
    assert_eq!(event.username.as_deref(), Some("alice"));
    assert_eq!(event.ip_address, "192.168.1.1");
    assert_eq!(event.user_agent, "Mozilla/5.0");
    assert_eq!(event.details["method"], json!("password"));
}

#[test]
fn test_struct_details_are_flattened() {
    #[derive(Serialize)]
    struct Toggle {
        source: &'static str,
        enabled: bool,
    }

    let event = AuditEvent::new(AuditEventType::ConfigSourceToggle).with_details(&Toggle {
        source: "anilist",
        enabled: false,
    });
    assert_eq!(event.details["source"], json!("anilist"));
    assert_eq!(event.details["enabled"], json!(false));
}

#[test]
fn test_non_object_details_degrade_to_empty() {
    let event = AuditEvent::new(AuditEventType::DataCollection).with_details(&vec![1, 2, 3]);
    assert!(event.details.is_empty());

    let event = AuditEvent::new(AuditEventType::DataCollection).with_details("just text");
    assert!(event.details.is_empty());
}

#[test]
fn test_query_filters_are_conjunctive() {
    let alice_fail = entry(
        1,
        AuditEvent::new(AuditEventType::AuthLoginFailure).with_username("alice"),
        10,
    );
    let bob_fail = entry(
        2,
        AuditEvent::new(AuditEventType::AuthLoginFailure).with_username("bob"),
        5,
    );

    let query = AuditQuery::new().username("alice").success(false);
    assert!(query.matches(&alice_fail));
    assert!(!query.matches(&bob_fail));

    let since = alice_fail.timestamp + Duration::minutes(1);
    let query = AuditQuery::new().since(since);
    assert!(!query.matches(&alice_fail));
    assert!(query.matches(&bob_fail));

    let query = AuditQuery::new().event_type(AuditEventType::AuthLoginSuccess);
    assert!(!query.matches(&alice_fail));
}

#[test]
fn test_query_defaults() {
    let query = AuditQuery::default();
    assert_eq!(query.limit, DEFAULT_QUERY_LIMIT);
    assert_eq!(query.limit, 100);

    let failures = AuditQuery::recent_failures(Some("carol"), 10);
    assert_eq!(failures.success, Some(false));
    assert_eq!(failures.username.as_deref(), Some("carol"));
    assert_eq!(failures.limit, 10);
}

#[test]
fn test_newest_first_breaks_ties_by_id() {
    let a = entry(1, AuditEvent::new(AuditEventType::ApiCall), 0);
    let b = entry(2, AuditEvent::new(AuditEventType::ApiCall), 0);
    let c = entry(3, AuditEvent::new(AuditEventType::ApiCall), 30);
    let mut entries = vec![c.clone(), a.clone(), b.clone()];
    entries.sort_by(AuditLogEntry::newest_first);
    let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![2, 1, 3]);
}

#[test]
fn test_statistics_from_entries() {
    let entries = vec![
        entry(1, AuditEvent::new(AuditEventType::AuthLoginSuccess), 2),
        entry(2, AuditEvent::new(AuditEventType::AuthLoginFailure), 1),
    ];
    let stats = AuditStatistics::from_entries(&entries);
    assert_eq!(stats.total_logs, 2);
    assert_eq!(stats.success_count, 1);
    assert_eq!(stats.failure_count, 1);
    assert_eq!(stats.success_rate, 50.0);
    assert_eq!(stats.count_for(AuditEventType::AuthLoginFailure), 1);
    assert_eq!(stats.count_for(AuditEventType::ApiCall), 0);
}

#[test]
fn test_empty_statistics() {
    let stats = AuditStatistics::from_entries(std::iter::empty());
    assert_eq!(stats.total_logs, 0);
    assert_eq!(stats.success_rate, 0.0);
    assert!(stats.event_type_counts.is_empty());
}
