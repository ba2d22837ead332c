//! Tests for stored timestamp text

use chrono::{TimeZone, Utc};

use crate::database::sqlite::audit_store::{format_timestamp, parse_timestamp};

#[test]
fn test_format_is_fixed_width_utc() {
    let ts = Utc.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap();
    assert_eq!(format_timestamp(ts), "2026-01-15T08:00:00.000000Z");
}

#[test]
fn test_text_order_matches_time_order() {
    let earlier = Utc.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap();
    let later = earlier + chrono::Duration::microseconds(1);
    assert!(format_timestamp(earlier) < format_timestamp(later));
}

#[test]
fn test_parse_round_trips_stored_text() {
    let ts = Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 59).unwrap()
        + chrono::Duration::microseconds(123_456);
    assert_eq!(parse_timestamp(&format_timestamp(ts)).unwrap(), ts);
}

#[test]
fn test_parse_accepts_sqlite_default_format() {
    let parsed = parse_timestamp("2026-01-15 08:30:00").unwrap();
    assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 1, 15, 8, 30, 0).unwrap());
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(parse_timestamp("yesterday").is_err());
}

#[tokio::test]
async fn test_column_default_matches_bound_format() {
    use rw_shared::DatabaseConfig;

    use crate::database::{ensure_schema, DatabasePool};

    let pool = DatabasePool::new(DatabaseConfig::in_memory()).await.unwrap();
    ensure_schema(pool.get_pool()).await.unwrap();

    sqlx::query("INSERT INTO audit_logs (event_type) VALUES ('API_CALL')")
        .execute(pool.get_pool())
        .await
        .unwrap();
    let raw: String = sqlx::query_scalar("SELECT timestamp FROM audit_logs")
        .fetch_one(pool.get_pool())
        .await
        .unwrap();

    let parsed = parse_timestamp(&raw).unwrap();
    assert_eq!(raw.len(), format_timestamp(parsed).len());
    assert_eq!(raw, format_timestamp(parsed));
    // A bound value one day older sorts before the defaulted row
    assert!(format_timestamp(parsed - chrono::Duration::days(1)) < raw);
}
