//! SQLite implementation of the audit store

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rw_core::domain::entities::audit::{
    AuditDetails, AuditEvent, AuditEventType, AuditLogEntry, AuditQuery, AuditStatistics, UNKNOWN,
};
use rw_core::{AuditStore, Clock, DomainError, DomainResult, SharedClock};
use rw_shared::DatabaseConfig;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};
use tokio::sync::Mutex;

use crate::database::{ensure_schema, DatabasePool};
use crate::InfrastructureError;

const SELECT_COLUMNS: &str = "SELECT id, event_type, user_id, username, ip_address, user_agent, \
     timestamp, details, success FROM audit_logs";

/// Audit store persisted in the `audit_logs` table
///
/// Every write runs in its own transaction. Timestamps come from the
/// injected clock and are stored as RFC 3339 text with microsecond
/// precision, so text order matches time order. Writers from one store
/// are serialised so id order and timestamp order agree.
pub struct SqliteAuditStore {
    pool: DatabasePool,
    clock: SharedClock,
    write_lock: Mutex<()>,
}

/// Store used when audit entries must outlive the process
pub type PersistentAuditStore = SqliteAuditStore;

impl SqliteAuditStore {
    /// Wrap an open pool, creating the schema if needed
    pub async fn new(pool: DatabasePool, clock: SharedClock) -> Result<Self, InfrastructureError> {
        ensure_schema(pool.get_pool()).await?;
        Ok(Self {
            pool,
            clock,
            write_lock: Mutex::new(()),
        })
    }

    /// Open a pool for `config` and wrap it
    pub async fn connect(
        config: DatabaseConfig,
        clock: SharedClock,
    ) -> Result<Self, InfrastructureError> {
        let pool = DatabasePool::new(config).await?;
        Self::new(pool, clock).await
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Convert database row to AuditLogEntry entity
    fn row_to_entry(row: &SqliteRow) -> DomainResult<AuditLogEntry> {
        let event_type: String = row.try_get("event_type").map_err(column_error("event_type"))?;
        let timestamp: String = row.try_get("timestamp").map_err(column_error("timestamp"))?;
        let details: Option<String> = row.try_get("details").map_err(column_error("details"))?;
        let ip_address: Option<String> =
            row.try_get("ip_address").map_err(column_error("ip_address"))?;
        let user_agent: Option<String> =
            row.try_get("user_agent").map_err(column_error("user_agent"))?;
        let success: Option<bool> = row.try_get("success").map_err(column_error("success"))?;

        let id: i64 = row.try_get("id").map_err(column_error("id"))?;
        Ok(AuditLogEntry {
            id,
            event_type: event_type.parse::<AuditEventType>()?,
            user_id: row.try_get("user_id").map_err(column_error("user_id"))?,
            username: row.try_get("username").map_err(column_error("username"))?,
            ip_address: ip_address.unwrap_or_else(|| UNKNOWN.to_string()),
            user_agent: user_agent.unwrap_or_else(|| UNKNOWN.to_string()),
            timestamp: parse_timestamp(&timestamp)?,
            details: parse_details(id, details.as_deref()),
            success: success.unwrap_or(true),
        })
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn log_event(&self, event: AuditEvent) -> DomainResult<i64> {
        let details = serde_json::to_string(&event.details)?;
        let _writer = self.write_lock.lock().await;

        // Dropping the transaction without commit rolls the insert back
        let mut tx = self
            .pool
            .get_pool()
            .begin()
            .await
            .map_err(storage_error("begin audit transaction"))?;
        let timestamp = self.clock.now();

        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (
                event_type, user_id, username, ip_address, user_agent,
                timestamp, details, success
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.event_type.as_str())
        .bind(&event.user_id)
        .bind(&event.username)
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(format_timestamp(timestamp))
        .bind(details)
        .bind(event.success)
        .execute(&mut *tx)
        .await
        .map_err(storage_error("insert audit log"))?;

        tx.commit()
            .await
            .map_err(storage_error("commit audit log"))?;

        let id = result.last_insert_rowid();
        tracing::debug!(id, event_type = %event.event_type, "Audit event persisted");
        Ok(id)
    }

    async fn get_logs(&self, query: &AuditQuery) -> DomainResult<Vec<AuditLogEntry>> {
        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
        builder.push(" WHERE 1 = 1");

        if let Some(event_type) = query.event_type {
            builder.push(" AND event_type = ").push_bind(event_type.as_str());
        }
        if let Some(ref user_id) = query.user_id {
            builder.push(" AND user_id = ").push_bind(user_id.clone());
        }
        if let Some(ref username) = query.username {
            builder.push(" AND username = ").push_bind(username.clone());
        }
        if let Some(success) = query.success {
            builder.push(" AND success = ").push_bind(success);
        }
        if let Some(start_date) = query.start_date {
            builder
                .push(" AND timestamp >= ")
                .push_bind(format_timestamp(start_date));
        }

        builder
            .push(" ORDER BY timestamp DESC, id DESC LIMIT ")
            .push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX));

        let rows = builder
            .build()
            .fetch_all(self.pool.get_pool())
            .await
            .map_err(storage_error("query audit logs"))?;

        rows.iter()
            .map(Self::row_to_entry)
            .collect::<Result<Vec<_>, _>>()
    }

    async fn get_statistics(&self) -> DomainResult<AuditStatistics> {
        // Both reads see the same snapshot
        let mut tx = self
            .pool
            .get_pool()
            .begin()
            .await
            .map_err(storage_error("begin statistics transaction"))?;

        let (total, successes): (i64, Option<i64>) = sqlx::query_as(
            "SELECT COUNT(*), SUM(CASE WHEN success THEN 1 ELSE 0 END) FROM audit_logs",
        )
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error("count audit logs"))?;

        let per_type: Vec<(String, i64)> =
            sqlx::query_as("SELECT event_type, COUNT(*) FROM audit_logs GROUP BY event_type")
                .fetch_all(&mut *tx)
                .await
                .map_err(storage_error("count audit logs by type"))?;

        tx.commit()
            .await
            .map_err(storage_error("finish statistics transaction"))?;

        let event_type_counts: BTreeMap<String, u64> = per_type
            .into_iter()
            .map(|(event_type, count)| (event_type, count.max(0) as u64))
            .collect();

        Ok(AuditStatistics::from_counts(
            total.max(0) as u64,
            successes.unwrap_or(0).max(0) as u64,
            event_type_counts,
        ))
    }

    async fn cleanup_old_logs(
        &self,
        before: DateTime<Utc>,
        keep: &[AuditEventType],
    ) -> DomainResult<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM audit_logs WHERE timestamp < ");
        builder.push_bind(format_timestamp(before));

        if !keep.is_empty() {
            builder.push(" AND event_type NOT IN (");
            let mut kept = builder.separated(", ");
            for event_type in keep {
                kept.push_bind(event_type.as_str());
            }
            kept.push_unseparated(")");
        }

        let result = builder
            .build()
            .execute(self.pool.get_pool())
            .await
            .map_err(storage_error("delete old audit logs"))?;

        let removed = result.rows_affected();
        tracing::info!(removed, before = %before, "Old audit logs removed");
        Ok(removed)
    }

    async fn close(&self) -> DomainResult<()> {
        self.pool.close().await;
        Ok(())
    }
}

fn storage_error(action: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        tracing::error!(error = %e, action, "Audit store operation failed");
        DomainError::storage(format!("Failed to {}: {}", action, e))
    }
}

fn column_error(column: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| DomainError::Internal {
        message: format!("Failed to get {}: {}", column, e),
    }
}

pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse stored text; rows written with the column default use SQLite's format
pub(crate) fn parse_timestamp(raw: &str) -> DomainResult<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| DomainError::Serialization {
            message: format!("invalid audit timestamp '{}': {}", raw, e),
        })
}

fn parse_details(id: i64, raw: Option<&str>) -> AuditDetails {
    let Some(raw) = raw else {
        return AuditDetails::new();
    };
    match serde_json::from_str::<AuditDetails>(raw) {
        Ok(details) => details,
        Err(e) => {
            tracing::warn!(id, error = %e, "Stored audit details are not a JSON object");
            AuditDetails::new()
        }
    }
}
