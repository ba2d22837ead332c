//! Audit store trait defining the interface for audit log persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::audit::{
    AuditEvent, AuditEventType, AuditLogEntry, AuditQuery, AuditStatistics,
};
use crate::errors::DomainResult;

/// Append-only store of structured security events
///
/// Implementations assign a strictly increasing id and stamp the entry with
/// their own clock when an event is accepted. Entries are never modified
/// after they are written; readers receive copies. Which implementation is
/// used is decided by whoever constructs the security core.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist an event
    ///
    /// # Returns
    /// * `Ok(id)` of the new entry
    /// * `Err(DomainError::Storage)` if the backend rejected the write
    async fn log_event(&self, event: AuditEvent) -> DomainResult<i64>;

    /// Entries matching every filter in `query`, newest first, at most `query.limit`
    async fn get_logs(&self, query: &AuditQuery) -> DomainResult<Vec<AuditLogEntry>>;

    /// Failed events, optionally restricted to one username, newest first
    async fn get_recent_failures(
        &self,
        username: Option<&str>,
        limit: usize,
    ) -> DomainResult<Vec<AuditLogEntry>> {
        self.get_logs(&AuditQuery::recent_failures(username, limit))
            .await
    }

    /// Totals and per-event-type counts across the whole store
    async fn get_statistics(&self) -> DomainResult<AuditStatistics>;

    /// Delete entries older than `before` whose type is not listed in `keep`
    ///
    /// # Returns
    /// * Number of entries removed
    async fn cleanup_old_logs(
        &self,
        before: DateTime<Utc>,
        keep: &[AuditEventType],
    ) -> DomainResult<u64>;

    /// Release backend resources; further calls may fail
    async fn close(&self) -> DomainResult<()> {
        Ok(())
    }
}
