//! Process-local audit store.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::clock::{Clock, SharedClock, SystemClock};
use crate::domain::entities::audit::{
    AuditEvent, AuditEventType, AuditLogEntry, AuditQuery, AuditStatistics,
};
use crate::errors::DomainResult;
use crate::sync::lock;

use super::AuditStore;

#[derive(Debug, Default)]
struct MemoryState {
    entries: Vec<AuditLogEntry>,
    last_id: i64,
}

/// Audit store backed by a vector; contents are lost when the process exits
#[derive(Debug)]
pub struct InMemoryAuditStore {
    state: Mutex<MemoryState>,
    clock: SharedClock,
}

impl InMemoryAuditStore {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            clock,
        }
    }

    /// Store stamped with wall-clock time
    pub fn with_system_clock() -> Self {
        Self::new(SystemClock::shared())
    }

    /// Copy of every entry in insertion order
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        lock(&self.state).entries.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryAuditStore {
    fn default() -> Self {
        Self::with_system_clock()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn log_event(&self, event: AuditEvent) -> DomainResult<i64> {
        let mut state = lock(&self.state);
        // Id and timestamp are assigned together so ordering is consistent
        state.last_id += 1;
        let id = state.last_id;
        let timestamp = self.clock.now();
        debug!(id, event_type = %event.event_type, "Audit event stored in memory");
        state
            .entries
            .push(AuditLogEntry::from_event(id, timestamp, event));
        Ok(id)
    }

    async fn get_logs(&self, query: &AuditQuery) -> DomainResult<Vec<AuditLogEntry>> {
        let state = lock(&self.state);
        let mut result: Vec<AuditLogEntry> = state
            .entries
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect();
        drop(state);

        result.sort_by(AuditLogEntry::newest_first);
        result.truncate(query.limit);
        Ok(result)
    }

    async fn get_statistics(&self) -> DomainResult<AuditStatistics> {
        let state = lock(&self.state);
        Ok(AuditStatistics::from_entries(&state.entries))
    }

    async fn cleanup_old_logs(
        &self,
        before: DateTime<Utc>,
        keep: &[AuditEventType],
    ) -> DomainResult<u64> {
        let mut state = lock(&self.state);
        let original = state.entries.len();
        state
            .entries
            .retain(|entry| entry.timestamp >= before || keep.contains(&entry.event_type));
        let removed = (original - state.entries.len()) as u64;
        debug!(removed, "Old audit entries removed from memory");
        Ok(removed)
    }
}
