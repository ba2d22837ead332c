//! Audit log storage configuration

use serde::{Deserialize, Serialize};

/// Which audit store the application wires up at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditBackend {
    /// Process-local store, lost on restart
    Memory,
    /// SQLite-backed store
    #[default]
    Sqlite,
}

/// What a login flow does when the audit write itself fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditFailurePolicy {
    /// Propagate the storage error; the login attempt is rejected
    #[default]
    FailClosed,
    /// Log the storage error and let the login outcome stand
    FailOpen,
}

/// Audit store settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    pub backend: AuditBackend,
    pub failure_policy: AuditFailurePolicy,
}

impl AuditConfig {
    /// In-memory store, fail-closed
    pub fn memory() -> Self {
        Self {
            backend: AuditBackend::Memory,
            ..Default::default()
        }
    }

    pub fn with_failure_policy(mut self, policy: AuditFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
