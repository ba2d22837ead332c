//! Domain entities representing core business objects.

pub mod audit;
pub mod lock;
pub mod violation;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use audit::{
    AuditCategory, AuditDetails, AuditEvent, AuditEventType, AuditLogEntry, AuditQuery,
    AuditSeverity, AuditStatistics, DEFAULT_QUERY_LIMIT, UNKNOWN,
};
pub use lock::{remaining_minutes, LockedAccount};
pub use violation::{ViolationKind, ViolationRecord};
