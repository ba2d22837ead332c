//! SQLite repository implementations

pub mod audit_store;

pub use audit_store::{PersistentAuditStore, SqliteAuditStore};
