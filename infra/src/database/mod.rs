//! Database module - SQLite implementations using SQLx
//!
//! This module provides the database access layer including:
//! - Connection pool management
//! - Audit log schema creation
//! - The persistent audit store

pub mod connection;
pub mod schema;
pub mod sqlite;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use connection::{DatabasePool, PoolStatistics};
pub use schema::ensure_schema;
pub use sqlite::{PersistentAuditStore, SqliteAuditStore};
