//! Tests for audit store implementations
