//! Tests for domain entities

mod audit_tests;
