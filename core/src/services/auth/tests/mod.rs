//! Tests for authentication defense services
