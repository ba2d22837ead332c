//! Tests for domain error types

mod domain_error_tests;
