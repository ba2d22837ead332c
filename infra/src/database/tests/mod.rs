//! Unit tests for the database layer

mod timestamp_tests;
