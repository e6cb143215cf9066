//! Integration tests for health-doc.
//!
//! These tests drive the engine with mock checks and the reporting layer
//! with temporary config files.

pub mod config_tests;
pub mod runner_tests;
