//! Check execution engine.
//!
//! Provides safe single-check execution, registry selection, and result
//! aggregation.

pub mod orchestrator;
pub mod result;
pub mod runner;
