//! Common test utilities for orchestrator integration tests
//!
//! Scripted source adapters and concept builders shared by the test binaries.

#![allow(dead_code)]

pub mod adapters;
pub mod fixtures;

pub use adapters::{Behavior, ScriptedAdapter};
pub use fixtures::{concept, corpus_orchestrator, orchestrator_with, procedural, ranked_results};
