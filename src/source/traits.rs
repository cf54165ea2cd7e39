//! Source adapter contract
//!
//! Every corpus backend is reached through `SourceAdapter`. The orchestrator
//! imposes timeouts from outside, so adapters only need to be safe to call
//! concurrently with themselves.

use super::types::{CandidateResult, SourceType};
use crate::concept::Concept;
use crate::strategy::QueryContext;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from source adapter calls.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("invalid result: {0}")]
    InvalidResult(String),
    #[error("timed out after {0} ms")]
    TimedOut(u64),
}

/// The contract each corpus backend implements.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Unique identifier for this adapter
    fn id(&self) -> &str;

    /// Which corpus this adapter serves
    fn source_type(&self) -> SourceType;

    /// Cheap reachability probe used by health reporting.
    async fn is_available(&self) -> bool {
        true
    }

    /// Search the corpus for up to `limit` candidates.
    async fn search(
        &self,
        query: &str,
        concepts: &[Concept],
        context: &QueryContext,
        limit: usize,
    ) -> Result<Vec<CandidateResult>, SourceError>;
}

/// The two search tiers a foundation corpus exposes.
///
/// Wrapped by `TieredFoundationAdapter`, which tries `concept_search`
/// first and falls back to `text_search` when it yields nothing.
#[async_trait]
pub trait FoundationBackend: Send + Sync {
    fn id(&self) -> &str;

    async fn is_available(&self) -> bool {
        true
    }

    /// Semantic, concept-weighted search
    async fn concept_search(
        &self,
        query: &str,
        concepts: &[Concept],
        limit: usize,
    ) -> Result<Vec<CandidateResult>, SourceError>;

    /// Plain keyword search against the same corpus
    async fn text_search(&self, query: &str, limit: usize)
        -> Result<Vec<CandidateResult>, SourceError>;
}
