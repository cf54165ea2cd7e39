//! Scripted source adapters
//!
//! Deterministic stand-ins for corpus backends: fixed results, errors,
//! slow calls and panics, without any network or storage.

use async_trait::async_trait;
use lexweave::{CandidateResult, Concept, QueryContext, SourceAdapter, SourceError, SourceType};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a scripted adapter does when searched.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Return these candidates (truncated to the requested limit)
    Return(Vec<CandidateResult>),
    /// Fail every call
    Fail,
    /// Sleep before returning nothing
    Sleep(Duration),
    /// Panic inside the call
    Panic,
}

pub struct ScriptedAdapter {
    id: String,
    source_type: SourceType,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn new(id: &str, source_type: SourceType, behavior: Behavior) -> Self {
        Self {
            id: id.to_string(),
            source_type,
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    /// An adapter returning `count` candidates with descending scores.
    pub fn returning(id: &str, source_type: SourceType, count: usize) -> Self {
        Self::new(
            id,
            source_type,
            Behavior::Return(super::ranked_results(id, source_type, 0.9, 0.05, count)),
        )
    }

    pub fn failing(id: &str, source_type: SourceType) -> Self {
        Self::new(id, source_type, Behavior::Fail)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    async fn is_available(&self) -> bool {
        !matches!(self.behavior, Behavior::Fail)
    }

    async fn search(
        &self,
        _query: &str,
        _concepts: &[Concept],
        _context: &QueryContext,
        limit: usize,
    ) -> Result<Vec<CandidateResult>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Return(results) => Ok(results.iter().take(limit).cloned().collect()),
            Behavior::Fail => Err(SourceError::Backend(format!("{} always fails", self.id))),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(Vec::new())
            }
            Behavior::Panic => panic!("{} panicked", self.id),
        }
    }
}
