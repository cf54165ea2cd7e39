//! Two-tier foundation adapter
//!
//! Tier 1 is concept-weighted semantic search. When it yields nothing (or
//! fails), tier 2 runs a plain keyword search against the same corpus.
//! Only when both come back empty is the foundation result treated as empty.

use super::traits::{FoundationBackend, SourceAdapter, SourceError};
use super::types::{CandidateResult, SearchTier, SourceType};
use crate::concept::Concept;
use crate::strategy::QueryContext;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Adapts a `FoundationBackend` to the `SourceAdapter` contract.
pub struct TieredFoundationAdapter {
    backend: Arc<dyn FoundationBackend>,
}

impl TieredFoundationAdapter {
    pub fn new(backend: Arc<dyn FoundationBackend>) -> Self {
        Self { backend }
    }

    fn stamp(results: Vec<CandidateResult>, tier: SearchTier) -> Vec<CandidateResult> {
        results
            .into_iter()
            .map(|mut r| {
                r.metadata.search_tier = Some(tier);
                r
            })
            .collect()
    }
}

#[async_trait]
impl SourceAdapter for TieredFoundationAdapter {
    fn id(&self) -> &str {
        self.backend.id()
    }

    fn source_type(&self) -> SourceType {
        SourceType::Foundation
    }

    async fn is_available(&self) -> bool {
        self.backend.is_available().await
    }

    async fn search(
        &self,
        query: &str,
        concepts: &[Concept],
        _context: &QueryContext,
        limit: usize,
    ) -> Result<Vec<CandidateResult>, SourceError> {
        let semantic_error = match self.backend.concept_search(query, concepts, limit).await {
            Ok(results) if !results.is_empty() => {
                return Ok(Self::stamp(results, SearchTier::Semantic));
            }
            Ok(_) => None,
            Err(e) => {
                warn!(adapter = self.id(), error = %e, "semantic tier failed, trying keyword tier");
                Some(e)
            }
        };

        debug!(adapter = self.id(), "semantic tier empty, falling back to keyword search");
        match (self.backend.text_search(query, limit).await, semantic_error) {
            // An empty keyword tier does not hide a failed semantic tier
            (Ok(results), Some(first)) if results.is_empty() => Err(first),
            (Ok(results), _) => Ok(Self::stamp(results, SearchTier::Keyword)),
            (Err(e), None) => Err(e),
            (Err(e), Some(first)) => Err(SourceError::Backend(format!(
                "semantic: {}; keyword: {}",
                first, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedBackend {
        semantic: Result<Vec<CandidateResult>, SourceError>,
        keyword: Result<Vec<CandidateResult>, SourceError>,
        keyword_calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(
            semantic: Result<Vec<CandidateResult>, SourceError>,
            keyword: Result<Vec<CandidateResult>, SourceError>,
        ) -> Self {
            Self {
                semantic,
                keyword,
                keyword_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl FoundationBackend for ScriptedBackend {
        fn id(&self) -> &str {
            "scripted-foundation"
        }

        async fn concept_search(
            &self,
            _query: &str,
            _concepts: &[Concept],
            _limit: usize,
        ) -> Result<Vec<CandidateResult>, SourceError> {
            self.semantic.clone()
        }

        async fn text_search(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<CandidateResult>, SourceError> {
            self.keyword_calls.fetch_add(1, Ordering::SeqCst);
            self.keyword.clone()
        }
    }

    fn doc(id: &str) -> CandidateResult {
        CandidateResult::new("scripted-foundation", id, "text", 0.7, SourceType::Foundation)
    }

    // === Scenario: semantic tier answers, keyword tier never runs ===
    #[tokio::test]
    async fn semantic_hit_skips_keyword_tier() {
        let backend = Arc::new(ScriptedBackend::new(Ok(vec![doc("a")]), Ok(vec![doc("b")])));
        let adapter = TieredFoundationAdapter::new(backend.clone());

        let results = adapter
            .search("q", &[], &QueryContext::default(), 5)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content_ref, "a");
        assert_eq!(results[0].metadata.search_tier, Some(SearchTier::Semantic));
        assert_eq!(backend.keyword_calls.load(Ordering::SeqCst), 0);
    }

    // === Scenario: empty semantic tier falls back to keyword ===
    #[tokio::test]
    async fn empty_semantic_falls_back_to_keyword() {
        let backend = Arc::new(ScriptedBackend::new(Ok(vec![]), Ok(vec![doc("b")])));
        let adapter = TieredFoundationAdapter::new(backend.clone());

        let results = adapter
            .search("q", &[], &QueryContext::default(), 5)
            .await
            .unwrap();

        assert_eq!(results[0].content_ref, "b");
        assert_eq!(results[0].metadata.search_tier, Some(SearchTier::Keyword));
        assert_eq!(backend.keyword_calls.load(Ordering::SeqCst), 1);
    }

    // === Scenario: failing semantic tier still tries keyword ===
    #[tokio::test]
    async fn failing_semantic_falls_back_to_keyword() {
        let backend = Arc::new(ScriptedBackend::new(
            Err(SourceError::Backend("index offline".into())),
            Ok(vec![doc("c")]),
        ));
        let adapter = TieredFoundationAdapter::new(backend);

        let results = adapter
            .search("q", &[], &QueryContext::default(), 5)
            .await
            .unwrap();
        assert_eq!(results[0].content_ref, "c");
    }

    // === Scenario: failing semantic tier with an empty keyword tier ===
    #[tokio::test]
    async fn failing_semantic_with_empty_keyword_reports_error() {
        let backend = Arc::new(ScriptedBackend::new(
            Err(SourceError::Backend("semantic index offline".into())),
            Ok(vec![]),
        ));
        let adapter = TieredFoundationAdapter::new(backend.clone());

        let err = adapter
            .search("q", &[], &QueryContext::default(), 5)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("semantic index offline"));
        assert_eq!(backend.keyword_calls.load(Ordering::SeqCst), 1);
    }

    // === Scenario: both tiers fail ===
    #[tokio::test]
    async fn both_tiers_failing_reports_both_errors() {
        let backend = Arc::new(ScriptedBackend::new(
            Err(SourceError::Backend("index offline".into())),
            Err(SourceError::Unavailable("db down".into())),
        ));
        let adapter = TieredFoundationAdapter::new(backend);

        let err = adapter
            .search("q", &[], &QueryContext::default(), 5)
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("index offline"));
        assert!(msg.contains("db down"));
    }
}
