//! In-memory reference corpus
//!
//! A small token-overlap search backend. Serves as a primary `SourceAdapter`
//! or, wrapped in `TieredFoundationAdapter`, as a foundation corpus. Used by
//! the CLI and by tests; production corpora plug in through the same traits.

use super::traits::{FoundationBackend, SourceAdapter, SourceError};
use super::types::{CandidateResult, ResultMetadata, SourceType};
use crate::concept::{normalize_text, Concept};
use crate::strategy::QueryContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A document stored in an `InMemoryCorpus`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub content_ref: String,
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub citation: Option<String>,
    #[serde(default)]
    pub cultural_appropriateness: Option<f64>,
}

impl CorpusDocument {
    pub fn new(content_ref: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content_ref: content_ref.into(),
            content: content.into(),
            title: None,
            citation: None,
            cultural_appropriateness: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_cultural_appropriateness(mut self, value: f64) -> Self {
        self.cultural_appropriateness = Some(value);
        self
    }
}

#[derive(Debug, Deserialize)]
struct CorpusFile {
    id: String,
    source_type: SourceType,
    #[serde(default)]
    documents: Vec<CorpusDocument>,
}

/// Token-overlap search over a fixed document set.
#[derive(Debug, Clone)]
pub struct InMemoryCorpus {
    id: String,
    source_type: SourceType,
    documents: Vec<CorpusDocument>,
}

impl InMemoryCorpus {
    pub fn new(id: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            id: id.into(),
            source_type,
            documents: Vec::new(),
        }
    }

    pub fn with_document(mut self, document: CorpusDocument) -> Self {
        self.documents.push(document);
        self
    }

    /// Parse a corpus from YAML (or JSON) text.
    ///
    /// ```yaml
    /// id: labor-code
    /// source_type: primary
    /// documents:
    ///   - content_ref: art-74
    ///     content: "..."
    /// ```
    pub fn from_yaml_str(text: &str) -> Result<Self, SourceError> {
        let file: CorpusFile = serde_yaml::from_str(text)
            .map_err(|e| SourceError::Backend(format!("corpus parse error: {}", e)))?;
        Ok(Self {
            id: file.id,
            source_type: file.source_type,
            documents: file.documents,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SourceError::Unavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn source_type_of(&self) -> SourceType {
        self.source_type
    }

    fn to_candidate(&self, doc: &CorpusDocument, score: f64) -> CandidateResult {
        let mut metadata = ResultMetadata::new();
        metadata.title = doc.title.clone();
        metadata.citation = doc.citation.clone();
        metadata.cultural_appropriateness = doc.cultural_appropriateness;
        CandidateResult::new(&self.id, &doc.content_ref, &doc.content, score, self.source_type)
            .with_metadata(metadata)
    }

    /// Score every document, keep positives, best first.
    fn rank<F>(&self, limit: usize, score: F) -> Vec<CandidateResult>
    where
        F: Fn(&str) -> f64,
    {
        let mut scored: Vec<(f64, &CorpusDocument)> = self
            .documents
            .iter()
            .map(|doc| (score(&normalize_text(&doc.content)), doc))
            .filter(|(s, _)| *s > 0.0)
            .collect();
        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.content_ref.cmp(&b.1.content_ref))
        });
        scored
            .into_iter()
            .take(limit)
            .map(|(s, doc)| self.to_candidate(doc, s))
            .collect()
    }
}

/// Split normalized text into word tokens of at least two characters.
fn tokenize(text: &str) -> HashSet<String> {
    normalize_text(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

fn overlap_score(query_tokens: &HashSet<String>, normalized_content: &str) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let content_tokens = tokenize(normalized_content);
    let shared = query_tokens.intersection(&content_tokens).count();
    shared as f64 / query_tokens.len() as f64
}

fn concept_score(concepts: &[Concept], normalized_content: &str) -> f64 {
    if concepts.is_empty() {
        return 0.0;
    }
    let total: f64 = concepts
        .iter()
        .map(|c| {
            let label = normalize_text(&c.primary_label);
            let label_hit = !label.is_empty() && normalized_content.contains(&label);
            let domain_hit = c
                .semantic_domains
                .iter()
                .map(|d| normalize_text(d))
                .any(|d| !d.is_empty() && normalized_content.contains(&d));
            let hit = match (label_hit, domain_hit) {
                (true, _) => 1.0,
                (false, true) => 0.5,
                (false, false) => 0.0,
            };
            hit * c.confidence
        })
        .sum();
    total / concepts.len() as f64
}

#[async_trait]
impl SourceAdapter for InMemoryCorpus {
    fn id(&self) -> &str {
        &self.id
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }

    async fn search(
        &self,
        query: &str,
        concepts: &[Concept],
        _context: &QueryContext,
        limit: usize,
    ) -> Result<Vec<CandidateResult>, SourceError> {
        let query_tokens = tokenize(query);
        Ok(self.rank(limit, |content| {
            let lexical = overlap_score(&query_tokens, content);
            let conceptual = concept_score(concepts, content);
            (0.6 * lexical + 0.4 * conceptual).min(1.0)
        }))
    }
}

#[async_trait]
impl FoundationBackend for InMemoryCorpus {
    fn id(&self) -> &str {
        &self.id
    }

    async fn concept_search(
        &self,
        query: &str,
        concepts: &[Concept],
        limit: usize,
    ) -> Result<Vec<CandidateResult>, SourceError> {
        if concepts.is_empty() {
            return Ok(Vec::new());
        }
        let query_tokens = tokenize(query);
        Ok(self.rank(limit, |content| {
            let conceptual = concept_score(concepts, content);
            if conceptual == 0.0 {
                return 0.0;
            }
            (0.7 * conceptual + 0.3 * overlap_score(&query_tokens, content)).min(1.0)
        }))
    }

    async fn text_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateResult>, SourceError> {
        let query_tokens = tokenize(query);
        Ok(self.rank(limit, |content| overlap_score(&query_tokens, content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::ConceptType;

    fn corpus() -> InMemoryCorpus {
        InMemoryCorpus::new("labor-code", SourceType::Primary)
            .with_document(CorpusDocument::new(
                "art-74",
                "An employer may terminate the contract with notice",
            ))
            .with_document(CorpusDocument::new(
                "art-80",
                "Termination without notice for gross misconduct",
            ))
            .with_document(CorpusDocument::new("art-9", "Rules on annual leave"))
    }

    #[tokio::test]
    async fn search_ranks_by_token_overlap() {
        let results = corpus()
            .search("terminate contract notice", &[], &QueryContext::default(), 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content_ref, "art-74");
        assert!(results[0].raw_score > results[1].raw_score);
        assert!(results.iter().all(|r| r.source_type == SourceType::Primary));
    }

    #[tokio::test]
    async fn search_respects_limit() {
        let results = corpus()
            .search("notice", &[], &QueryContext::default(), 1)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn concept_search_requires_concept_match() {
        let foundation = InMemoryCorpus::new("doctrine", SourceType::Foundation)
            .with_document(
                CorpusDocument::new("d-1", "Justice requires paying the worker fairly")
                    .with_cultural_appropriateness(0.95),
            )
            .with_document(CorpusDocument::new("d-2", "Contracts must be honoured"));

        let concepts = vec![Concept::new("c", "justice", ConceptType::JusticePrinciple)];
        let results = foundation
            .concept_search("worker wages", &concepts, 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content_ref, "d-1");
        assert_eq!(results[0].metadata.cultural_appropriateness, Some(0.95));

        let none = foundation.concept_search("worker", &[], 5).await.unwrap();
        assert!(none.is_empty());

        let keyword = foundation.text_search("contracts", 5).await.unwrap();
        assert_eq!(keyword[0].content_ref, "d-2");
    }

    #[test]
    fn corpus_parses_from_yaml() {
        let corpus = InMemoryCorpus::from_yaml_str(
            r#"
id: doctrine
source_type: foundation
documents:
  - content_ref: d-1
    content: "العدل أساس الحكم"
    cultural_appropriateness: 0.9
"#,
        )
        .unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.source_type_of(), SourceType::Foundation);
    }

    #[test]
    fn tokenize_handles_arabic() {
        let tokens = tokenize("ما هي رسوم تقديم الطلب؟");
        assert!(tokens.contains("رسوم"));
        assert!(tokens.contains("الطلب"));
    }
}
