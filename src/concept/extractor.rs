//! Concept extraction service contract
//!
//! The orchestrator consumes extraction through `ConceptExtractor`.
//! Two implementations ship with the crate:
//! - `StaticExtractor`: returns a preconfigured concept list (testing, fixed pipelines)
//! - `LexiconExtractor`: matches trigger phrases from a lexicon file

use super::types::{normalize_text, Concept, ConceptType};
use crate::strategy::QueryContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Errors from concept extraction.
///
/// The orchestrator never surfaces these; any error is treated as
/// "no concepts extracted".
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("concept extractor not available: {0}")]
    Unavailable(String),
    #[error("concept extraction failed: {0}")]
    Failed(String),
}

/// Client trait for the external concept classifier.
#[async_trait]
pub trait ConceptExtractor: Send + Sync {
    /// Unique identifier for this extractor
    fn id(&self) -> &str;

    /// Turn a query into typed concepts. May return an empty list.
    async fn extract(
        &self,
        query: &str,
        context: &QueryContext,
    ) -> Result<Vec<Concept>, ExtractionError>;
}

/// Returns the same concepts for every query.
pub struct StaticExtractor {
    concepts: Vec<Concept>,
    available: bool,
}

impl StaticExtractor {
    pub fn new(concepts: Vec<Concept>) -> Self {
        Self {
            concepts,
            available: true,
        }
    }

    /// An extractor that yields no concepts.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// An extractor that always reports itself unavailable.
    pub fn unavailable() -> Self {
        Self {
            concepts: Vec::new(),
            available: false,
        }
    }
}

#[async_trait]
impl ConceptExtractor for StaticExtractor {
    fn id(&self) -> &str {
        "static"
    }

    async fn extract(
        &self,
        _query: &str,
        _context: &QueryContext,
    ) -> Result<Vec<Concept>, ExtractionError> {
        if !self.available {
            return Err(ExtractionError::Unavailable(
                "static extractor configured as unavailable".to_string(),
            ));
        }
        Ok(self.concepts.clone())
    }
}

/// One lexicon entry: a concept emitted whenever any trigger occurs in the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub id: String,
    pub label: String,
    pub concept_type: ConceptType,
    #[serde(default)]
    pub domains: BTreeSet<String>,
    /// Phrases that activate this entry. The label itself always triggers.
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.8
}

#[derive(Debug, Default, Deserialize)]
struct LexiconFile {
    #[serde(default)]
    entries: Vec<LexiconEntry>,
}

/// Trigger-phrase concept extractor.
#[derive(Debug, Clone, Default)]
pub struct LexiconExtractor {
    entries: Vec<LexiconEntry>,
}

impl LexiconExtractor {
    pub fn new(entries: Vec<LexiconEntry>) -> Self {
        Self { entries }
    }

    /// Parse a lexicon from YAML (or JSON) text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ExtractionError> {
        let file: LexiconFile = serde_yaml::from_str(text)
            .map_err(|e| ExtractionError::Failed(format!("lexicon parse error: {}", e)))?;
        Ok(Self::new(file.entries))
    }

    pub fn load(path: &Path) -> Result<Self, ExtractionError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExtractionError::Unavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn matches(entry: &LexiconEntry, normalized_query: &str) -> bool {
        std::iter::once(&entry.label)
            .chain(entry.triggers.iter())
            .map(|t| normalize_text(t))
            .any(|t| !t.is_empty() && normalized_query.contains(&t))
    }
}

#[async_trait]
impl ConceptExtractor for LexiconExtractor {
    fn id(&self) -> &str {
        "lexicon"
    }

    async fn extract(
        &self,
        query: &str,
        _context: &QueryContext,
    ) -> Result<Vec<Concept>, ExtractionError> {
        let normalized = normalize_text(query);
        let concepts = self
            .entries
            .iter()
            .filter(|entry| Self::matches(entry, &normalized))
            .map(|entry| {
                let mut concept = Concept::new(&entry.id, &entry.label, entry.concept_type)
                    .with_confidence(entry.confidence);
                concept.semantic_domains = entry.domains.clone();
                concept
            })
            .collect();
        Ok(concepts)
    }
}
