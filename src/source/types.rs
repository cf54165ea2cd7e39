//! Candidate results returned by source adapters
//!
//! A `CandidateResult` is immutable once it leaves the adapter boundary.
//! Metadata is a typed, versioned key set validated by `CandidateResult::validated`
//! before any downstream component reads it.

use super::traits::SourceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current version of the `ResultMetadata` key set.
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// Which corpus a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// The general statutory corpus, always searched
    Primary,
    /// The doctrinally distinct corpus, searched conditionally
    Foundation,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Foundation => write!(f, "foundation"),
        }
    }
}

/// How a foundation candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchTier {
    /// Concept-weighted semantic search
    Semantic,
    /// Plain keyword fallback
    Keyword,
}

fn current_schema_version() -> u32 {
    METADATA_SCHEMA_VERSION
}

/// Typed metadata attached to a candidate.
///
/// Version 1 keys:
/// - all sources: `title`, `citation`
/// - foundation only: `cultural_appropriateness` (0.0–1.0), `search_tier`
///
/// Anything else goes into `extra` and is never read by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_appropriateness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_tier: Option<SearchTier>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for ResultMetadata {
    fn default() -> Self {
        Self {
            schema_version: METADATA_SCHEMA_VERSION,
            title: None,
            citation: None,
            cultural_appropriateness: None,
            search_tier: None,
            extra: BTreeMap::new(),
        }
    }
}

impl ResultMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_citation(mut self, citation: impl Into<String>) -> Self {
        self.citation = Some(citation.into());
        self
    }

    pub fn with_cultural_appropriateness(mut self, value: f64) -> Self {
        self.cultural_appropriateness = Some(value);
        self
    }

    pub fn with_search_tier(mut self, tier: SearchTier) -> Self {
        self.search_tier = Some(tier);
        self
    }
}

/// A single piece of evidence returned by a source adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    /// Identifier of the adapter that produced this candidate
    pub source_id: String,
    /// Stable reference to the underlying document or passage (dedup key)
    pub content_ref: String,
    /// Passage text used for concept alignment and coverage
    pub content: String,
    pub raw_score: f64,
    pub source_type: SourceType,
    #[serde(default)]
    pub metadata: ResultMetadata,
}

impl CandidateResult {
    pub fn new(
        source_id: impl Into<String>,
        content_ref: impl Into<String>,
        content: impl Into<String>,
        raw_score: f64,
        source_type: SourceType,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            content_ref: content_ref.into(),
            content: content.into(),
            raw_score,
            source_type,
            metadata: ResultMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ResultMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Validate and normalize a candidate at the adapter boundary.
    ///
    /// Rejects candidates from a different source type than the adapter
    /// declares, empty `content_ref`s and unknown metadata versions. Scores are
    /// clamped to [0, 1]; non-finite scores become 0. Foundation-only keys on
    /// primary candidates are dropped.
    pub fn validated(mut self, expected: SourceType) -> Result<Self, SourceError> {
        if self.source_type != expected {
            return Err(SourceError::InvalidResult(format!(
                "'{}' declares source type {} but adapter serves {}",
                self.content_ref, self.source_type, expected
            )));
        }
        if self.content_ref.trim().is_empty() {
            return Err(SourceError::InvalidResult(
                "candidate has an empty content_ref".to_string(),
            ));
        }
        if self.metadata.schema_version == 0
            || self.metadata.schema_version > METADATA_SCHEMA_VERSION
        {
            return Err(SourceError::InvalidResult(format!(
                "'{}' uses unsupported metadata schema version {}",
                self.content_ref, self.metadata.schema_version
            )));
        }

        self.raw_score = clamp_unit(self.raw_score).unwrap_or(0.0);

        match self.source_type {
            SourceType::Primary => {
                self.metadata.cultural_appropriateness = None;
                self.metadata.search_tier = None;
            }
            SourceType::Foundation => {
                self.metadata.cultural_appropriateness = self
                    .metadata
                    .cultural_appropriateness
                    .and_then(clamp_unit);
            }
        }

        Ok(self)
    }
}

fn clamp_unit(value: f64) -> Option<f64> {
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}
