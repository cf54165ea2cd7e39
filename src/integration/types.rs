//! Adjusted results and the three response buckets

use crate::source::{CandidateResult, SourceType};
use crate::strategy::IntegrationStrategy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Integration-stage invariant violations.
///
/// The integrator checks its own output; any of these sends the facade down
/// the degraded path.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IntegrationError {
    #[error("content_ref '{0}' placed in more than one bucket")]
    DuplicateContentRef(String),
    #[error("adjusted score {score} for '{content_ref}' outside [0, 1]")]
    ScoreOutOfBounds { content_ref: String, score: f64 },
    #[error("{source_type} result '{content_ref}' placed under {strategy}")]
    ExcludedSource {
        content_ref: String,
        source_type: SourceType,
        strategy: IntegrationStrategy,
    },
    #[error("{total} results exceed the ceiling of {ceiling}")]
    CeilingExceeded { total: usize, ceiling: usize },
}

/// Result group in the final response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Primary,
    Supporting,
    Contextual,
}

/// A candidate re-scored under one strategy.
///
/// Derived from a `CandidateResult` without mutating it, so the same raw
/// candidate can be re-scored under another strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedResult {
    pub candidate: CandidateResult,
    pub adjusted_score: f64,
    pub alignment_bonus: f64,
    pub bucket: Bucket,
}

impl AdjustedResult {
    pub fn content_ref(&self) -> &str {
        &self.candidate.content_ref
    }

    pub fn source_type(&self) -> SourceType {
        self.candidate.source_type
    }
}

/// The three buckets produced for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegratedBuckets {
    pub primary: Vec<AdjustedResult>,
    pub supporting: Vec<AdjustedResult>,
    pub contextual: Vec<AdjustedResult>,
}

impl IntegratedBuckets {
    /// All retained results, primary bucket first.
    pub fn iter(&self) -> impl Iterator<Item = &AdjustedResult> {
        self.primary
            .iter()
            .chain(self.supporting.iter())
            .chain(self.contextual.iter())
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.supporting.len() + self.contextual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check score bounds, disjointness, strategy exclusivity and the ceiling.
    pub fn verify(
        &self,
        strategy: IntegrationStrategy,
        ceiling: usize,
    ) -> Result<(), IntegrationError> {
        let total = self.len();
        if total > ceiling {
            return Err(IntegrationError::CeilingExceeded { total, ceiling });
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(total);
        for result in self.iter() {
            let score = result.adjusted_score;
            if !score.is_finite() || !(0.0..=1.0).contains(&score) {
                return Err(IntegrationError::ScoreOutOfBounds {
                    content_ref: result.content_ref().to_string(),
                    score,
                });
            }
            if !strategy.includes(result.source_type()) {
                return Err(IntegrationError::ExcludedSource {
                    content_ref: result.content_ref().to_string(),
                    source_type: result.source_type(),
                    strategy,
                });
            }
            if !seen.insert(result.content_ref()) {
                return Err(IntegrationError::DuplicateContentRef(
                    result.content_ref().to_string(),
                ));
            }
        }
        Ok(())
    }
}
