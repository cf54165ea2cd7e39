//! Result integrator: strategy weighting, concept alignment and bucketing
//!
//! Pure transformation from raw candidates to three disjoint, score-sorted
//! buckets. Nothing here mutates its input or keeps state between calls.

use super::types::{AdjustedResult, Bucket, IntegratedBuckets, IntegrationError};
use crate::concept::{normalize_text, Concept};
use crate::config::IntegrationConfig;
use crate::source::{CandidateResult, SourceType};
use crate::strategy::IntegrationStrategy;
use std::collections::{BTreeSet, HashSet};

/// Which sources may fill the Primary and Supporting buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Lead source fills Primary, support source fills Supporting
    BySource { lead: SourceType, support: SourceType },
    /// Top candidates of either source fill Primary, then Supporting
    Blend,
}

impl Placement {
    fn for_strategy(strategy: IntegrationStrategy) -> Self {
        match strategy {
            IntegrationStrategy::FoundationFirst => Self::BySource {
                lead: SourceType::Foundation,
                support: SourceType::Primary,
            },
            IntegrationStrategy::PrimaryWithFoundation => Self::BySource {
                lead: SourceType::Primary,
                support: SourceType::Foundation,
            },
            IntegrationStrategy::ContextualBlend => Self::Blend,
            IntegrationStrategy::PrimaryOnly => Self::BySource {
                lead: SourceType::Primary,
                support: SourceType::Primary,
            },
            IntegrationStrategy::FoundationOnly => Self::BySource {
                lead: SourceType::Foundation,
                support: SourceType::Foundation,
            },
        }
    }

    fn accepts(self, bucket: Bucket, source: SourceType) -> bool {
        match (self, bucket) {
            (Self::Blend, _) => true,
            (Self::BySource { lead, .. }, Bucket::Primary) => lead == source,
            (Self::BySource { support, .. }, Bucket::Supporting) => support == source,
            (Self::BySource { .. }, Bucket::Contextual) => true,
        }
    }
}

/// A candidate with its strategy-adjusted score, before bucket assignment.
struct Scored<'a> {
    candidate: &'a CandidateResult,
    adjusted_score: f64,
    alignment_bonus: f64,
}

/// Re-scores and buckets candidates according to an `IntegrationStrategy`.
#[derive(Debug, Clone, Default)]
pub struct ResultIntegrator {
    config: IntegrationConfig,
}

impl ResultIntegrator {
    pub fn new(config: IntegrationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    /// Score boost for a candidate whose content matches the query concepts.
    ///
    /// Label match, one bonus per matching domain tag, and source/concept-type
    /// affinity, capped at `max_bonus`.
    pub fn alignment_bonus(&self, candidate: &CandidateResult, concepts: &[Concept]) -> f64 {
        if concepts.is_empty() {
            return 0.0;
        }
        let content = normalize_text(&candidate.content);
        let mut bonus = 0.0;

        let label_hit = concepts.iter().any(|c| {
            let label = normalize_text(c.primary_label.trim());
            !label.is_empty() && content.contains(&label)
        });
        if label_hit {
            bonus += self.config.label_bonus;
        }

        let domains: BTreeSet<String> = concepts
            .iter()
            .flat_map(|c| c.semantic_domains.iter())
            .map(|d| normalize_text(d.trim()))
            .filter(|d| !d.is_empty())
            .collect();
        let domain_hits = domains.iter().filter(|d| content.contains(d.as_str())).count();
        bonus += self.config.domain_bonus * domain_hits as f64;

        let affine = concepts
            .iter()
            .any(|c| c.concept_type.source_affinity() == Some(candidate.source_type));
        if affine {
            bonus += self.config.affinity_bonus;
        }

        bonus.min(self.config.max_bonus)
    }

    /// Adjusted score of one candidate under `strategy`, clamped to [0, 1].
    pub fn adjusted_score(
        &self,
        candidate: &CandidateResult,
        strategy: IntegrationStrategy,
        concepts: &[Concept],
    ) -> f64 {
        self.score(candidate, strategy, concepts).adjusted_score
    }

    fn score<'a>(
        &self,
        candidate: &'a CandidateResult,
        strategy: IntegrationStrategy,
        concepts: &[Concept],
    ) -> Scored<'a> {
        let weights = self.config.weights.for_strategy(strategy);
        let weight = match candidate.source_type {
            SourceType::Primary => weights.primary,
            SourceType::Foundation => weights.foundation,
        };
        let alignment_bonus = self.alignment_bonus(candidate, concepts);
        let raw = if candidate.raw_score.is_finite() {
            candidate.raw_score
        } else {
            0.0
        };
        let adjusted_score = (raw * weight + alignment_bonus).clamp(0.0, 1.0);
        Scored {
            candidate,
            adjusted_score,
            alignment_bonus,
        }
    }

    /// Re-score both result lists and place them into the three buckets.
    ///
    /// `ceiling` caps the total across all buckets. The output is verified
    /// against the response invariants before it is returned.
    pub fn integrate(
        &self,
        primary: &[CandidateResult],
        foundation: &[CandidateResult],
        strategy: IntegrationStrategy,
        concepts: &[Concept],
        ceiling: usize,
    ) -> Result<IntegratedBuckets, IntegrationError> {
        let mut ranked: Vec<Scored<'_>> = primary
            .iter()
            .chain(foundation.iter())
            .filter(|c| strategy.includes(c.source_type))
            .map(|c| self.score(c, strategy, concepts))
            .collect();
        ranked.sort_by(|a, b| {
            b.adjusted_score
                .total_cmp(&a.adjusted_score)
                .then_with(|| a.candidate.content_ref.cmp(&b.candidate.content_ref))
        });

        let placement = Placement::for_strategy(strategy);
        let mut placed: HashSet<&str> = HashSet::new();
        let mut budget = ceiling;
        let mut buckets = IntegratedBuckets::default();

        buckets.primary = self.fill(
            &ranked,
            &mut placed,
            &mut budget,
            Bucket::Primary,
            |s| placement.accepts(Bucket::Primary, s),
            self.config.primary_bucket_size,
        );
        buckets.supporting = self.fill(
            &ranked,
            &mut placed,
            &mut budget,
            Bucket::Supporting,
            |s| placement.accepts(Bucket::Supporting, s),
            self.config.supporting_bucket_size,
        );

        // Contextual pass runs only over refs not placed above
        let mut contextual = self.fill(
            &ranked,
            &mut placed,
            &mut budget,
            Bucket::Contextual,
            |s| s == SourceType::Primary,
            self.config.contextual_primary_cap,
        );
        contextual.extend(self.fill(
            &ranked,
            &mut placed,
            &mut budget,
            Bucket::Contextual,
            |s| s == SourceType::Foundation,
            self.config.contextual_foundation_cap,
        ));
        sort_desc(&mut contextual);
        buckets.contextual = contextual;

        buckets.verify(strategy, ceiling)?;
        Ok(buckets)
    }

    /// Take up to `size` unplaced candidates accepted by `accepts`, best first.
    fn fill<'a, F>(
        &self,
        ranked: &[Scored<'a>],
        placed: &mut HashSet<&'a str>,
        budget: &mut usize,
        bucket: Bucket,
        accepts: F,
        size: usize,
    ) -> Vec<AdjustedResult>
    where
        F: Fn(SourceType) -> bool,
    {
        let mut out = Vec::new();
        for scored in ranked {
            if out.len() >= size || *budget == 0 {
                break;
            }
            let candidate = scored.candidate;
            if !accepts(candidate.source_type) || placed.contains(candidate.content_ref.as_str()) {
                continue;
            }
            placed.insert(candidate.content_ref.as_str());
            *budget -= 1;
            out.push(AdjustedResult {
                candidate: candidate.clone(),
                adjusted_score: scored.adjusted_score,
                alignment_bonus: scored.alignment_bonus,
                bucket,
            });
        }
        out
    }
}

fn sort_desc(results: &mut [AdjustedResult]) {
    results.sort_by(|a, b| {
        b.adjusted_score
            .total_cmp(&a.adjusted_score)
            .then_with(|| a.content_ref().cmp(b.content_ref()))
    });
}
