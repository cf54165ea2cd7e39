//! Quality scorer
//!
//! Pure function of the bucketed results: same input, same metrics. No state
//! is kept between calls.

use crate::concept::{normalize_text, Concept};
use crate::config::QualityConfig;
use crate::integration::AdjustedResult;
use crate::source::SourceType;
use crate::strategy::IntegrationStrategy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QualityError {
    #[error("metric {metric} is not finite ({value})")]
    NonFinite { metric: &'static str, value: f64 },
}

/// Count of retained results per confidence band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl ConfidenceDistribution {
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub integration_quality: f64,
    pub cultural_appropriateness: f64,
    pub legal_completeness: f64,
    pub confidence_distribution: ConfidenceDistribution,
}

impl QualityMetrics {
    /// Metrics for a response with no results.
    pub fn empty(config: &QualityConfig) -> Self {
        Self {
            integration_quality: 0.0,
            cultural_appropriateness: config.default_cultural_appropriateness,
            legal_completeness: 0.0,
            confidence_distribution: ConfidenceDistribution::default(),
        }
    }

    fn check(&self) -> Result<(), QualityError> {
        for (metric, value) in [
            ("integration_quality", self.integration_quality),
            ("cultural_appropriateness", self.cultural_appropriateness),
            ("legal_completeness", self.legal_completeness),
        ] {
            if !value.is_finite() {
                return Err(QualityError::NonFinite { metric, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: QualityConfig,
}

impl QualityScorer {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Score a bucketed response.
    pub fn score(
        &self,
        primary: &[AdjustedResult],
        supporting: &[AdjustedResult],
        contextual: &[AdjustedResult],
        concepts: &[Concept],
        strategy: IntegrationStrategy,
    ) -> QualityMetrics {
        let retained: Vec<&AdjustedResult> = primary
            .iter()
            .chain(supporting.iter())
            .chain(contextual.iter())
            .collect();

        QualityMetrics {
            integration_quality: self.integration_quality(&retained, strategy),
            cultural_appropriateness: self.cultural_appropriateness(&retained),
            legal_completeness: self.legal_completeness(&retained, concepts),
            confidence_distribution: self.confidence_distribution(&retained),
        }
    }

    /// Like `score`, but rejects metrics that are not finite.
    pub fn try_score(
        &self,
        primary: &[AdjustedResult],
        supporting: &[AdjustedResult],
        contextual: &[AdjustedResult],
        concepts: &[Concept],
        strategy: IntegrationStrategy,
    ) -> Result<QualityMetrics, QualityError> {
        let metrics = self.score(primary, supporting, contextual, concepts, strategy);
        metrics.check()?;
        Ok(metrics)
    }

    fn integration_quality(&self, retained: &[&AdjustedResult], strategy: IntegrationStrategy) -> f64 {
        if retained.is_empty() {
            return 0.0;
        }
        let n = retained.len() as f64;
        let foundation = retained
            .iter()
            .filter(|r| r.source_type() == SourceType::Foundation)
            .count() as f64;
        let ideal = self.config.ideal_foundation_ratio.for_strategy(strategy);
        let balance = 1.0 - (ideal - foundation / n).abs();
        let mean_score = retained.iter().map(|r| r.adjusted_score).sum::<f64>() / n;

        let blended = self.config.balance_weight * balance + self.config.score_weight * mean_score;
        blended.clamp(0.0, 1.0)
    }

    fn cultural_appropriateness(&self, retained: &[&AdjustedResult]) -> f64 {
        let default = self.config.default_cultural_appropriateness;
        let values: Vec<f64> = retained
            .iter()
            .filter(|r| r.source_type() == SourceType::Foundation)
            .map(|r| r.candidate.metadata.cultural_appropriateness.unwrap_or(default))
            .collect();
        if values.is_empty() {
            return default;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    fn legal_completeness(&self, retained: &[&AdjustedResult], concepts: &[Concept]) -> f64 {
        if concepts.is_empty() {
            return self.config.completeness_base.min(1.0);
        }
        let contents: Vec<String> = retained
            .iter()
            .map(|r| normalize_text(&r.candidate.content))
            .collect();
        let appears = |needle: &str| {
            let needle = normalize_text(needle.trim());
            !needle.is_empty() && contents.iter().any(|c| c.contains(&needle))
        };
        let covered = concepts
            .iter()
            .filter(|c| {
                appears(&c.primary_label) || c.semantic_domains.iter().any(|d| appears(d))
            })
            .count();

        (self.config.completeness_base + covered as f64 / concepts.len() as f64).min(1.0)
    }

    fn confidence_distribution(&self, retained: &[&AdjustedResult]) -> ConfidenceDistribution {
        let mut dist = ConfidenceDistribution::default();
        for result in retained {
            if result.adjusted_score >= self.config.high_confidence {
                dist.high += 1;
            } else if result.adjusted_score >= self.config.medium_confidence {
                dist.medium += 1;
            } else {
                dist.low += 1;
            }
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::ConceptType;
    use crate::integration::Bucket;
    use crate::source::{CandidateResult, ResultMetadata};

    fn adjusted(id: &str, content: &str, score: f64, source_type: SourceType) -> AdjustedResult {
        AdjustedResult {
            candidate: CandidateResult::new("src", id, content, score, source_type),
            adjusted_score: score,
            alignment_bonus: 0.0,
            bucket: Bucket::Primary,
        }
    }

    fn with_appropriateness(mut result: AdjustedResult, value: f64) -> AdjustedResult {
        result.candidate.metadata = ResultMetadata::new().with_cultural_appropriateness(value);
        result
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn integration_quality_blends_balance_and_mean_score() {
        let scorer = QualityScorer::default();
        let primary = vec![
            adjusted("f1", "a", 0.8, SourceType::Foundation),
            adjusted("f2", "b", 0.6, SourceType::Foundation),
        ];
        let supporting = vec![adjusted("p1", "c", 0.4, SourceType::Primary)];

        let metrics = scorer.score(&primary, &supporting, &[], &[], IntegrationStrategy::FoundationFirst);
        // balance = 1 - |0.7 - 2/3|, mean = 0.6
        let expected = 0.4 * (1.0 - (0.7_f64 - 2.0 / 3.0).abs()) + 0.6 * 0.6;
        assert!(close(metrics.integration_quality, expected));
    }

    #[test]
    fn ideal_ratio_depends_on_strategy() {
        let scorer = QualityScorer::default();
        let primary = vec![adjusted("p1", "a", 0.5, SourceType::Primary)];
        let pwf = scorer.score(&primary, &[], &[], &[], IntegrationStrategy::PrimaryWithFoundation);
        let po = scorer.score(&primary, &[], &[], &[], IntegrationStrategy::PrimaryOnly);
        assert!(close(pwf.integration_quality, 0.4 * 0.7 + 0.3));
        assert!(close(po.integration_quality, 0.4 * 0.5 + 0.3));
    }

    #[test]
    fn integration_quality_stays_within_unit_range_for_heavy_weights() {
        let scorer = QualityScorer::new(QualityConfig {
            balance_weight: 1.0,
            score_weight: 1.0,
            ..QualityConfig::default()
        });
        let primary = vec![adjusted("p1", "a", 0.9, SourceType::Primary)];
        let metrics = scorer.score(&primary, &[], &[], &[], IntegrationStrategy::PrimaryOnly);
        assert_eq!(metrics.integration_quality, 1.0);
    }

    #[test]
    fn empty_response_scores_zero_quality() {
        let metrics = QualityScorer::default().score(&[], &[], &[], &[], IntegrationStrategy::ContextualBlend);
        assert_eq!(metrics.integration_quality, 0.0);
        assert_eq!(metrics.cultural_appropriateness, 0.8);
        assert_eq!(metrics.confidence_distribution.total(), 0);
    }

    #[test]
    fn cultural_appropriateness_averages_foundation_only() {
        let scorer = QualityScorer::default();
        let results = vec![
            with_appropriateness(adjusted("f1", "a", 0.5, SourceType::Foundation), 1.0),
            with_appropriateness(adjusted("f2", "b", 0.5, SourceType::Foundation), 0.6),
            // primary-sourced values are ignored
            with_appropriateness(adjusted("p1", "c", 0.5, SourceType::Primary), 0.0),
        ];
        let metrics = scorer.score(&results, &[], &[], &[], IntegrationStrategy::ContextualBlend);
        assert!(close(metrics.cultural_appropriateness, 0.8));

        let missing = vec![
            with_appropriateness(adjusted("f1", "a", 0.5, SourceType::Foundation), 0.4),
            adjusted("f2", "b", 0.5, SourceType::Foundation),
        ];
        let metrics = scorer.score(&missing, &[], &[], &[], IntegrationStrategy::ContextualBlend);
        assert!(close(metrics.cultural_appropriateness, 0.6));
    }

    #[test]
    fn no_foundation_results_is_not_penalized() {
        let primary = vec![adjusted("p1", "a", 0.5, SourceType::Primary)];
        let metrics = QualityScorer::default().score(&primary, &[], &[], &[], IntegrationStrategy::PrimaryOnly);
        assert_eq!(metrics.cultural_appropriateness, 0.8);
    }

    #[test]
    fn completeness_counts_covered_concepts() {
        let scorer = QualityScorer::default();
        let concepts = vec![
            Concept::new("c1", "wages", ConceptType::SubstantiveRule),
            Concept::new("c2", "custody", ConceptType::ProtectionDuty).with_domain("family_law"),
            Concept::new("c3", "zakat", ConceptType::EconomicPrinciple),
        ];
        let primary = vec![
            adjusted("p1", "Unpaid WAGES must be settled", 0.5, SourceType::Primary),
            adjusted("p2", "Chapter on family law", 0.5, SourceType::Primary),
        ];
        let metrics = scorer.score(&primary, &[], &[], &concepts, IntegrationStrategy::PrimaryOnly);
        assert!(close(metrics.legal_completeness, 0.3 + 2.0 / 3.0));

        let all = vec![adjusted("p3", "wages, family law and zakat", 0.5, SourceType::Primary)];
        let metrics = scorer.score(&all, &[], &[], &concepts, IntegrationStrategy::PrimaryOnly);
        assert_eq!(metrics.legal_completeness, 1.0);
    }

    #[test]
    fn completeness_without_concepts_is_the_base() {
        let primary = vec![adjusted("p1", "a", 0.5, SourceType::Primary)];
        let metrics = QualityScorer::default().score(&primary, &[], &[], &[], IntegrationStrategy::PrimaryOnly);
        assert!(close(metrics.legal_completeness, 0.3));
    }

    #[test]
    fn confidence_bands() {
        let results = vec![
            adjusted("a", "a", 0.95, SourceType::Primary),
            adjusted("b", "b", 0.8, SourceType::Primary),
            adjusted("c", "c", 0.6, SourceType::Primary),
            adjusted("d", "d", 0.59, SourceType::Primary),
        ];
        let metrics = QualityScorer::default().score(&results, &[], &[], &[], IntegrationStrategy::PrimaryOnly);
        assert_eq!(
            metrics.confidence_distribution,
            ConfidenceDistribution { high: 2, medium: 1, low: 1 }
        );
    }

    #[test]
    fn scoring_is_idempotent() {
        let scorer = QualityScorer::default();
        let concepts = vec![Concept::new("c", "justice", ConceptType::JusticePrinciple)];
        let primary = vec![adjusted("f1", "justice", 0.7, SourceType::Foundation)];
        let contextual = vec![adjusted("p1", "other", 0.3, SourceType::Primary)];

        let first = scorer.score(&primary, &[], &contextual, &concepts, IntegrationStrategy::FoundationFirst);
        let second = scorer.score(&primary, &[], &contextual, &concepts, IntegrationStrategy::FoundationFirst);
        assert_eq!(first, second);
    }

    #[test]
    fn try_score_rejects_non_finite_metrics() {
        let primary = vec![with_appropriateness(
            adjusted("f1", "a", 0.5, SourceType::Foundation),
            f64::NAN,
        )];
        let err = QualityScorer::default()
            .try_score(&primary, &[], &[], &[], IntegrationStrategy::FoundationOnly)
            .unwrap_err();
        assert!(matches!(
            err,
            QualityError::NonFinite { metric: "cultural_appropriateness", .. }
        ));
    }
}
