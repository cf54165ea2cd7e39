//! Concept-driven strategy selection
//!
//! Rules are evaluated in priority order and the first decisive rule wins:
//! 1. literal phrases in the query
//! 2. all-procedural concepts with an administrative term
//! 3. share of foundation-affine concept types
//! 4. share of foundation / administrative semantic domains
//! 5. caller preference or declared complexity
//! 6. default `PrimaryWithFoundation`
//!
//! Selection never fails. When in doubt the foundation corpus is included.

use super::types::{ComplexityLevel, IntegrationStrategy, QueryContext, SourcePreference};
use crate::concept::{normalize_text, Concept};
use crate::config::SelectorConfig;
use serde::Serialize;
use std::collections::BTreeSet;

/// Kinds of strategy-indicating phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseKind {
    DoctrinalBasis,
    ProceduralSteps,
    PracticalApplication,
}

/// Why a strategy was chosen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SelectionReason {
    LiteralPhrase {
        kind: PhraseKind,
        phrase: String,
        administrative: bool,
    },
    ProceduralConcepts,
    FoundationAffinity { ratio: f64 },
    FoundationDomains { ratio: f64 },
    AdministrativeDomains { ratio: f64 },
    CallerPreference { preference: SourcePreference },
    HighComplexity,
    Default { concepts: usize },
}

impl std::fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LiteralPhrase {
                kind,
                phrase,
                administrative,
            } => {
                let kind = match kind {
                    PhraseKind::DoctrinalBasis => "doctrinal_basis",
                    PhraseKind::ProceduralSteps => "procedural_steps",
                    PhraseKind::PracticalApplication => "practical_application",
                };
                write!(f, "literal_phrase:{}:'{}'", kind, phrase)?;
                if *administrative {
                    write!(f, ":administrative")?;
                }
                Ok(())
            }
            Self::ProceduralConcepts => write!(f, "procedural_concepts:administrative"),
            Self::FoundationAffinity { ratio } => write!(f, "foundation_affinity:{:.2}", ratio),
            Self::FoundationDomains { ratio } => write!(f, "foundation_domains:{:.2}", ratio),
            Self::AdministrativeDomains { ratio } => {
                write!(f, "administrative_domains:{:.2}", ratio)
            }
            Self::CallerPreference { preference } => {
                write!(f, "caller_preference:{}", preference.as_str())
            }
            Self::HighComplexity => write!(f, "high_complexity"),
            Self::Default { concepts } => write!(f, "default:concepts={}", concepts),
        }
    }
}

/// A selected strategy with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyDecision {
    pub strategy: IntegrationStrategy,
    pub reason: SelectionReason,
}

impl StrategyDecision {
    fn new(strategy: IntegrationStrategy, reason: SelectionReason) -> Self {
        Self { strategy, reason }
    }

    /// Machine-readable explanation, e.g. `foundation_first <- foundation_affinity:1.00`.
    pub fn explanation(&self) -> String {
        format!("{} <- {}", self.strategy, self.reason)
    }
}

/// Picks an `IntegrationStrategy` from query text, concepts and context.
#[derive(Debug, Clone, Default)]
pub struct StrategySelector {
    config: SelectorConfig,
}

impl StrategySelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Select a strategy. Total: every input yields a strategy.
    pub fn select(
        &self,
        query: &str,
        concepts: &[Concept],
        context: &QueryContext,
    ) -> IntegrationStrategy {
        self.decide(query, concepts, context).strategy
    }

    /// Select a strategy and report which rule decided it.
    pub fn decide(
        &self,
        query: &str,
        concepts: &[Concept],
        context: &QueryContext,
    ) -> StrategyDecision {
        let text = padded_words(query);
        let administrative = find_phrase(&text, &self.config.administrative_terms).is_some();

        if let Some(decision) = self.phrase_override(&text, administrative) {
            return decision;
        }

        if !concepts.is_empty() {
            let all_procedural = concepts.iter().all(|c| c.concept_type.is_procedural());
            if all_procedural && administrative {
                return StrategyDecision::new(
                    IntegrationStrategy::PrimaryOnly,
                    SelectionReason::ProceduralConcepts,
                );
            }

            let affine = concepts
                .iter()
                .filter(|c| c.concept_type.is_foundation_affine())
                .count();
            let ratio = affine as f64 / concepts.len() as f64;
            if ratio > self.config.foundation_affinity_ratio {
                return StrategyDecision::new(
                    IntegrationStrategy::FoundationFirst,
                    SelectionReason::FoundationAffinity { ratio },
                );
            }
        }

        if let Some(decision) = self.domain_ratio(concepts, administrative) {
            return decision;
        }

        if let Some(preference) = context.preference {
            return StrategyDecision::new(
                preference.strategy(),
                SelectionReason::CallerPreference { preference },
            );
        }
        if context.complexity == Some(ComplexityLevel::High) {
            return StrategyDecision::new(
                IntegrationStrategy::ContextualBlend,
                SelectionReason::HighComplexity,
            );
        }

        StrategyDecision::new(
            IntegrationStrategy::PrimaryWithFoundation,
            SelectionReason::Default {
                concepts: concepts.len(),
            },
        )
    }

    fn phrase_override(&self, text: &str, administrative: bool) -> Option<StrategyDecision> {
        let c = &self.config;
        let checks = [
            (PhraseKind::DoctrinalBasis, &c.doctrinal_phrases),
            (PhraseKind::ProceduralSteps, &c.procedural_phrases),
            (PhraseKind::PracticalApplication, &c.practical_phrases),
        ];

        checks.into_iter().find_map(|(kind, phrases)| {
            let phrase = find_phrase(text, phrases)?;
            let strategy = match kind {
                PhraseKind::DoctrinalBasis => IntegrationStrategy::FoundationFirst,
                // Procedural wording alone never excludes the foundation corpus
                PhraseKind::ProceduralSteps if administrative => IntegrationStrategy::PrimaryOnly,
                PhraseKind::ProceduralSteps => IntegrationStrategy::PrimaryWithFoundation,
                PhraseKind::PracticalApplication => IntegrationStrategy::ContextualBlend,
            };
            Some(StrategyDecision::new(
                strategy,
                SelectionReason::LiteralPhrase {
                    kind,
                    phrase: phrase.to_string(),
                    administrative,
                },
            ))
        })
    }

    fn domain_ratio(&self, concepts: &[Concept], administrative: bool) -> Option<StrategyDecision> {
        let domains: BTreeSet<String> = concepts
            .iter()
            .flat_map(|c| c.semantic_domains.iter())
            .map(|d| normalize_text(d.trim()))
            .filter(|d| !d.is_empty())
            .collect();
        if domains.is_empty() {
            return None;
        }

        let share = |vocabulary: &[String]| {
            let hits = domains
                .iter()
                .filter(|d| matches_vocabulary(d, vocabulary))
                .count();
            hits as f64 / domains.len() as f64
        };

        let foundation = share(&self.config.foundation_domains);
        if foundation > self.config.foundation_domain_ratio {
            return Some(StrategyDecision::new(
                IntegrationStrategy::FoundationFirst,
                SelectionReason::FoundationDomains { ratio: foundation },
            ));
        }

        let admin = share(&self.config.administrative_domains);
        if admin > self.config.administrative_domain_ratio && administrative {
            return Some(StrategyDecision::new(
                IntegrationStrategy::PrimaryOnly,
                SelectionReason::AdministrativeDomains { ratio: admin },
            ));
        }

        None
    }
}

/// Lowercased words of `text` joined by single spaces, padded on both ends,
/// so that phrases match on whole-word boundaries.
fn padded_words(text: &str) -> String {
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    format!(" {} ", normalize_text(&words.join(" ")))
}

fn find_phrase<'a>(padded_text: &str, phrases: &'a [String]) -> Option<&'a str> {
    phrases
        .iter()
        .find(|p| {
            let needle = padded_words(p);
            !needle.trim().is_empty() && padded_text.contains(&needle)
        })
        .map(String::as_str)
}

fn matches_vocabulary(domain: &str, vocabulary: &[String]) -> bool {
    vocabulary.iter().any(|v| {
        let v = normalize_text(v);
        !v.is_empty() && domain.contains(&v)
    })
}
