//! Concept vocabulary produced by the extraction service

use crate::source::SourceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Classification of an extracted legal concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptType {
    SubstantiveRule,
    ProceduralRule,
    MoralPrinciple,
    JusticePrinciple,
    SocialRelation,
    AuthorityStructure,
    ProtectionDuty,
    EconomicPrinciple,
}

impl ConceptType {
    /// Concept types that pull retrieval towards the foundation corpus.
    pub fn is_foundation_affine(self) -> bool {
        matches!(
            self,
            Self::MoralPrinciple | Self::JusticePrinciple | Self::SocialRelation | Self::ProtectionDuty
        )
    }

    /// Purely procedural concept types.
    pub fn is_procedural(self) -> bool {
        matches!(self, Self::ProceduralRule)
    }

    /// The source type this concept type aligns with, if any.
    ///
    /// Foundation ↔ {MoralPrinciple, JusticePrinciple};
    /// Primary ↔ {ProceduralRule, SubstantiveRule}.
    pub fn source_affinity(self) -> Option<SourceType> {
        match self {
            Self::MoralPrinciple | Self::JusticePrinciple => Some(SourceType::Foundation),
            Self::ProceduralRule | Self::SubstantiveRule => Some(SourceType::Primary),
            Self::SocialRelation
            | Self::AuthorityStructure
            | Self::ProtectionDuty
            | Self::EconomicPrinciple => None,
        }
    }
}

impl std::fmt::Display for ConceptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::SubstantiveRule => "substantive_rule",
            Self::ProceduralRule => "procedural_rule",
            Self::MoralPrinciple => "moral_principle",
            Self::JusticePrinciple => "justice_principle",
            Self::SocialRelation => "social_relation",
            Self::AuthorityStructure => "authority_structure",
            Self::ProtectionDuty => "protection_duty",
            Self::EconomicPrinciple => "economic_principle",
        };
        write!(f, "{}", s)
    }
}

/// A typed concept extracted from a query.
///
/// Immutable once produced; lives only for the duration of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub primary_label: String,
    pub concept_type: ConceptType,
    #[serde(default)]
    pub semantic_domains: BTreeSet<String>,
    /// Extractor certainty, clamped to [0, 1]
    pub confidence: f64,
}

impl Concept {
    pub fn new(
        id: impl Into<String>,
        primary_label: impl Into<String>,
        concept_type: ConceptType,
    ) -> Self {
        Self {
            id: id.into(),
            primary_label: primary_label.into(),
            concept_type,
            semantic_domains: BTreeSet::new(),
            confidence: 1.0,
        }
    }

    /// Add a semantic-domain tag
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.semantic_domains.insert(domain.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }
}

/// Lowercase text and treat underscores as spaces.
///
/// Shared by every component that matches concept labels or domain tags
/// against candidate content.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase().replace('_', " ")
}
