//! Integration strategies and caller-supplied query context

use crate::source::SourceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The policy deciding how much weight and placement each corpus receives
/// for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStrategy {
    /// Foundation evidence leads, primary evidence supports
    FoundationFirst,
    /// Primary evidence leads, foundation evidence supports
    PrimaryWithFoundation,
    /// Both corpora compete for the primary bucket on adjusted score
    ContextualBlend,
    /// Foundation corpus excluded
    PrimaryOnly,
    /// Primary corpus excluded
    FoundationOnly,
}

impl IntegrationStrategy {
    pub const ALL: [IntegrationStrategy; 5] = [
        Self::FoundationFirst,
        Self::PrimaryWithFoundation,
        Self::ContextualBlend,
        Self::PrimaryOnly,
        Self::FoundationOnly,
    ];

    /// Whether results from `source` may appear under this strategy.
    pub fn includes(self, source: SourceType) -> bool {
        match (self, source) {
            (Self::PrimaryOnly, SourceType::Foundation) => false,
            (Self::FoundationOnly, SourceType::Primary) => false,
            (
                Self::FoundationFirst
                | Self::PrimaryWithFoundation
                | Self::ContextualBlend
                | Self::PrimaryOnly
                | Self::FoundationOnly,
                _,
            ) => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FoundationFirst => "foundation_first",
            Self::PrimaryWithFoundation => "primary_with_foundation",
            Self::ContextualBlend => "contextual_blend",
            Self::PrimaryOnly => "primary_only",
            Self::FoundationOnly => "foundation_only",
        }
    }
}

impl std::fmt::Display for IntegrationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit caller preference about corpus emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePreference {
    FoundationFocus,
    PrimaryFocus,
    FoundationOnly,
    PrimaryOnly,
}

impl SourcePreference {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FoundationFocus => "foundation_focus",
            Self::PrimaryFocus => "primary_focus",
            Self::FoundationOnly => "foundation_only",
            Self::PrimaryOnly => "primary_only",
        }
    }

    pub fn strategy(self) -> IntegrationStrategy {
        match self {
            Self::FoundationFocus => IntegrationStrategy::FoundationFirst,
            Self::PrimaryFocus => IntegrationStrategy::PrimaryWithFoundation,
            Self::FoundationOnly => IntegrationStrategy::FoundationOnly,
            Self::PrimaryOnly => IntegrationStrategy::PrimaryOnly,
        }
    }
}

impl std::str::FromStr for SourcePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "foundation_focus" => Ok(Self::FoundationFocus),
            "primary_focus" => Ok(Self::PrimaryFocus),
            "foundation_only" => Ok(Self::FoundationOnly),
            "primary_only" => Ok(Self::PrimaryOnly),
            other => Err(format!("unknown source preference: {}", other)),
        }
    }
}

/// Declared complexity of the caller's question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
}

impl std::str::FromStr for ComplexityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown complexity level: {}", other)),
        }
    }
}

/// Caller-supplied context for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preference: Option<SourcePreference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<ComplexityLevel>,
    /// Free-form attributes forwarded to adapters and the extractor
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preference(mut self, preference: SourcePreference) -> Self {
        self.preference = Some(preference);
        self
    }

    pub fn with_complexity(mut self, complexity: ComplexityLevel) -> Self {
        self.complexity = Some(complexity);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_strategies_drop_the_other_source() {
        assert!(!IntegrationStrategy::PrimaryOnly.includes(SourceType::Foundation));
        assert!(IntegrationStrategy::PrimaryOnly.includes(SourceType::Primary));
        assert!(!IntegrationStrategy::FoundationOnly.includes(SourceType::Primary));
        assert!(IntegrationStrategy::FoundationOnly.includes(SourceType::Foundation));
        assert!(IntegrationStrategy::ContextualBlend.includes(SourceType::Foundation));
    }

    #[test]
    fn preferences_map_to_strategies() {
        assert_eq!(
            SourcePreference::FoundationFocus.strategy(),
            IntegrationStrategy::FoundationFirst
        );
        assert_eq!(
            SourcePreference::PrimaryFocus.strategy(),
            IntegrationStrategy::PrimaryWithFoundation
        );
        assert_eq!(
            "primary_only".parse::<SourcePreference>().unwrap(),
            SourcePreference::PrimaryOnly
        );
        assert!("sideways".parse::<SourcePreference>().is_err());
    }

    #[test]
    fn context_deserializes_from_json() {
        let ctx: QueryContext =
            serde_json::from_str(r#"{"preference": "foundation_focus", "complexity": "high"}"#)
                .unwrap();
        assert_eq!(ctx.preference, Some(SourcePreference::FoundationFocus));
        assert_eq!(ctx.complexity, Some(ComplexityLevel::High));
    }
}
