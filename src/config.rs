//! Orchestrator configuration
//!
//! Every threshold, weight and constant used by the selector, integrator and
//! scorer lives here with its default. Values were chosen empirically and are
//! meant to be tuned; load overrides from YAML with `OrchestratorConfig::load`.

use crate::strategy::IntegrationStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Default number of results a caller receives.
pub const DEFAULT_RESULT_LIMIT: usize = 15;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub selector: SelectorConfig,
    pub integration: IntegrationConfig,
    pub quality: QualityConfig,
    pub retrieval: RetrievalConfig,
    pub runtime: RuntimeSettings,
    /// Hard cap on results across all three buckets
    pub result_ceiling: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            selector: SelectorConfig::default(),
            integration: IntegrationConfig::default(),
            quality: QualityConfig::default(),
            retrieval: RetrievalConfig::default(),
            runtime: RuntimeSettings::default(),
            result_ceiling: DEFAULT_RESULT_LIMIT,
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check ranges: ratios and weights in [0, 1], positive caps and timeouts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.selector;
        unit("selector.foundation_affinity_ratio", s.foundation_affinity_ratio)?;
        unit("selector.foundation_domain_ratio", s.foundation_domain_ratio)?;
        unit("selector.administrative_domain_ratio", s.administrative_domain_ratio)?;

        let i = &self.integration;
        for strategy in IntegrationStrategy::ALL {
            let w = i.weights.for_strategy(strategy);
            unit(&format!("integration.weights.{}.primary", strategy), w.primary)?;
            unit(&format!("integration.weights.{}.foundation", strategy), w.foundation)?;
        }
        unit("integration.label_bonus", i.label_bonus)?;
        unit("integration.domain_bonus", i.domain_bonus)?;
        unit("integration.affinity_bonus", i.affinity_bonus)?;
        unit("integration.max_bonus", i.max_bonus)?;
        positive("integration.primary_bucket_size", i.primary_bucket_size)?;
        positive("integration.supporting_bucket_size", i.supporting_bucket_size)?;

        let q = &self.quality;
        unit("quality.balance_weight", q.balance_weight)?;
        unit("quality.score_weight", q.score_weight)?;
        if q.balance_weight + q.score_weight > 1.0 + f64::EPSILON {
            return Err(ConfigError::Invalid(format!(
                "quality.balance_weight + quality.score_weight must not exceed 1, got {}",
                q.balance_weight + q.score_weight
            )));
        }
        for strategy in IntegrationStrategy::ALL {
            unit(
                &format!("quality.ideal_foundation_ratio.{}", strategy),
                q.ideal_foundation_ratio.for_strategy(strategy),
            )?;
        }
        unit("quality.high_confidence", q.high_confidence)?;
        unit("quality.medium_confidence", q.medium_confidence)?;
        if q.medium_confidence > q.high_confidence {
            return Err(ConfigError::Invalid(
                "quality.medium_confidence must not exceed quality.high_confidence".to_string(),
            ));
        }
        unit(
            "quality.default_cultural_appropriateness",
            q.default_cultural_appropriateness,
        )?;
        unit("quality.completeness_base", q.completeness_base)?;

        let r = &self.retrieval;
        positive("retrieval.primary_timeout_ms", r.primary_timeout_ms as usize)?;
        positive("retrieval.foundation_timeout_ms", r.foundation_timeout_ms as usize)?;
        positive("retrieval.extractor_timeout_ms", r.extractor_timeout_ms as usize)?;

        positive("result_ceiling", self.result_ceiling)?;
        self.runtime.validate()
    }
}

fn unit(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

fn positive(name: &str, value: usize) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{} must be positive", name)))
    }
}

/// Phrase lists and ratio thresholds for strategy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Requests for the doctrinal basis of a rule
    pub doctrinal_phrases: Vec<String>,
    /// Requests for procedural steps
    pub procedural_phrases: Vec<String>,
    /// Requests for practical application
    pub practical_phrases: Vec<String>,
    /// Narrow administrative terms (forms, fees)
    pub administrative_terms: Vec<String>,
    /// Semantic domains associated with the foundation corpus
    pub foundation_domains: Vec<String>,
    /// Purely administrative semantic domains
    pub administrative_domains: Vec<String>,
    pub foundation_affinity_ratio: f64,
    pub foundation_domain_ratio: f64,
    pub administrative_domain_ratio: f64,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            doctrinal_phrases: strings(&[
                "doctrinal basis",
                "foundational basis",
                "religious basis",
                "الأساس الشرعي",
                "الدليل الشرعي",
                "التأصيل الشرعي",
            ]),
            procedural_phrases: strings(&[
                "procedural steps",
                "procedure for",
                "how to apply",
                "how do i file",
                "الإجراءات",
                "خطوات",
                "كيفية تقديم",
            ]),
            practical_phrases: strings(&[
                "practical application",
                "in practice",
                "التطبيق العملي",
                "من الناحية العملية",
            ]),
            administrative_terms: strings(&[
                "form", "forms", "fee", "fees", "رسوم", "الرسوم", "نموذج", "استمارة",
            ]),
            foundation_domains: strings(&[
                "ethics",
                "morality",
                "justice",
                "family",
                "worship",
                "jurisprudence",
                "charity",
                "inheritance",
            ]),
            administrative_domains: strings(&[
                "administrative",
                "procedure",
                "procedural",
                "fees",
                "forms",
                "registration",
                "filing",
                "licensing",
            ]),
            foundation_affinity_ratio: 0.6,
            foundation_domain_ratio: 0.5,
            administrative_domain_ratio: 0.9,
        }
    }
}

/// Multipliers applied to raw scores per source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceWeights {
    pub foundation: f64,
    pub primary: f64,
}

impl SourceWeights {
    pub const fn new(foundation: f64, primary: f64) -> Self {
        Self {
            foundation,
            primary,
        }
    }
}

/// Per-strategy weight table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyWeights {
    pub foundation_first: SourceWeights,
    pub primary_with_foundation: SourceWeights,
    pub contextual_blend: SourceWeights,
    pub primary_only: SourceWeights,
    pub foundation_only: SourceWeights,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            foundation_first: SourceWeights::new(0.7, 0.5),
            primary_with_foundation: SourceWeights::new(0.4, 0.8),
            contextual_blend: SourceWeights::new(0.6, 0.7),
            primary_only: SourceWeights::new(0.0, 1.0),
            foundation_only: SourceWeights::new(1.0, 0.0),
        }
    }
}

impl StrategyWeights {
    pub fn for_strategy(&self, strategy: IntegrationStrategy) -> SourceWeights {
        match strategy {
            IntegrationStrategy::FoundationFirst => self.foundation_first,
            IntegrationStrategy::PrimaryWithFoundation => self.primary_with_foundation,
            IntegrationStrategy::ContextualBlend => self.contextual_blend,
            IntegrationStrategy::PrimaryOnly => self.primary_only,
            IntegrationStrategy::FoundationOnly => self.foundation_only,
        }
    }
}

/// Score adjustment and bucket sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    pub weights: StrategyWeights,
    /// Bonus when a concept label appears in the content
    pub label_bonus: f64,
    /// Bonus per matching semantic-domain tag
    pub domain_bonus: f64,
    /// Bonus when the source type matches a concept-type affinity
    pub affinity_bonus: f64,
    pub max_bonus: f64,
    pub primary_bucket_size: usize,
    pub supporting_bucket_size: usize,
    pub contextual_primary_cap: usize,
    pub contextual_foundation_cap: usize,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            weights: StrategyWeights::default(),
            label_bonus: 0.2,
            domain_bonus: 0.1,
            affinity_bonus: 0.15,
            max_bonus: 0.5,
            primary_bucket_size: 5,
            supporting_bucket_size: 3,
            contextual_primary_cap: 3,
            contextual_foundation_cap: 2,
        }
    }
}

/// Ideal share of foundation results per strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdealRatios {
    pub foundation_first: f64,
    pub primary_with_foundation: f64,
    pub contextual_blend: f64,
    pub primary_only: f64,
    pub foundation_only: f64,
}

impl Default for IdealRatios {
    fn default() -> Self {
        Self {
            foundation_first: 0.7,
            primary_with_foundation: 0.3,
            contextual_blend: 0.5,
            primary_only: 0.5,
            foundation_only: 0.5,
        }
    }
}

impl IdealRatios {
    pub fn for_strategy(&self, strategy: IntegrationStrategy) -> f64 {
        match strategy {
            IntegrationStrategy::FoundationFirst => self.foundation_first,
            IntegrationStrategy::PrimaryWithFoundation => self.primary_with_foundation,
            IntegrationStrategy::ContextualBlend => self.contextual_blend,
            IntegrationStrategy::PrimaryOnly => self.primary_only,
            IntegrationStrategy::FoundationOnly => self.foundation_only,
        }
    }
}

/// Quality scoring constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub balance_weight: f64,
    pub score_weight: f64,
    pub ideal_foundation_ratio: IdealRatios,
    pub high_confidence: f64,
    pub medium_confidence: f64,
    /// Used when no foundation result reports appropriateness
    pub default_cultural_appropriateness: f64,
    pub completeness_base: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            balance_weight: 0.4,
            score_weight: 0.6,
            ideal_foundation_ratio: IdealRatios::default(),
            high_confidence: 0.8,
            medium_confidence: 0.6,
            default_cultural_appropriateness: 0.8,
            completeness_base: 0.3,
        }
    }
}

/// Per-call timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub primary_timeout_ms: u64,
    pub foundation_timeout_ms: u64,
    pub extractor_timeout_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            primary_timeout_ms: 5_000,
            foundation_timeout_ms: 2_000,
            extractor_timeout_ms: 1_000,
        }
    }
}

impl RetrievalConfig {
    pub fn primary_timeout(&self) -> Duration {
        Duration::from_millis(self.primary_timeout_ms)
    }

    pub fn foundation_timeout(&self) -> Duration {
        Duration::from_millis(self.foundation_timeout_ms)
    }

    pub fn extractor_timeout(&self) -> Duration {
        Duration::from_millis(self.extractor_timeout_ms)
    }
}

/// Runtime-mutable settings. Changed through `Orchestrator::configure`,
/// never persisted, applied to subsequent requests only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub foundation_enabled: bool,
    pub parallel_enabled: bool,
    pub max_primary_results: usize,
    pub max_foundation_results: usize,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            foundation_enabled: true,
            parallel_enabled: true,
            max_primary_results: 10,
            max_foundation_results: 5,
        }
    }
}

impl RuntimeSettings {
    pub fn new(
        foundation_enabled: bool,
        parallel_enabled: bool,
        max_primary_results: usize,
        max_foundation_results: usize,
    ) -> Self {
        Self {
            foundation_enabled,
            parallel_enabled,
            max_primary_results,
            max_foundation_results,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("runtime.max_primary_results", self.max_primary_results)?;
        positive("runtime.max_foundation_results", self.max_foundation_results)
    }
}
