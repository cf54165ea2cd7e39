//! Lexweave: Contextual Multi-Source Retrieval Orchestrator
//!
//! Retrieves, ranks and blends evidence from a primary statutory corpus and
//! one or more doctrinally distinct foundation corpora, deciding per query how
//! much weight each source deserves.
//!
//! # Core Concepts
//!
//! - **Concepts**: typed legal concepts extracted from the query
//! - **Strategies**: the per-query policy for weighting and placing each corpus
//! - **Buckets**: Primary, Supporting and Contextual result groups
//! - **Degradation**: falling back to primary-only retrieval after a failure
//!
//! # Example
//!
//! ```
//! use lexweave::{InMemoryCorpus, Orchestrator, OrchestratorConfig, SourceType, StaticExtractor};
//! use std::sync::Arc;
//!
//! let primary = InMemoryCorpus::new("statutes", SourceType::Primary);
//! let _orchestrator = Orchestrator::new(
//!     OrchestratorConfig::default(),
//!     Arc::new(StaticExtractor::empty()),
//!     Arc::new(primary),
//! );
//! // Orchestrator is ready for use
//! ```

pub mod concept;
pub mod config;
pub mod integration;
pub mod orchestrator;
pub mod quality;
pub mod retrieval;
pub mod source;
pub mod strategy;

pub use concept::{
    Concept, ConceptExtractor, ConceptType, ExtractionError, LexiconEntry, LexiconExtractor,
    StaticExtractor,
};
pub use config::{ConfigError, OrchestratorConfig, RuntimeSettings, DEFAULT_RESULT_LIMIT};
pub use integration::{AdjustedResult, Bucket, IntegratedBuckets, IntegrationError, ResultIntegrator};
pub use orchestrator::{
    HealthReport, HealthStatus, IntegratedResponse, MetricsAccumulator, MetricsSnapshot,
    Orchestrator, RequestState, ResponseStatus, TimingBreakdown,
};
pub use quality::{ConfidenceDistribution, QualityError, QualityMetrics, QualityScorer};
pub use retrieval::{AdapterHealth, CallOutcome, RetrievalCoordinator, RetrievalOutcome};
pub use source::{
    CandidateResult, CorpusDocument, FoundationBackend, InMemoryCorpus, ResultMetadata,
    SourceAdapter, SourceError, SourceType, TieredFoundationAdapter,
};
pub use strategy::{
    ComplexityLevel, IntegrationStrategy, QueryContext, SourcePreference, StrategyDecision,
    StrategySelector,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
