//! Aggregate quality metrics for an integrated response

mod scorer;

pub use scorer::{ConfidenceDistribution, QualityError, QualityMetrics, QualityScorer};
