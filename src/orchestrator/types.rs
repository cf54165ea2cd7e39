//! Response, request-state and health types produced by the facade

use super::metrics::MetricsSnapshot;
use crate::concept::Concept;
use crate::config::RuntimeSettings;
use crate::integration::AdjustedResult;
use crate::quality::QualityMetrics;
use crate::retrieval::{AdapterHealth, SourceTiming};
use crate::strategy::IntegrationStrategy;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Steps a request moves through.
///
/// `Degraded` is entered from any step after a failure; the request then
/// continues at `Retrieving` with the primary adapter only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Started,
    ConceptsExtracted,
    StrategySelected,
    Retrieving,
    Integrating,
    Scored,
    Completed,
    Degraded,
}

/// How the request finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// Full pipeline ran under the selected strategy
    Completed,
    /// Primary-only fallback produced the response
    Degraded,
    /// Fallback failed too; the response is empty
    Failed,
}

/// Per-stage wall time in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingBreakdown {
    pub extraction_ms: f64,
    pub selection_ms: f64,
    pub retrieval_ms: f64,
    pub integration_ms: f64,
    pub scoring_ms: f64,
    pub total_ms: f64,
    pub sources: Vec<SourceTiming>,
}

/// The aggregate result of one `retrieve` call. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegratedResponse {
    pub request_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub query: String,
    pub strategy: IntegrationStrategy,
    pub strategy_explanation: String,
    pub status: ResponseStatus,
    pub state_trace: Vec<RequestState>,
    pub primary: Vec<AdjustedResult>,
    pub supporting: Vec<AdjustedResult>,
    pub contextual: Vec<AdjustedResult>,
    pub quality: QualityMetrics,
    pub timing: TimingBreakdown,
    pub concepts: Vec<Concept>,
}

impl IntegratedResponse {
    /// All results, primary bucket first.
    pub fn results(&self) -> impl Iterator<Item = &AdjustedResult> {
        self.primary
            .iter()
            .chain(self.supporting.iter())
            .chain(self.contextual.iter())
    }

    pub fn total_results(&self) -> usize {
        self.primary.len() + self.supporting.len() + self.contextual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_results() == 0
    }
}

/// Overall service status reported by `health()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    /// Primary is fine but at least one foundation adapter is not
    Degraded,
    /// Primary adapter is failing or unavailable
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub adapters: Vec<AdapterHealth>,
    pub metrics: MetricsSnapshot,
    pub settings: RuntimeSettings,
}
