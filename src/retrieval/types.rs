//! Per-request retrieval outcome and per-adapter health records

use crate::source::{CandidateResult, SourceError, SourceType};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Retrieval-stage errors raised to the facade.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RetrievalError {
    #[error("all {0} scheduled source calls failed")]
    AllSourcesFailed(usize),
    #[error("no source adapter scheduled for strategy {0}")]
    NothingScheduled(String),
}

/// How a single adapter call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Succeeded,
    Failed,
    TimedOut,
    /// Not scheduled for this request (strategy exclusion or disabled)
    Skipped,
}

/// Timing of one adapter call within a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceTiming {
    pub adapter_id: String,
    pub source_type: SourceType,
    pub elapsed_ms: f64,
    pub results: usize,
    pub outcome: CallOutcome,
}

/// A recorded adapter failure. Logged, never surfaced to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub adapter_id: String,
    pub source_type: SourceType,
    pub error: SourceError,
}

/// Everything the coordinator gathered for one request, merged after the join.
#[derive(Debug, Clone, Default)]
pub struct RetrievalOutcome {
    pub primary: Vec<CandidateResult>,
    pub foundation: Vec<CandidateResult>,
    pub timings: Vec<SourceTiming>,
    pub errors: Vec<SourceFailure>,
}

impl RetrievalOutcome {
    /// Number of adapter calls actually made.
    pub fn scheduled(&self) -> usize {
        self.timings
            .iter()
            .filter(|t| t.outcome != CallOutcome::Skipped)
            .count()
    }

    /// Whether every scheduled call failed or timed out.
    pub fn all_failed(&self) -> bool {
        let scheduled = self.scheduled();
        scheduled > 0
            && self
                .timings
                .iter()
                .filter(|t| t.outcome != CallOutcome::Skipped)
                .all(|t| matches!(t.outcome, CallOutcome::Failed | CallOutcome::TimedOut))
    }

    /// Succeed unless nothing was scheduled or every scheduled call failed.
    pub fn check(self, strategy: &str) -> Result<Self, RetrievalError> {
        if self.scheduled() == 0 {
            return Err(RetrievalError::NothingScheduled(strategy.to_string()));
        }
        if self.all_failed() {
            return Err(RetrievalError::AllSourcesFailed(self.scheduled()));
        }
        Ok(self)
    }
}

/// Rolling health of one registered adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterHealth {
    pub adapter_id: String,
    pub source_type: SourceType,
    pub calls: u64,
    pub failures: u64,
    pub consecutive_failures: u64,
    pub last_outcome: Option<CallOutcome>,
    pub last_error: Option<String>,
    pub last_elapsed_ms: Option<f64>,
    pub last_called_at: Option<DateTime<Utc>>,
    /// Result of the most recent availability probe
    pub available: Option<bool>,
}

impl AdapterHealth {
    pub fn new(adapter_id: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            source_type,
            calls: 0,
            failures: 0,
            consecutive_failures: 0,
            last_outcome: None,
            last_error: None,
            last_elapsed_ms: None,
            last_called_at: None,
            available: None,
        }
    }

    pub(crate) fn record(&mut self, outcome: CallOutcome, elapsed_ms: f64, error: Option<String>) {
        match outcome {
            CallOutcome::Succeeded => self.consecutive_failures = 0,
            CallOutcome::Failed | CallOutcome::TimedOut => {
                self.failures += 1;
                self.consecutive_failures += 1;
            }
            CallOutcome::Skipped => return,
        }
        self.calls += 1;
        self.last_outcome = Some(outcome);
        self.last_error = error;
        self.last_elapsed_ms = Some(elapsed_ms);
        self.last_called_at = Some(Utc::now());
    }

    /// Healthy when the last call did not fail and the last probe did not report down.
    pub fn is_healthy(&self) -> bool {
        self.consecutive_failures == 0 && self.available != Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(outcome: CallOutcome) -> SourceTiming {
        SourceTiming {
            adapter_id: "a".into(),
            source_type: SourceType::Primary,
            elapsed_ms: 1.0,
            results: 0,
            outcome,
        }
    }

    #[test]
    fn all_failed_ignores_skipped_calls() {
        let outcome = RetrievalOutcome {
            timings: vec![timing(CallOutcome::Failed), timing(CallOutcome::Skipped)],
            ..Default::default()
        };
        assert!(outcome.all_failed());
        assert_eq!(
            outcome.check("primary_with_foundation").unwrap_err(),
            RetrievalError::AllSourcesFailed(1)
        );
    }

    #[test]
    fn partial_failure_is_not_total() {
        let outcome = RetrievalOutcome {
            timings: vec![timing(CallOutcome::Succeeded), timing(CallOutcome::TimedOut)],
            ..Default::default()
        };
        assert!(!outcome.all_failed());
        assert!(outcome.check("contextual_blend").is_ok());
    }

    #[test]
    fn nothing_scheduled_is_an_error() {
        let outcome = RetrievalOutcome {
            timings: vec![timing(CallOutcome::Skipped)],
            ..Default::default()
        };
        assert!(matches!(
            outcome.check("foundation_only"),
            Err(RetrievalError::NothingScheduled(_))
        ));
    }

    #[test]
    fn health_tracks_consecutive_failures() {
        let mut health = AdapterHealth::new("p", SourceType::Primary);
        health.record(CallOutcome::Failed, 3.0, Some("boom".into()));
        health.record(CallOutcome::TimedOut, 2000.0, Some("timed out".into()));
        assert_eq!(health.consecutive_failures, 2);
        assert!(!health.is_healthy());

        health.record(CallOutcome::Succeeded, 4.0, None);
        assert_eq!(health.calls, 3);
        assert_eq!(health.failures, 2);
        assert_eq!(health.consecutive_failures, 0);
        assert!(health.is_healthy());
    }
}
