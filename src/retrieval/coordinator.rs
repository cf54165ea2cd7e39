//! Parallel retrieval coordinator
//!
//! Fans one request out to the registered source adapters: one task per
//! scheduled adapter, each wrapped in its own timeout. Tasks return their own
//! result/timing/error triple and never touch shared state; the coordinator
//! merges after every task has been joined. A failing, slow or panicking
//! adapter costs only its own results.

use super::types::{AdapterHealth, CallOutcome, RetrievalOutcome, SourceFailure, SourceTiming};
use crate::concept::Concept;
use crate::config::{RetrievalConfig, RuntimeSettings};
use crate::source::{CandidateResult, SourceAdapter, SourceError, SourceType};
use crate::strategy::{IntegrationStrategy, QueryContext};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Owned request data shared by the spawned adapter tasks.
struct SharedRequest {
    query: String,
    concepts: Vec<Concept>,
    context: QueryContext,
}

/// What one spawned adapter task reports back.
struct CallReport {
    result: Result<Vec<CandidateResult>, SourceError>,
    outcome: CallOutcome,
    elapsed: Duration,
}

/// A scheduled call: which adapter, with what limit and timeout.
struct ScheduledCall {
    adapter: Arc<dyn SourceAdapter>,
    limit: usize,
    timeout: Duration,
}

/// Coordinates concurrent retrieval across primary and foundation adapters.
pub struct RetrievalCoordinator {
    primary: Arc<dyn SourceAdapter>,
    foundation: Vec<Arc<dyn SourceAdapter>>,
    timeouts: RetrievalConfig,
    health: DashMap<String, AdapterHealth>,
}

impl RetrievalCoordinator {
    pub fn new(primary: Arc<dyn SourceAdapter>) -> Self {
        let health = DashMap::new();
        health.insert(
            primary.id().to_string(),
            AdapterHealth::new(primary.id(), SourceType::Primary),
        );
        Self {
            primary,
            foundation: Vec::new(),
            timeouts: RetrievalConfig::default(),
            health,
        }
    }

    /// Set per-call timeouts.
    pub fn with_timeouts(mut self, timeouts: RetrievalConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Register a foundation adapter. Each gets its own task per request.
    pub fn register_foundation(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.health.insert(
            adapter.id().to_string(),
            AdapterHealth::new(adapter.id(), adapter.source_type()),
        );
        self.foundation.push(adapter);
    }

    pub fn timeouts(&self) -> &RetrievalConfig {
        &self.timeouts
    }

    pub fn has_foundation(&self) -> bool {
        !self.foundation.is_empty()
    }

    /// Identifiers of every registered adapter, primary first.
    pub fn adapter_ids(&self) -> Vec<&str> {
        std::iter::once(self.primary.id())
            .chain(self.foundation.iter().map(|a| a.id()))
            .collect()
    }

    /// Fetch candidates from every adapter the strategy and settings allow.
    ///
    /// Never fails: adapter errors, timeouts and panics come back as empty
    /// result lists with a recorded failure and timing.
    pub async fn fetch(
        &self,
        query: &str,
        concepts: &[Concept],
        context: &QueryContext,
        strategy: IntegrationStrategy,
        limit: usize,
        settings: &RuntimeSettings,
    ) -> RetrievalOutcome {
        let mut outcome = RetrievalOutcome::default();
        let mut scheduled: Vec<ScheduledCall> = Vec::new();

        if strategy.includes(SourceType::Primary) {
            scheduled.push(ScheduledCall {
                adapter: self.primary.clone(),
                limit: limit.min(settings.max_primary_results),
                timeout: self.timeouts.primary_timeout(),
            });
        } else {
            outcome.timings.push(skipped(self.primary.as_ref()));
        }

        let foundation_allowed =
            strategy.includes(SourceType::Foundation) && settings.foundation_enabled;
        for adapter in &self.foundation {
            if foundation_allowed {
                scheduled.push(ScheduledCall {
                    adapter: adapter.clone(),
                    limit: limit.min(settings.max_foundation_results),
                    timeout: self.timeouts.foundation_timeout(),
                });
            } else {
                outcome.timings.push(skipped(adapter.as_ref()));
            }
        }

        let request = Arc::new(SharedRequest {
            query: query.to_string(),
            concepts: concepts.to_vec(),
            context: context.clone(),
        });

        let reports = if settings.parallel_enabled {
            // Spawn everything first, then join in registration order
            let handles: Vec<JoinHandle<CallReport>> = scheduled
                .iter()
                .map(|call| {
                    tokio::spawn(run_call(
                        call.adapter.clone(),
                        request.clone(),
                        call.limit,
                        call.timeout,
                    ))
                })
                .collect();
            let mut reports = Vec::with_capacity(handles.len());
            for handle in handles {
                reports.push(join_report(handle).await);
            }
            reports
        } else {
            let mut reports = Vec::with_capacity(scheduled.len());
            for call in &scheduled {
                let handle = tokio::spawn(run_call(
                    call.adapter.clone(),
                    request.clone(),
                    call.limit,
                    call.timeout,
                ));
                reports.push(join_report(handle).await);
            }
            reports
        };

        for (call, report) in scheduled.iter().zip(reports) {
            self.merge(&mut outcome, call, report);
        }

        debug!(
            strategy = %strategy,
            scheduled = outcome.scheduled(),
            primary = outcome.primary.len(),
            foundation = outcome.foundation.len(),
            failures = outcome.errors.len(),
            "retrieval joined"
        );
        outcome
    }

    /// Validate, cap and file one call's report into the outcome.
    fn merge(&self, outcome: &mut RetrievalOutcome, call: &ScheduledCall, report: CallReport) {
        let adapter_id = call.adapter.id().to_string();
        let source_type = call.adapter.source_type();
        let elapsed_ms = report.elapsed.as_secs_f64() * 1000.0;

        let (results, error) = match report.result {
            Ok(raw) => {
                let mut valid = Vec::with_capacity(raw.len());
                for candidate in raw {
                    match candidate.validated(source_type) {
                        Ok(c) => valid.push(c),
                        Err(e) => warn!(adapter = %adapter_id, error = %e, "dropping invalid candidate"),
                    }
                }
                valid.truncate(call.limit);
                (valid, None)
            }
            Err(e) => {
                warn!(adapter = %adapter_id, outcome = ?report.outcome, error = %e, "source call failed");
                (Vec::new(), Some(e))
            }
        };

        if let Some(mut health) = self.health.get_mut(&adapter_id) {
            health.record(report.outcome, elapsed_ms, error.as_ref().map(|e| e.to_string()));
        }

        outcome.timings.push(SourceTiming {
            adapter_id: adapter_id.clone(),
            source_type,
            elapsed_ms,
            results: results.len(),
            outcome: report.outcome,
        });
        if let Some(error) = error {
            outcome.errors.push(SourceFailure {
                adapter_id,
                source_type,
                error,
            });
        }

        match source_type {
            SourceType::Primary => outcome.primary.extend(results),
            SourceType::Foundation => outcome.foundation.extend(results),
        }
    }

    /// Probe every adapter's availability, bounded by its call timeout.
    pub async fn probe(&self) -> Vec<AdapterHealth> {
        let targets = std::iter::once((self.primary.clone(), self.timeouts.primary_timeout()))
            .chain(
                self.foundation
                    .iter()
                    .map(|a| (a.clone(), self.timeouts.foundation_timeout())),
            );

        // Each probe runs in its own task so a panicking adapter reads as unavailable
        let probes: Vec<(Arc<dyn SourceAdapter>, JoinHandle<bool>)> = targets
            .map(|(adapter, timeout)| {
                let probed = adapter.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::timeout(timeout, probed.is_available())
                        .await
                        .unwrap_or(false)
                });
                (adapter, handle)
            })
            .collect();

        for (adapter, handle) in probes {
            let available = match handle.await {
                Ok(available) => available,
                Err(e) => {
                    warn!(adapter = adapter.id(), error = %e, "availability probe aborted");
                    false
                }
            };
            if let Some(mut health) = self.health.get_mut(adapter.id()) {
                health.available = Some(available);
            }
        }
        self.health_snapshot()
    }

    /// Current health records, primary first.
    pub fn health_snapshot(&self) -> Vec<AdapterHealth> {
        self.adapter_ids()
            .into_iter()
            .filter_map(|id| self.health.get(id).map(|h| h.clone()))
            .collect()
    }
}

fn skipped(adapter: &dyn SourceAdapter) -> SourceTiming {
    SourceTiming {
        adapter_id: adapter.id().to_string(),
        source_type: adapter.source_type(),
        elapsed_ms: 0.0,
        results: 0,
        outcome: CallOutcome::Skipped,
    }
}

async fn run_call(
    adapter: Arc<dyn SourceAdapter>,
    request: Arc<SharedRequest>,
    limit: usize,
    timeout: Duration,
) -> CallReport {
    let started = Instant::now();
    let call = adapter.search(&request.query, &request.concepts, &request.context, limit);
    let (result, outcome) = match tokio::time::timeout(timeout, call).await {
        Ok(Ok(results)) => (Ok(results), CallOutcome::Succeeded),
        Ok(Err(e)) => (Err(e), CallOutcome::Failed),
        Err(_) => (
            Err(SourceError::TimedOut(timeout.as_millis() as u64)),
            CallOutcome::TimedOut,
        ),
    };
    CallReport {
        result,
        outcome,
        elapsed: started.elapsed(),
    }
}

async fn join_report(handle: JoinHandle<CallReport>) -> CallReport {
    match handle.await {
        Ok(report) => report,
        Err(e) => CallReport {
            result: Err(SourceError::Backend(format!("adapter task aborted: {}", e))),
            outcome: CallOutcome::Failed,
            elapsed: Duration::ZERO,
        },
    }
}
