//! Orchestrator facade
//!
//! Runs one query through extraction, selection, retrieval, integration and
//! scoring. Any stage failure moves the request to `Degraded`, which retries
//! retrieval with the primary adapter alone under `PrimaryOnly`. If that
//! fails as well the caller gets an empty response. `retrieve` never errors.

use super::metrics::MetricsAccumulator;
use super::types::{
    HealthReport, HealthStatus, IntegratedResponse, RequestState, ResponseStatus, TimingBreakdown,
};
use crate::concept::{Concept, ConceptExtractor};
use crate::config::{ConfigError, OrchestratorConfig, RuntimeSettings};
use crate::integration::{IntegratedBuckets, IntegrationError, ResultIntegrator};
use crate::quality::{QualityError, QualityMetrics, QualityScorer};
use crate::retrieval::{RetrievalCoordinator, RetrievalError};
use crate::source::{SourceAdapter, SourceType};
use crate::strategy::{IntegrationStrategy, QueryContext, StrategySelector};
use chrono::Utc;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A pipeline stage failure. Never leaves the facade.
#[derive(Debug, Error)]
enum StageError {
    #[error("retrieval: {0}")]
    Retrieval(#[from] RetrievalError),
    #[error("integration: {0}")]
    Integration(#[from] IntegrationError),
    #[error("scoring: {0}")]
    Scoring(#[from] QualityError),
}

/// Per-request bookkeeping carried through the stages.
struct RequestRun<'a> {
    id: Uuid,
    query: &'a str,
    context: &'a QueryContext,
    concepts: Vec<Concept>,
    ceiling: usize,
    settings: RuntimeSettings,
    trace: Vec<RequestState>,
    timing: TimingBreakdown,
}

impl RequestRun<'_> {
    fn enter(&mut self, state: RequestState) {
        debug!(request_id = %self.id, state = ?state, "request state");
        self.trace.push(state);
    }
}

/// Contextual multi-source retrieval orchestrator.
pub struct Orchestrator {
    config: OrchestratorConfig,
    extractor: Arc<dyn ConceptExtractor>,
    selector: StrategySelector,
    coordinator: RetrievalCoordinator,
    integrator: ResultIntegrator,
    scorer: QualityScorer,
    settings: RwLock<RuntimeSettings>,
    metrics: Arc<MetricsAccumulator>,
}

impl Orchestrator {
    /// Create an orchestrator with a primary adapter and no foundation adapters.
    pub fn new(
        config: OrchestratorConfig,
        extractor: Arc<dyn ConceptExtractor>,
        primary: Arc<dyn SourceAdapter>,
    ) -> Self {
        let coordinator =
            RetrievalCoordinator::new(primary).with_timeouts(config.retrieval.clone());
        Self {
            extractor,
            selector: StrategySelector::new(config.selector.clone()),
            coordinator,
            integrator: ResultIntegrator::new(config.integration.clone()),
            scorer: QualityScorer::new(config.quality.clone()),
            settings: RwLock::new(config.runtime),
            metrics: Arc::new(MetricsAccumulator::new()),
            config,
        }
    }

    /// Register a foundation adapter. Each gets its own task per request.
    pub fn with_foundation(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.coordinator.register_foundation(adapter);
        self
    }

    /// Share an existing metrics accumulator.
    pub fn with_metrics(mut self, metrics: Arc<MetricsAccumulator>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsAccumulator> {
        &self.metrics
    }

    pub fn settings(&self) -> RuntimeSettings {
        *self
            .settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the runtime settings for subsequent requests.
    ///
    /// Returns the previous settings. In-flight requests keep the settings
    /// they started with.
    pub fn configure(&self, settings: RuntimeSettings) -> Result<RuntimeSettings, ConfigError> {
        settings.validate()?;
        let mut guard = self
            .settings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = std::mem::replace(&mut *guard, settings);
        info!(
            foundation_enabled = settings.foundation_enabled,
            parallel_enabled = settings.parallel_enabled,
            max_primary = settings.max_primary_results,
            max_foundation = settings.max_foundation_results,
            "runtime settings updated"
        );
        Ok(previous)
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
        info!("metrics reset");
    }

    /// Probe adapters and report overall status with the rolling metrics.
    pub async fn health(&self) -> HealthReport {
        let adapters = self.coordinator.probe().await;
        let primary_ok = adapters
            .iter()
            .filter(|h| h.source_type == SourceType::Primary)
            .all(|h| h.is_healthy());
        let foundation_ok = adapters
            .iter()
            .filter(|h| h.source_type == SourceType::Foundation)
            .all(|h| h.is_healthy());
        let status = match (primary_ok, foundation_ok) {
            (false, _) => HealthStatus::Unhealthy,
            (true, false) => HealthStatus::Degraded,
            (true, true) => HealthStatus::Healthy,
        };
        HealthReport {
            status,
            adapters,
            metrics: self.metrics.snapshot(),
            settings: self.settings(),
        }
    }

    /// Retrieve with an empty context and the default result limit.
    pub async fn query(&self, query: &str) -> IntegratedResponse {
        self.retrieve(query, &QueryContext::default(), self.config.result_ceiling)
            .await
    }

    /// Answer one query. Total: every input yields a well-formed response.
    ///
    /// `limit` caps the number of results across all buckets and is itself
    /// capped by `result_ceiling`.
    pub async fn retrieve(
        &self,
        query: &str,
        context: &QueryContext,
        limit: usize,
    ) -> IntegratedResponse {
        let started = Instant::now();
        let mut run = RequestRun {
            id: Uuid::new_v4(),
            query,
            context,
            concepts: Vec::new(),
            ceiling: limit.min(self.config.result_ceiling),
            settings: self.settings(),
            trace: vec![RequestState::Started],
            timing: TimingBreakdown::default(),
        };

        let stage = Instant::now();
        run.concepts = self.extract_concepts(&run).await;
        run.timing.extraction_ms = millis(stage.elapsed());
        run.enter(RequestState::ConceptsExtracted);

        let stage = Instant::now();
        let decision = self.selector.decide(query, &run.concepts, context);
        let (strategy, mut explanation) = match decision.strategy {
            IntegrationStrategy::FoundationOnly if !run.settings.foundation_enabled => (
                IntegrationStrategy::PrimaryOnly,
                format!("primary_only <- foundation_disabled; {}", decision.explanation()),
            ),
            IntegrationStrategy::FoundationFirst if !run.settings.foundation_enabled => (
                IntegrationStrategy::PrimaryWithFoundation,
                format!(
                    "primary_with_foundation <- foundation_disabled; {}",
                    decision.explanation()
                ),
            ),
            _ => (decision.strategy, decision.explanation()),
        };
        run.timing.selection_ms = millis(stage.elapsed());
        run.enter(RequestState::StrategySelected);
        debug!(request_id = %run.id, %strategy, explanation = %explanation, "strategy selected");

        let (status, strategy, buckets, quality) =
            match self.run_pipeline(&mut run, strategy).await {
                Ok((buckets, quality)) => {
                    run.enter(RequestState::Completed);
                    (ResponseStatus::Completed, strategy, buckets, quality)
                }
                Err(first) => {
                    warn!(
                        request_id = %run.id,
                        %strategy,
                        error = %first,
                        "stage failed, degrading to primary-only retrieval"
                    );
                    run.enter(RequestState::Degraded);
                    let fallback = IntegrationStrategy::PrimaryOnly;
                    match self.run_pipeline(&mut run, fallback).await {
                        Ok((buckets, quality)) => {
                            explanation = format!(
                                "primary_only <- degraded: {}; selected {}",
                                first, explanation
                            );
                            (ResponseStatus::Degraded, fallback, buckets, quality)
                        }
                        Err(second) => {
                            error!(
                                request_id = %run.id,
                                error = %second,
                                "degraded retrieval failed, returning empty response"
                            );
                            explanation = format!(
                                "primary_only <- failed: {}; fallback: {}; selected {}",
                                first, second, explanation
                            );
                            (
                                ResponseStatus::Failed,
                                fallback,
                                IntegratedBuckets::default(),
                                QualityMetrics::empty(self.scorer.config()),
                            )
                        }
                    }
                }
            };

        run.timing.total_ms = millis(started.elapsed());
        self.metrics.record(
            strategy,
            status,
            run.timing.total_ms,
            quality.integration_quality,
        );
        info!(
            request_id = %run.id,
            %strategy,
            status = ?status,
            results = buckets.len(),
            elapsed_ms = run.timing.total_ms,
            "query answered"
        );

        IntegratedResponse {
            request_id: run.id,
            created_at: Utc::now(),
            query: query.to_string(),
            strategy,
            strategy_explanation: explanation,
            status,
            state_trace: run.trace,
            primary: buckets.primary,
            supporting: buckets.supporting,
            contextual: buckets.contextual,
            quality,
            timing: run.timing,
            concepts: run.concepts,
        }
    }

    /// Extraction runs in its own task so a panicking extractor means "no
    /// concepts" rather than a failed request.
    async fn extract_concepts(&self, run: &RequestRun<'_>) -> Vec<Concept> {
        let timeout = self.config.retrieval.extractor_timeout();
        let extractor = Arc::clone(&self.extractor);
        let query = run.query.to_string();
        let context = run.context.clone();
        let mut handle =
            tokio::spawn(async move { extractor.extract(&query, &context).await });

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(Ok(concepts))) => concepts,
            Ok(Ok(Err(e))) => {
                warn!(request_id = %run.id, extractor = self.extractor.id(), error = %e, "concept extraction failed");
                Vec::new()
            }
            Ok(Err(e)) => {
                warn!(request_id = %run.id, extractor = self.extractor.id(), error = %e, "concept extractor panicked");
                Vec::new()
            }
            Err(_) => {
                handle.abort();
                warn!(
                    request_id = %run.id,
                    extractor = self.extractor.id(),
                    timeout_ms = timeout.as_millis() as u64,
                    "concept extraction timed out"
                );
                Vec::new()
            }
        }
    }

    /// Retrieving, Integrating and Scored under one strategy.
    async fn run_pipeline(
        &self,
        run: &mut RequestRun<'_>,
        strategy: IntegrationStrategy,
    ) -> Result<(IntegratedBuckets, QualityMetrics), StageError> {
        run.enter(RequestState::Retrieving);
        let stage = Instant::now();
        let outcome = self
            .coordinator
            .fetch(
                run.query,
                &run.concepts,
                run.context,
                strategy,
                run.ceiling,
                &run.settings,
            )
            .await;
        run.timing.retrieval_ms += millis(stage.elapsed());
        run.timing.sources.extend(outcome.timings.iter().cloned());
        let outcome = outcome.check(strategy.as_str())?;

        run.enter(RequestState::Integrating);
        let stage = Instant::now();
        let buckets = self.integrator.integrate(
            &outcome.primary,
            &outcome.foundation,
            strategy,
            &run.concepts,
            run.ceiling,
        );
        run.timing.integration_ms += millis(stage.elapsed());
        let buckets = buckets?;

        let stage = Instant::now();
        let quality = self.scorer.try_score(
            &buckets.primary,
            &buckets.supporting,
            &buckets.contextual,
            &run.concepts,
            strategy,
        );
        run.timing.scoring_ms += millis(stage.elapsed());
        let quality = quality?;
        run.enter(RequestState::Scored);

        Ok((buckets, quality))
    }
}

fn millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}
