//! Rolling request metrics
//!
//! One accumulator is created with the orchestrator (or injected) and shared
//! by every request. All updates go through a single mutex.

use super::types::ResponseStatus;
use crate::strategy::IntegrationStrategy;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Point-in-time copy of the rolling counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_queries: u64,
    pub completed: u64,
    pub degraded: u64,
    pub failed: u64,
    pub per_strategy: BTreeMap<IntegrationStrategy, u64>,
    pub average_latency_ms: f64,
    pub average_quality: f64,
    pub last_reset_at: DateTime<Utc>,
}

impl MetricsSnapshot {
    fn zeroed() -> Self {
        Self {
            total_queries: 0,
            completed: 0,
            degraded: 0,
            failed: 0,
            per_strategy: BTreeMap::new(),
            average_latency_ms: 0.0,
            average_quality: 0.0,
            last_reset_at: Utc::now(),
        }
    }
}

#[derive(Debug)]
pub struct MetricsAccumulator {
    inner: Mutex<MetricsSnapshot>,
}

impl Default for MetricsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::zeroed()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsSnapshot> {
        // Counters stay meaningful after a panicking writer
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fold one finished request into the running counters.
    pub fn record(
        &self,
        strategy: IntegrationStrategy,
        status: ResponseStatus,
        latency_ms: f64,
        quality: f64,
    ) {
        let mut m = self.lock();
        m.total_queries += 1;
        match status {
            ResponseStatus::Completed => m.completed += 1,
            ResponseStatus::Degraded => m.degraded += 1,
            ResponseStatus::Failed => m.failed += 1,
        }
        *m.per_strategy.entry(strategy).or_insert(0) += 1;

        let n = m.total_queries as f64;
        m.average_latency_ms += (latency_ms - m.average_latency_ms) / n;
        m.average_quality += (quality - m.average_quality) / n;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.lock().clone()
    }

    /// Zero all counters. The only way counters go back down.
    pub fn reset(&self) {
        *self.lock() = MetricsSnapshot::zeroed();
    }
}
