//! Orchestrator facade
//!
//! The public entry point: `Orchestrator::retrieve`, `health`, `configure`
//! and `reset_metrics`.

mod facade;
mod metrics;
mod types;

pub use facade::Orchestrator;
pub use metrics::{MetricsAccumulator, MetricsSnapshot};
pub use types::{
    HealthReport, HealthStatus, IntegratedResponse, RequestState, ResponseStatus, TimingBreakdown,
};
