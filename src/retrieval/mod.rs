//! Concurrent multi-source retrieval
//!
//! The coordinator schedules one task per allowed adapter, bounds each with a
//! timeout and merges the per-source results after the join.

mod coordinator;
mod types;

pub use coordinator::RetrievalCoordinator;
pub use types::{
    AdapterHealth, CallOutcome, RetrievalError, RetrievalOutcome, SourceFailure, SourceTiming,
};
