//! Result integration
//!
//! Turns the raw candidates of both corpora into three disjoint buckets under
//! the selected strategy.

mod integrator;
mod types;

pub use integrator::ResultIntegrator;
pub use types::{AdjustedResult, Bucket, IntegratedBuckets, IntegrationError};
