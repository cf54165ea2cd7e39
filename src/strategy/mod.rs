//! Integration strategies and their selection

mod selector;
mod types;

pub use selector::{PhraseKind, SelectionReason, StrategyDecision, StrategySelector};
pub use types::{ComplexityLevel, IntegrationStrategy, QueryContext, SourcePreference};
