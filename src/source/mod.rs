//! Source adapter layer
//!
//! Corpus backends plug into the orchestrator through `SourceAdapter`.
//! Candidates are validated at this boundary before anything downstream
//! reads their scores or metadata.

mod foundation;
mod memory;
mod traits;
mod types;

pub use foundation::TieredFoundationAdapter;
pub use memory::{CorpusDocument, InMemoryCorpus};
pub use traits::{FoundationBackend, SourceAdapter, SourceError};
pub use types::{
    CandidateResult, ResultMetadata, SearchTier, SourceType, METADATA_SCHEMA_VERSION,
};
