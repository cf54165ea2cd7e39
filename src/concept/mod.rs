//! Typed query concepts and the extraction service contract

mod extractor;
mod types;

pub use extractor::{
    ConceptExtractor, ExtractionError, LexiconEntry, LexiconExtractor, StaticExtractor,
};
pub use types::{normalize_text, Concept, ConceptType};
