//! Concept, candidate and orchestrator builders

use super::adapters::ScriptedAdapter;
use lexweave::{
    CandidateResult, Concept, ConceptType, CorpusDocument, InMemoryCorpus, Orchestrator,
    OrchestratorConfig, ResultMetadata, SourceAdapter, SourceType, StaticExtractor,
    TieredFoundationAdapter,
};
use std::sync::Arc;

pub fn concept(label: &str, concept_type: ConceptType, domains: &[&str]) -> Concept {
    domains.iter().fold(
        Concept::new(format!("c:{}", label), label, concept_type),
        |c, d| c.with_domain(*d),
    )
}

pub fn procedural(label: &str) -> Concept {
    concept(label, ConceptType::ProceduralRule, &["procedure"])
}

/// `count` candidates scored `top`, `top - step`, ... (never below 0).
pub fn ranked_results(
    source_id: &str,
    source_type: SourceType,
    top: f64,
    step: f64,
    count: usize,
) -> Vec<CandidateResult> {
    (0..count)
        .map(|i| {
            let mut candidate = CandidateResult::new(
                source_id,
                format!("{}:{}", source_id, i),
                format!("{} passage number {}", source_id, i),
                (top - step * i as f64).max(0.0),
                source_type,
            );
            if source_type == SourceType::Foundation {
                candidate = candidate
                    .with_metadata(ResultMetadata::new().with_cultural_appropriateness(0.9));
            }
            candidate
        })
        .collect()
}

/// Orchestrator over scripted adapters with a fixed concept list.
pub fn orchestrator_with(
    concepts: Vec<Concept>,
    primary: ScriptedAdapter,
    foundation: Vec<ScriptedAdapter>,
) -> Orchestrator {
    foundation.into_iter().fold(
        Orchestrator::new(
            OrchestratorConfig::default(),
            Arc::new(StaticExtractor::new(concepts)),
            Arc::new(primary) as Arc<dyn SourceAdapter>,
        ),
        |o, adapter| o.with_foundation(Arc::new(adapter)),
    )
}

/// Orchestrator over small in-memory statute and doctrine corpora.
pub fn corpus_orchestrator(concepts: Vec<Concept>) -> Orchestrator {
    let statutes = InMemoryCorpus::new("statutes", SourceType::Primary)
        .with_document(CorpusDocument::new(
            "labor-art-61",
            "The employer shall pay wages on time; employment contracts must state wages.",
        ))
        .with_document(CorpusDocument::new(
            "labor-art-77",
            "Termination of employment without valid reason entitles the worker to compensation.",
        ))
        .with_document(CorpusDocument::new(
            "fees-schedule",
            "Application fees and filing forms for labor court claims.",
        ))
        .with_document(CorpusDocument::new(
            "procedure-12",
            "Procedure for submitting a claim: complete the form and pay the fee.",
        ));
    let doctrine = InMemoryCorpus::new("doctrine", SourceType::Foundation)
        .with_document(
            CorpusDocument::new(
                "justice-wages",
                "Justice requires that a worker's wages be paid before his sweat dries.",
            )
            .with_cultural_appropriateness(0.95),
        )
        .with_document(
            CorpusDocument::new(
                "justice-contracts",
                "Fulfil your contracts: justice in employment and trade.",
            )
            .with_cultural_appropriateness(0.9),
        );

    Orchestrator::new(
        OrchestratorConfig::default(),
        Arc::new(StaticExtractor::new(concepts)),
        Arc::new(statutes),
    )
    .with_foundation(Arc::new(TieredFoundationAdapter::new(Arc::new(doctrine))))
}
