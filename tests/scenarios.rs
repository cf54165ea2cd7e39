//! End-to-end query scenarios
//!
//! Run with: `cargo test --test scenarios`

mod common;

use common::{concept, corpus_orchestrator, orchestrator_with, procedural, ScriptedAdapter};
use lexweave::{
    CallOutcome, ConceptType, IntegrationStrategy, Orchestrator, OrchestratorConfig,
    QueryContext, ResponseStatus, SourceAdapter, SourceType, StaticExtractor,
};
use std::sync::Arc;

// === Scenario: justice concept in the employment domain leads with foundation ===
#[tokio::test]
async fn justice_employment_query_is_foundation_first() {
    let concepts = vec![concept("justice", ConceptType::JusticePrinciple, &["employment"])];
    let primary = ScriptedAdapter::new(
        "statutes",
        SourceType::Primary,
        common::adapters::Behavior::Return(common::ranked_results(
            "statutes",
            SourceType::Primary,
            0.9,
            0.1,
            5,
        )),
    );
    let foundation = ScriptedAdapter::new(
        "doctrine",
        SourceType::Foundation,
        common::adapters::Behavior::Return(common::ranked_results(
            "doctrine",
            SourceType::Foundation,
            0.8,
            0.1,
            3,
        )),
    );
    let orchestrator = orchestrator_with(concepts, primary, vec![foundation]);

    let response = orchestrator
        .retrieve("my employer withheld my salary", &QueryContext::default(), 15)
        .await;

    assert_eq!(response.status, ResponseStatus::Completed);
    assert_eq!(response.strategy, IntegrationStrategy::FoundationFirst);
    assert!(response
        .strategy_explanation
        .starts_with("foundation_first <- foundation_affinity:1.00"));

    // FoundationFirst: foundation leads, primary supports
    assert_eq!(response.primary.len(), 3);
    assert!(response.primary.iter().all(|r| r.source_type() == SourceType::Foundation));
    assert_eq!(response.supporting.len(), 3);
    assert!(response.supporting.iter().all(|r| r.source_type() == SourceType::Primary));
    assert_eq!(response.contextual.len(), 2);

    // Foundation: raw × 0.7 + affinity 0.15; primary: raw × 0.5
    let top = &response.primary[0];
    assert!((top.adjusted_score - (0.8 * 0.7 + 0.15)).abs() < 1e-9);
    assert!((response.supporting[0].adjusted_score - 0.45).abs() < 1e-9);

    // integration_quality with ideal foundation ratio 0.7
    let total = response.total_results() as f64;
    let ratio = response
        .results()
        .filter(|r| r.source_type() == SourceType::Foundation)
        .count() as f64
        / total;
    let mean = response.results().map(|r| r.adjusted_score).sum::<f64>() / total;
    let expected = 0.4 * (1.0 - (0.7 - ratio).abs()) + 0.6 * mean;
    assert!((response.quality.integration_quality - expected).abs() < 1e-9);
    assert!((response.quality.integration_quality - 0.54525).abs() < 1e-6);
    assert!((response.quality.cultural_appropriateness - 0.9).abs() < 1e-9);
}

// === Scenario: Arabic fee/form question with procedural concepts stays primary-only ===
#[tokio::test]
async fn arabic_fee_query_is_primary_only() {
    let foundation = Arc::new(ScriptedAdapter::returning("doctrine", SourceType::Foundation, 3));
    let orchestrator = Orchestrator::new(
        OrchestratorConfig::default(),
        Arc::new(StaticExtractor::new(vec![
            procedural("application fee"),
            procedural("submission form"),
        ])),
        Arc::new(ScriptedAdapter::returning("statutes", SourceType::Primary, 4)),
    )
    .with_foundation(foundation.clone() as Arc<dyn SourceAdapter>);

    for _ in 0..3 {
        let response = orchestrator
            .retrieve("ما هي رسوم تقديم الطلب", &QueryContext::default(), 15)
            .await;

        assert_eq!(response.strategy, IntegrationStrategy::PrimaryOnly);
        assert_eq!(response.status, ResponseStatus::Completed);
        assert_eq!(response.total_results(), 4);
        assert!(response.results().all(|r| r.source_type() == SourceType::Primary));

        let foundation_timing = response
            .timing
            .sources
            .iter()
            .find(|t| t.adapter_id == "doctrine")
            .unwrap();
        assert_eq!(foundation_timing.outcome, CallOutcome::Skipped);
    }
    assert_eq!(foundation.calls(), 0);
}

// === Scenario: in-memory corpora answer a wages question ===
#[tokio::test]
async fn corpus_backed_wages_query() {
    let orchestrator = corpus_orchestrator(vec![concept(
        "justice",
        ConceptType::JusticePrinciple,
        &["employment"],
    )]);
    let response = orchestrator.query("unpaid wages after employment ended").await;

    assert_eq!(response.status, ResponseStatus::Completed);
    assert_eq!(response.strategy, IntegrationStrategy::FoundationFirst);
    assert!(!response.primary.is_empty());
    assert!(response.primary.iter().all(|r| r.source_type() == SourceType::Foundation));
    assert!(response.supporting.iter().all(|r| r.source_type() == SourceType::Primary));
    // the justice label appears in retained doctrine text
    assert_eq!(response.quality.legal_completeness, 1.0);
}

// === Scenario: an explicit doctrinal phrase overrides concept ratios ===
#[tokio::test]
async fn doctrinal_phrase_overrides_procedural_concepts() {
    let orchestrator = corpus_orchestrator(vec![procedural("claim procedure")]);
    let response = orchestrator
        .query("what is the doctrinal basis for paying wages")
        .await;
    assert_eq!(response.strategy, IntegrationStrategy::FoundationFirst);
    assert!(response.strategy_explanation.contains("doctrinal_basis"));
}
