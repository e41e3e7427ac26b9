//! End-to-end matching tests: build a catalog on disk, load it back and
//! answer questions through the loaded context.

use crate::catalog::Catalog;
use crate::embeddings::providers::mock::MockProvider;
use crate::embeddings::{EmbeddingConfig, EmbeddingEngine};
use crate::index::FlatIndex;
use crate::matcher::{MatchOutcome, MatcherConfig, MatcherContext};
use crate::types::{BuildOptions, QaPair};
use crate::vector_index::{Metric, Neighbor};
use crate::{build, build_with_engine, config, stats};
use qamatch_core::{AppError, MatcherSettings};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const UNKNOWN: &str = "Désolé, je ne connais pas la réponse.";
const PROMPT: &str = "Veuillez poser une question.";

fn sample_catalog() -> Catalog {
    Catalog::from_pairs(vec![
        QaPair::new("What is your name?", "I am a bot."),
        QaPair::new("How old are you?", "I was created recently."),
    ])
    .unwrap()
}

async fn build_sample(workspace: &Path) {
    let embedding = EmbeddingConfig::default();
    let engine = EmbeddingEngine::from_config(&embedding).await.unwrap();
    build_with_engine(
        workspace,
        "faq",
        &sample_catalog(),
        &engine,
        &embedding,
        Metric::L2Squared,
    )
    .await
    .unwrap();
}

async fn load_sample(workspace: &Path) -> MatcherContext {
    MatcherContext::load(workspace, "faq", &MatcherSettings::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_paraphrase_returns_stored_answer() {
    let temp = TempDir::new().unwrap();
    build_sample(temp.path()).await;
    let ctx = load_sample(temp.path()).await;

    let answer = ctx.answer_question("what's your name").await.unwrap();
    assert_eq!(answer, "I am a bot.");
}

#[tokio::test]
async fn test_unrelated_question_returns_unknown_sentinel() {
    let temp = TempDir::new().unwrap();
    build_sample(temp.path()).await;
    let ctx = load_sample(temp.path()).await;

    let outcome = ctx.answer("What is the capital of France?").await.unwrap();
    match outcome {
        MatchOutcome::Unknown { distance, .. } => assert!(distance > ctx.config().threshold),
        other => panic!("expected unknown, got {:?}", other),
    }
    assert_eq!(ctx.reply(&outcome), UNKNOWN);
}

#[tokio::test]
async fn test_empty_question_returns_prompt_sentinel() {
    let temp = TempDir::new().unwrap();
    build_sample(temp.path()).await;
    let ctx = load_sample(temp.path()).await;

    let answer = ctx.answer_question("").await.unwrap();
    assert_eq!(answer, PROMPT);
    assert_ne!(answer, UNKNOWN);
}

#[tokio::test]
async fn test_every_question_returns_its_own_answer() {
    let temp = TempDir::new().unwrap();
    build_sample(temp.path()).await;
    let ctx = load_sample(temp.path()).await;

    let catalog = sample_catalog();
    for (question, answer) in catalog.questions().iter().zip(catalog.answers()) {
        assert_eq!(&ctx.answer_question(question).await.unwrap(), answer);
    }
}

#[tokio::test]
async fn test_matching_is_deterministic() {
    let temp = TempDir::new().unwrap();
    build_sample(temp.path()).await;
    let first = load_sample(temp.path()).await;
    let second = load_sample(temp.path()).await;

    for query in ["what's your name", "how old", "capital of France", "  "] {
        let a = first.answer(query).await.unwrap();
        let b = first.answer(query).await.unwrap();
        let c = second.answer(query).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }
}

#[tokio::test]
async fn test_blank_input_never_reaches_provider() {
    let mock = Arc::new(MockProvider::new(384));
    let catalog = sample_catalog();
    let vectors = {
        let engine = EmbeddingEngine::new(Arc::new(MockProvider::new(384)), 8);
        engine.embed_texts(catalog.questions()).await.unwrap()
    };
    let index = FlatIndex::build(Metric::L2Squared, &vectors).unwrap();
    let ctx = MatcherContext::new(
        catalog,
        index,
        EmbeddingEngine::new(mock.clone(), 8),
        MatcherConfig::default(),
    )
    .unwrap();

    assert_eq!(ctx.answer("").await.unwrap(), MatchOutcome::EmptyInput);
    assert_eq!(ctx.answer("   ").await.unwrap(), MatchOutcome::EmptyInput);
    assert_eq!(mock.batch_calls(), 0);
}

#[tokio::test]
async fn test_threshold_decision_is_monotonic() {
    let temp = TempDir::new().unwrap();
    build_sample(temp.path()).await;
    let ctx = load_sample(temp.path()).await;
    let threshold = ctx.config().threshold;

    for step in 0..=40 {
        let distance = step as f32 * 0.025;
        for position in 0..2 {
            let outcome = ctx.decide(Neighbor { distance, position });
            if distance <= threshold {
                assert_eq!(
                    ctx.reply(&outcome),
                    ctx.catalog().answer(position).unwrap()
                );
            } else {
                assert_eq!(ctx.reply(&outcome), UNKNOWN);
            }
        }
    }
}

#[tokio::test]
async fn test_custom_threshold_and_sentinels() {
    let temp = TempDir::new().unwrap();
    build_sample(temp.path()).await;

    let settings = MatcherSettings {
        threshold: 0.0,
        prompt_reply: "Ask me something.".to_string(),
        unknown_reply: "No idea.".to_string(),
        ..Default::default()
    };
    let ctx = MatcherContext::load(temp.path(), "faq", &settings)
        .await
        .unwrap();

    assert_eq!(ctx.answer_question(" ").await.unwrap(), "Ask me something.");
    assert_eq!(
        ctx.answer_question("How old are you?").await.unwrap(),
        "I was created recently."
    );
    assert_eq!(ctx.answer_question("old age").await.unwrap(), "No idea.");
}

#[tokio::test]
async fn test_build_from_source_file() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("qa.yaml");
    std::fs::write(
        &source,
        "- question: What is your name?\n  answer: I am a bot.\n\
         - question: How old are you?\n  answer: I was created recently.\n",
    )
    .unwrap();

    let built = build(
        temp.path(),
        BuildOptions {
            catalog_name: "faq".to_string(),
            source,
            embedding: EmbeddingConfig::default(),
            metric: Metric::L2Squared,
        },
    )
    .await
    .unwrap();
    assert_eq!(built.entries, 2);
    assert_eq!(built.dimensions, 384);

    let catalog_stats = stats(temp.path(), "faq").unwrap();
    assert_eq!(catalog_stats.entries, 2);
    assert_eq!(catalog_stats.provider, "trigram");
    assert_eq!(catalog_stats.index_bytes, built.index_bytes);
    assert!(catalog_stats.catalog_bytes > 0);
}

#[tokio::test]
async fn test_build_rejects_empty_source() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("qa.json");
    std::fs::write(&source, "[]").unwrap();

    let result = build(
        temp.path(),
        BuildOptions {
            catalog_name: "faq".to_string(),
            source,
            embedding: EmbeddingConfig::default(),
            metric: Metric::L2Squared,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::EmptyCatalog)));
    assert!(!config::get_index_path(temp.path(), "faq").exists());
}

#[tokio::test]
async fn test_load_rejects_replaced_catalog() {
    let temp = TempDir::new().unwrap();
    build_sample(temp.path()).await;

    let replaced = Catalog::from_pairs(vec![
        QaPair::new("How old are you?", "I was created recently."),
        QaPair::new("What is your name?", "I am a bot."),
    ])
    .unwrap();
    replaced
        .save(&config::get_catalog_path(temp.path(), "faq"))
        .unwrap();

    let result = MatcherContext::load(temp.path(), "faq", &MatcherSettings::default()).await;
    assert!(matches!(result, Err(AppError::CatalogMismatch(_))));
}

#[tokio::test]
async fn test_load_rejects_truncated_index() {
    let temp = TempDir::new().unwrap();
    build_sample(temp.path()).await;

    let index_path = config::get_index_path(temp.path(), "faq");
    let bytes = std::fs::read(&index_path).unwrap();
    std::fs::write(&index_path, &bytes[..bytes.len() / 2]).unwrap();

    let result = MatcherContext::load(temp.path(), "faq", &MatcherSettings::default()).await;
    assert!(matches!(result, Err(AppError::CorruptIndex(_))));
}

#[tokio::test]
async fn test_load_rejects_metric_change() {
    let temp = TempDir::new().unwrap();
    build_sample(temp.path()).await;

    let settings = MatcherSettings {
        metric: "cosine".to_string(),
        ..Default::default()
    };
    let result = MatcherContext::load(temp.path(), "faq", &settings).await;
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
async fn test_load_missing_catalog() {
    let temp = TempDir::new().unwrap();
    let result = MatcherContext::load(temp.path(), "faq", &MatcherSettings::default()).await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("qamatch build"));
}

#[tokio::test]
async fn test_concurrent_queries_share_context() {
    let temp = TempDir::new().unwrap();
    build_sample(temp.path()).await;
    let ctx = Arc::new(load_sample(temp.path()).await);

    let mut handles = Vec::new();
    for i in 0..8 {
        let ctx = Arc::clone(&ctx);
        handles.push(tokio::spawn(async move {
            let query = if i % 2 == 0 { "what's your name" } else { "" };
            ctx.answer_question(query).await.unwrap()
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let answer = handle.await.unwrap();
        let expected = if i % 2 == 0 { "I am a bot." } else { PROMPT };
        assert_eq!(answer, expected);
    }
}

#[tokio::test]
async fn test_load_rejects_stale_manifest_count() {
    let temp = TempDir::new().unwrap();
    build_sample(temp.path()).await;

    let mut manifest = config::load_config(temp.path(), "faq").unwrap();
    manifest.entries = 3;
    config::save_config(temp.path(), &manifest).unwrap();

    let result = MatcherContext::load(temp.path(), "faq", &MatcherSettings::default()).await;
    assert!(matches!(result, Err(AppError::CatalogMismatch(_))));
}

#[tokio::test]
async fn test_build_records_provider_model() {
    let temp = TempDir::new().unwrap();
    let embedding = EmbeddingConfig {
        model: "all-minilm".to_string(),
        ..EmbeddingConfig::default()
    };
    let engine = EmbeddingEngine::from_config(&embedding).await.unwrap();

    build_with_engine(
        temp.path(),
        "faq",
        &sample_catalog(),
        &engine,
        &embedding,
        Metric::L2Squared,
    )
    .await
    .unwrap();

    let manifest = config::load_config(temp.path(), "faq").unwrap();
    assert_eq!(manifest.embedding.model, "trigram-v1");
    assert_eq!(stats(temp.path(), "faq").unwrap().model, "trigram-v1");
}
