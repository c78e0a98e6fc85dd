//! End-to-end pipeline tests against an in-memory index and stub collaborators.

use sahayak_core::config::AppConfig;
use sahayak_core::{AppError, AppResult};
use sahayak_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use sahayak_pipeline::pipeline::QueryPipeline;
use sahayak_pipeline::policy::Verdict;
use sahayak_pipeline::qlog::NullQueryLog;
use sahayak_pipeline::session::InMemorySessionStore;
use sahayak_pipeline::synthesize::Synthesizer;
use sahayak_pipeline::types::{messages, ChatRequest};
use sahayak_retrieval::index::InMemoryIndex;
use sahayak_retrieval::{Embedder, Passage, Retriever, Topic};
use std::sync::{Arc, Mutex};

/// Embedder that maps every text to the same unit vector, so passage
/// distances are fully controlled by the fixture embeddings.
#[derive(Debug)]
struct ConstEmbedder;

#[async_trait::async_trait]
impl Embedder for ConstEmbedder {
    fn provider_name(&self) -> &str {
        "const"
    }

    fn dimensions(&self) -> usize {
        2
    }

    async fn embed(&self, _text: &str) -> AppResult<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }
}

/// Client that records every prompt it receives and answers with a fixed string.
struct CapturingClient {
    prompts: Arc<Mutex<Vec<String>>>,
    answer: String,
}

impl CapturingClient {
    fn new(answer: &str) -> (Arc<Self>, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let client = Arc::new(Self {
            prompts: Arc::clone(&prompts),
            answer: answer.to_string(),
        });
        (client, prompts)
    }
}

#[async_trait::async_trait]
impl LlmClient for CapturingClient {
    fn provider_name(&self) -> &str {
        "capturing"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        Ok(LlmResponse {
            content: self.answer.clone(),
            model: "test".to_string(),
            usage: LlmUsage::default(),
        })
    }
}

/// Client that always fails.
struct FailingClient;

#[async_trait::async_trait]
impl LlmClient for FailingClient {
    fn provider_name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
        Err(AppError::Llm("service unavailable".to_string()))
    }
}

/// A passage whose embedding sits at the given cosine distance from the
/// query vector [1, 0].
fn passage_at(id: &str, title: &str, topic: Topic, distance: f32) -> Passage {
    let similarity = 1.0 - distance;
    let y = (1.0 - similarity * similarity).max(0.0).sqrt();
    Passage {
        id: id.to_string(),
        title: title.to_string(),
        url: Some(format!("https://startupindia.gov.in/{}", id)),
        topic,
        text: format!("Details about {}.", title),
        embedding: vec![similarity, y],
    }
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.llm.timeout_secs = 1;
    config.llm.retry_backoff_ms = 10;
    config
}

fn build_pipeline(passages: Vec<Passage>, client: Arc<dyn LlmClient>) -> QueryPipeline {
    let config = test_config();
    let retriever = Retriever::new(
        Arc::new(InMemoryIndex::from_passages(passages)),
        config.retrieval.topic_boost,
    );
    let synthesizer =
        Synthesizer::new(client, config.model.clone(), config.llm.clone()).unwrap();

    QueryPipeline::new(
        config,
        Arc::new(ConstEmbedder),
        retriever,
        synthesizer,
        Arc::new(InMemorySessionStore::new()),
        Arc::new(NullQueryLog),
    )
}

/// A fixture with five close general-topic passages, "Startup India
/// Initiative" closest at distance 0.1.
fn startup_india_fixture() -> Vec<Passage> {
    vec![
        passage_at("p1", "Startup India Initiative", Topic::General, 0.1),
        passage_at("p2", "Action Plan", Topic::General, 0.2),
        passage_at("p3", "Benefits Overview", Topic::General, 0.25),
        passage_at("p4", "Recognition Basics", Topic::General, 0.3),
        passage_at("p5", "Portal Guide", Topic::General, 0.35),
    ]
}

#[tokio::test]
async fn test_answerable_query_with_sources() {
    let (client, _) = CapturingClient::new("Startup India is a government initiative.");
    let pipeline = build_pipeline(startup_india_fixture(), client);

    let response = pipeline
        .handle(ChatRequest::new("What is Startup India?").with_debug())
        .await
        .unwrap();

    assert_eq!(response.topic_detected, Topic::General);
    assert!((response.sources[0].similarity - 90.0).abs() < 0.5);
    assert_eq!(response.sources[0].title, "Startup India Initiative");
    assert_eq!(response.debug.as_ref().unwrap().verdict, Verdict::Answerable);
    assert!(response.response.contains("government initiative"));
    assert!(response.confidence >= 0.75);
    assert!(response.processing_time >= 0.0);
}

#[tokio::test]
async fn test_empty_index_refuses_with_zero_confidence() {
    let (client, prompts) = CapturingClient::new("unused");
    let pipeline = build_pipeline(vec![], client);

    let response = pipeline
        .handle(ChatRequest::new("What is Startup India?").with_debug())
        .await
        .unwrap();

    assert_eq!(response.confidence, 0.0);
    assert!(response.sources.is_empty());
    assert_eq!(response.debug.as_ref().unwrap().verdict, Verdict::Refuse);
    assert_eq!(response.response, messages::NO_RESULTS);
    // The completion service is skipped entirely
    assert!(prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_distant_matches_refuse() {
    let (client, prompts) = CapturingClient::new("unused");
    let pipeline = build_pipeline(
        vec![
            passage_at("p1", "Unrelated A", Topic::General, 0.9),
            passage_at("p2", "Unrelated B", Topic::General, 0.95),
        ],
        client,
    );

    let response = pipeline
        .handle(ChatRequest::new("asdkjhaskjdh").with_debug())
        .await
        .unwrap();

    assert_eq!(response.topic_detected, Topic::Unknown);
    assert!(response.confidence < 0.40);
    assert!(response.sources.is_empty());
    assert_eq!(response.debug.as_ref().unwrap().verdict, Verdict::Refuse);
    assert!(prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_off_topic_refuses_regardless_of_distance() {
    let (client, prompts) = CapturingClient::new("unused");
    let pipeline = build_pipeline(startup_india_fixture(), client);

    let response = pipeline
        .handle(ChatRequest::new("what's the weather today?"))
        .await
        .unwrap();

    assert_eq!(response.topic_detected, Topic::OffTopic);
    assert!(response.sources.is_empty());
    assert_eq!(response.response, messages::OFF_TOPIC);
    assert!(prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_sources_capped_and_sorted() {
    let (client, _) = CapturingClient::new("answer");
    let pipeline = build_pipeline(startup_india_fixture(), client);

    let response = pipeline
        .handle(ChatRequest::new("What is Startup India?"))
        .await
        .unwrap();

    assert!(response.sources.len() <= 3);
    for pair in response.sources.windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[tokio::test]
async fn test_idempotent_retrieval() {
    let (client_a, _) = CapturingClient::new("answer");
    let (client_b, _) = CapturingClient::new("answer");
    let fixture = startup_india_fixture();

    let first = build_pipeline(fixture.clone(), client_a)
        .handle(ChatRequest::new("What is Startup India?"))
        .await
        .unwrap();
    let second = build_pipeline(fixture, client_b)
        .handle(ChatRequest::new("What is Startup India?"))
        .await
        .unwrap();

    assert_eq!(first.topic_detected, second.topic_detected);
    assert_eq!(first.confidence, second.confidence);

    let titles = |sources: &[sahayak_pipeline::SourceRef]| {
        sources.iter().map(|s| s.title.clone()).collect::<Vec<_>>()
    };
    assert_eq!(titles(&first.sources), titles(&second.sources));
}

#[tokio::test]
async fn test_session_continuity_in_prompt() {
    let (client, prompts) = CapturingClient::new("Several schemes offer funding.");
    let passages = vec![
        passage_at("f1", "Seed Fund Scheme", Topic::Funding, 0.1),
        passage_at("f2", "Fund of Funds", Topic::Funding, 0.15),
        passage_at("f3", "Credit Guarantee", Topic::Funding, 0.2),
        passage_at("f4", "Women Entrepreneurship Platform", Topic::WomenEntrepreneurs, 0.25),
        passage_at("f5", "Incubator Support", Topic::Funding, 0.3),
    ];
    let pipeline = build_pipeline(passages, client);

    pipeline
        .handle(ChatRequest::new("Tell me about funding").with_session("s-42"))
        .await
        .unwrap();

    pipeline
        .handle(ChatRequest::new("what about for women?").with_session("s-42"))
        .await
        .unwrap();

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    // The first turn carries no history
    assert!(!prompts[0].contains("Recent conversation:"));
    // The second prompt replays the first exchange
    assert!(prompts[1].contains("Recent conversation:"));
    assert!(prompts[1].contains("Tell me about funding"));
    assert!(prompts[1].contains("Several schemes offer funding."));
}

#[tokio::test]
async fn test_sessions_do_not_leak_across_ids() {
    let (client, prompts) = CapturingClient::new("answer");
    let pipeline = build_pipeline(startup_india_fixture(), client);

    pipeline
        .handle(ChatRequest::new("What is Startup India?").with_session("s-1"))
        .await
        .unwrap();
    pipeline
        .handle(ChatRequest::new("What is Startup India?").with_session("s-2"))
        .await
        .unwrap();

    let prompts = prompts.lock().unwrap();
    assert!(!prompts[1].contains("Recent conversation:"));
}

#[tokio::test]
async fn test_generation_failure_keeps_confidence_and_sources() {
    let pipeline = build_pipeline(startup_india_fixture(), Arc::new(FailingClient));

    let response = pipeline
        .handle(ChatRequest::new("What is Startup India?"))
        .await
        .unwrap();

    // Distinct from a refusal: retrieval evidence survives
    assert!(response.response.starts_with(messages::GENERATION_FAILED));
    assert!(response.confidence >= 0.75);
    assert!(!response.sources.is_empty());
    assert!(response.response.contains("Startup India Initiative"));
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let (client, _) = CapturingClient::new("unused");
    let pipeline = build_pipeline(startup_india_fixture(), client);

    let result = pipeline.handle(ChatRequest::new("   ")).await;
    assert!(matches!(result, Err(AppError::MalformedRequest(_))));
}

#[tokio::test]
async fn test_oversized_message_rejected() {
    let (client, _) = CapturingClient::new("unused");
    let pipeline = build_pipeline(startup_india_fixture(), client);

    let result = pipeline.handle(ChatRequest::new("x".repeat(501))).await;
    assert!(matches!(result, Err(AppError::MalformedRequest(_))));
}

#[tokio::test]
async fn test_session_id_generated_when_absent() {
    let (client, _) = CapturingClient::new("answer");
    let pipeline = build_pipeline(startup_india_fixture(), client);

    let response = pipeline
        .handle(ChatRequest::new("What is Startup India?"))
        .await
        .unwrap();

    assert!(!response.session_id.is_empty());
}

#[tokio::test]
async fn test_debug_payload_present_only_when_requested() {
    let (client, _) = CapturingClient::new("answer");
    let pipeline = build_pipeline(startup_india_fixture(), client);

    let plain = pipeline
        .handle(ChatRequest::new("What is Startup India?"))
        .await
        .unwrap();
    assert!(plain.debug.is_none());

    let debugged = pipeline
        .handle(ChatRequest::new("What is Startup India?").with_debug())
        .await
        .unwrap();
    let debug = debugged.debug.unwrap();
    assert_eq!(debug.retrieved_count, 5);
    assert!(!debug.index_unavailable);
}
