use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use prod_assistant::core::config::{ExhaustedPolicy, WorkflowSettings};
use prod_assistant::graph::{AgenticRag, GraphErrorKind, RouteDecision, TurnOrigin, WorkflowStage};
use prod_assistant::history::{CheckpointStore, InMemoryCheckpointStore, SqliteCheckpointStore};
use prod_assistant::llm::{LlmService, ScriptedProvider};
use prod_assistant::prompts::PromptRegistry;
use prod_assistant::rag::{
    read_catalogue_from, CatalogueIngestor, EvidenceItem, ProductMetadata, RagStore, Retriever,
    SqliteRagStore, VectorRetriever,
};
use prod_assistant::ApiError;

use WorkflowStage::*;

const CATALOGUE: &str = "product_id,product_title,rating,total_reviews,price,top_reviews
MOB1,Apple iPhone 15 (Black 128 GB),4.6,\"12,803\",\"₹69,900\",Camera is superb and the iPhone battery lasts all day
MOB2,Samsung Galaxy S24 5G,4.4,\"3,112\",\"₹74,999\",Bright vivid display and smooth software
AUD1,boAt Airdopes 141,4.1,\"98,450\",\"₹1,299\",Deep bass for the price and decent battery
";

/// Retrieval collaborator returning fixed evidence and counting calls.
struct FixedRetriever {
    items: Vec<EvidenceItem>,
    queries: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl FixedRetriever {
    fn new(items: Vec<EvidenceItem>) -> Arc<Self> {
        Arc::new(Self {
            items,
            queries: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for FixedRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<EvidenceItem>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.items.clone())
    }
}

fn iphone() -> EvidenceItem {
    EvidenceItem::new(
        "Camera is superb and battery lasts all day.",
        ProductMetadata {
            product_id: "MOB1".to_string(),
            title: Some("Apple iPhone 15 (Black 128 GB)".to_string()),
            rating: Some("4.6".to_string()),
            total_reviews: Some("12,803".to_string()),
            price: Some("₹69,900".to_string()),
        },
    )
}

/// Scripted model: grades with `grade`, rewrites to `rewrite`, and answers
/// product questions by quoting the first price in the context.
fn scripted_model(grade: &'static str, rewrite: &'static str) -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::new(move |prompt| {
        if prompt.starts_with("You are a grader") {
            Ok(grade.to_string())
        } else if prompt.starts_with("Rewrite the query") {
            Ok(rewrite.to_string())
        } else if prompt.contains("EcommerceBot") {
            let price = prompt
                .lines()
                .find_map(|line| line.strip_prefix("Price: "))
                .unwrap_or("unknown");
            Ok(format!("Based on the reviews, it sells for {}.", price))
        } else {
            Ok("Hello! Ask me anything about our products.".to_string())
        }
    }))
}

fn engine_with(
    provider: Arc<ScriptedProvider>,
    retriever: Arc<dyn Retriever>,
    settings: WorkflowSettings,
    checkpoints: Arc<dyn CheckpointStore>,
) -> AgenticRag {
    let llm = LlmService::new(provider, "chat-model", "embed-model");
    AgenticRag::new(
        llm,
        retriever,
        PromptRegistry::with_defaults(),
        settings,
        checkpoints,
    )
    .unwrap()
}

#[tokio::test]
async fn price_question_answers_from_relevant_evidence() {
    let retriever = FixedRetriever::new(vec![iphone()]);
    let engine = engine_with(
        scripted_model("Yes", "unused"),
        retriever.clone(),
        WorkflowSettings::default(),
        Arc::new(InMemoryCheckpointStore::new()),
    );

    let outcome = engine
        .run_detailed("What is the price of iPhone 15?", "scenario-1")
        .await
        .unwrap();

    assert_eq!(outcome.stages, vec![Routing, Retrieving, Grading, Generating, Done]);
    assert_eq!(outcome.route, Some(RouteDecision::Retrieve));
    assert!(outcome.answer.contains("₹69,900"));
    assert_eq!(retriever.calls(), 1);
}

#[tokio::test]
async fn greeting_skips_retrieval() {
    let retriever = FixedRetriever::new(vec![iphone()]);
    let provider = scripted_model("yes", "unused");
    let engine = engine_with(
        provider.clone(),
        retriever.clone(),
        WorkflowSettings::default(),
        Arc::new(InMemoryCheckpointStore::new()),
    );

    let outcome = engine.run_detailed("Hello", "scenario-2").await.unwrap();

    assert_eq!(outcome.stages, vec![Routing, Generating, Done]);
    assert_eq!(outcome.route, Some(RouteDecision::Direct));
    assert_eq!(retriever.calls(), 0);
    assert_eq!(provider.prompts().len(), 1);
}

#[tokio::test]
async fn empty_retrieval_triggers_rewrite_and_reroute() {
    let retriever = FixedRetriever::new(Vec::new());
    let provider = scripted_model("yes", "price of Apple iPhone 15 128GB");
    let store = Arc::new(InMemoryCheckpointStore::new());
    let settings = WorkflowSettings {
        max_rewrites: 1,
        ..WorkflowSettings::default()
    };
    let engine = engine_with(provider.clone(), retriever.clone(), settings, store.clone());

    let outcome = engine
        .run_detailed("What is the price of iPhone 15?", "scenario-3")
        .await
        .unwrap();

    assert_eq!(
        outcome.stages,
        vec![
            Routing, Retrieving, Grading, Rewriting, // first pass: sentinel, irrelevant
            Routing, Retrieving, Grading, Rewriting, // budget spent
            Generating, Done,
        ]
    );
    assert_eq!(outcome.rewrites, 1);
    assert_eq!(
        retriever.queries(),
        vec![
            "What is the price of iPhone 15?".to_string(),
            "price of Apple iPhone 15 128GB".to_string(),
        ]
    );
    // The grader is never consulted on the sentinel.
    assert!(provider
        .prompts()
        .iter()
        .all(|p| !p.starts_with("You are a grader")));

    let saved = store.load("scenario-3").await.unwrap().unwrap();
    let rewritten = saved
        .turns()
        .iter()
        .filter(|t| t.origin() == TurnOrigin::User)
        .map(|t| t.content().to_string())
        .collect::<Vec<_>>();
    assert_eq!(rewritten[0], "What is the price of iPhone 15?");
    assert_ne!(rewritten[1], rewritten[0]);
}

#[tokio::test]
async fn persistent_irrelevance_is_bounded_by_rewrite_cap() {
    for max_rewrites in [0, 2, 3] {
        let retriever = FixedRetriever::new(vec![iphone()]);
        let settings = WorkflowSettings {
            max_rewrites,
            ..WorkflowSettings::default()
        };
        let engine = engine_with(
            scripted_model("no", "iPhone 15 price in India"),
            retriever.clone(),
            settings,
            Arc::new(InMemoryCheckpointStore::new()),
        );

        let outcome = engine
            .run_detailed("What is the price of iPhone 15?", "cap")
            .await
            .unwrap();

        assert_eq!(outcome.rewrites, max_rewrites);
        assert_eq!(retriever.calls() as u32, max_rewrites + 1);
        assert_eq!(outcome.stages.last(), Some(&Done));
        // Best effort still answers from the latest context.
        assert!(outcome.answer.contains("₹69,900"));
    }
}

#[tokio::test]
async fn fail_policy_reports_rewrite_limit() {
    let settings = WorkflowSettings {
        max_rewrites: 2,
        exhausted_policy: ExhaustedPolicy::Fail,
        ..WorkflowSettings::default()
    };
    let engine = engine_with(
        scripted_model("no", "iPhone 15 price"),
        FixedRetriever::new(vec![iphone()]),
        settings,
        Arc::new(InMemoryCheckpointStore::new()),
    );

    let err = engine
        .run("What is the price of iPhone 15?", "fail-policy")
        .await
        .unwrap_err();

    assert_eq!(err.kind, GraphErrorKind::RewriteLimit);
    assert_eq!(err.node_id, "rewriting");
    assert_eq!(
        err.execution_trace.iter().filter(|n| *n == "rewriting").count(),
        2
    );
    assert!(matches!(ApiError::from(err), ApiError::Unanswerable(_)));
}

#[tokio::test]
async fn large_rewrite_budget_fits_the_step_limit() {
    let rejected = AgenticRag::new(
        LlmService::new(scripted_model("no", "x"), "chat-model", "embed-model"),
        FixedRetriever::new(vec![iphone()]),
        PromptRegistry::with_defaults(),
        WorkflowSettings {
            max_rewrites: 13,
            ..WorkflowSettings::default()
        },
        Arc::new(InMemoryCheckpointStore::new()),
    );
    assert_eq!(rejected.err().map(|e| e.kind), Some(GraphErrorKind::Config));

    let settings = WorkflowSettings {
        max_rewrites: 13,
        max_steps: WorkflowSettings::min_steps_for(13),
        ..WorkflowSettings::default()
    };
    let retriever = FixedRetriever::new(vec![iphone()]);
    let engine = engine_with(
        scripted_model("no", "iPhone 15 price"),
        retriever.clone(),
        settings,
        Arc::new(InMemoryCheckpointStore::new()),
    );

    let outcome = engine
        .run_detailed("What is the price of iPhone 15?", "steps")
        .await
        .unwrap();

    assert_eq!(outcome.rewrites, 13);
    assert_eq!(retriever.calls(), 14);
    assert_eq!(outcome.stages.len(), 57 + 1);
    assert!(outcome.answer.contains("₹69,900"));
}

#[tokio::test]
async fn second_run_resumes_session_history() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn CheckpointStore> = Arc::new(
        SqliteCheckpointStore::new(dir.path().join("sessions.db"))
            .await
            .unwrap(),
    );
    let engine = engine_with(
        scripted_model("yes", "unused"),
        FixedRetriever::new(vec![iphone()]),
        WorkflowSettings::default(),
        store.clone(),
    );

    engine.run("Hello", "shopper-42").await.unwrap();
    engine
        .run("What is the price of iPhone 15?", "shopper-42")
        .await
        .unwrap();

    let saved = store.load("shopper-42").await.unwrap().unwrap();
    assert_eq!(saved.history.len(), 2);
    assert_eq!(saved.history[0].content(), "Hello");
    assert_eq!(saved.history[1].origin(), TurnOrigin::Assistant);
    assert_eq!(saved.question, "What is the price of iPhone 15?");
    assert_eq!(saved.turns()[0].content(), saved.question);
    assert_eq!(saved.turns().last().map(|t| t.origin()), Some(TurnOrigin::Assistant));
    assert!(saved.is_done());
}

#[tokio::test]
async fn resumed_history_is_bounded_by_window() {
    let store = Arc::new(InMemoryCheckpointStore::new());
    let engine = engine_with(
        scripted_model("yes", "unused"),
        FixedRetriever::new(Vec::new()),
        WorkflowSettings {
            history_window: 3,
            ..WorkflowSettings::default()
        },
        store.clone(),
    );

    for question in ["Hello", "Hi again", "Good morning", "Hey there"] {
        engine.run(question, "chatty").await.unwrap();
    }

    let saved = store.load("chatty").await.unwrap().unwrap();
    assert_eq!(saved.history.len(), 3);
    assert_eq!(saved.history[0].origin(), TurnOrigin::Assistant);
    assert_eq!(saved.history[1].content(), "Good morning");
    assert_eq!(saved.question, "Hey there");
}

#[tokio::test]
async fn concurrent_sessions_do_not_share_state() {
    let engine = Arc::new(engine_with(
        scripted_model("yes", "unused"),
        FixedRetriever::new(vec![iphone()]),
        WorkflowSettings::default(),
        Arc::new(InMemoryCheckpointStore::new()),
    ));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let question = if i % 2 == 0 {
                    "What is the price of iPhone 15?"
                } else {
                    "Hello"
                };
                let session_id = format!("session-{}", i);
                let outcome = engine.run_detailed(question, &session_id).await;
                outcome
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.session_id, format!("session-{}", i));
        let expected_route = if i % 2 == 0 {
            RouteDecision::Retrieve
        } else {
            RouteDecision::Direct
        };
        assert_eq!(outcome.route, Some(expected_route));
    }
}

#[tokio::test]
async fn ingested_catalogue_answers_through_vector_retrieval() {
    let dir = tempfile::tempdir().unwrap();
    let rag_store: Arc<dyn RagStore> = Arc::new(
        SqliteRagStore::with_path(dir.path().join("catalogue.db"))
            .await
            .unwrap(),
    );
    let provider = scripted_model("yes", "unused");
    let llm = LlmService::new(provider.clone(), "chat-model", "embed-model");

    let (items, skipped) = read_catalogue_from(CATALOGUE.as_bytes()).unwrap();
    assert_eq!(skipped, 0);
    let report = CatalogueIngestor::new(llm.clone(), rag_store.clone(), 2)
        .ingest(items)
        .await
        .unwrap();
    assert_eq!(report.records_stored, 3);

    let retriever = Arc::new(VectorRetriever::new(llm.clone(), rag_store, 1));
    let engine = AgenticRag::new(
        llm,
        retriever,
        PromptRegistry::with_defaults(),
        WorkflowSettings::default(),
        Arc::new(InMemoryCheckpointStore::new()),
    )
    .unwrap();

    let answer = engine
        .run("What is the price of the Apple iPhone 15?", "catalogue")
        .await
        .unwrap();

    assert_eq!(answer, "Based on the reviews, it sells for ₹69,900.");
}
