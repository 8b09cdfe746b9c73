//! Integration test: serve the router with a scripted model and read the NDJSON chat stream.

use async_trait::async_trait;
use axum::Router;
use doctor_lib::agent::Agent;
use doctor_lib::data::MockDataProvider;
use doctor_lib::drugs::NoDrugLookup;
use doctor_lib::events::StreamEvent;
use doctor_lib::gateway::{self, AppState, CHAT_BODY_LIMIT};
use doctor_lib::llm::{ChatMessage, ChatResponse, LlmBackend, LlmError, ToolCall, ToolDefinition};
use doctor_lib::skills::SkillCatalog;
use doctor_lib::tools::{tool_definitions, ToolRegistry};
use futures_util::StreamExt;
use serde_json::json;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tower::ServiceExt;

struct ScriptedBackend {
    turns: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<ChatResponse, LlmError> {
        self.turns.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(ChatResponse {
                message: Some(ChatMessage::assistant("script exhausted", vec![])),
            })
        })
    }
}

/// First turn calls a tool; the second turn waits until `gate` is notified, then answers.
struct GatedBackend {
    calls: AtomicUsize,
    gate: Arc<Notify>,
}

#[async_trait]
impl LlmBackend for GatedBackend {
    fn model(&self) -> &str {
        "gated-model"
    }

    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<ChatResponse, LlmError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Ok(ChatResponse {
                message: Some(ChatMessage::assistant(
                    "",
                    vec![ToolCall::new(
                        "call_1",
                        "read_skill",
                        json!({"skill_name": "symptom-analysis"}),
                    )],
                )),
            });
        }
        self.gate.notified().await;
        Ok(ChatResponse {
            message: Some(ChatMessage::assistant("Rest and drink fluids.", vec![])),
        })
    }
}

fn app(backend: Arc<dyn LlmBackend>) -> Router {
    let skills_dir: PathBuf = [env!("CARGO_MANIFEST_DIR"), "config", "skills"].iter().collect();
    let skills = Arc::new(SkillCatalog::discover(&skills_dir));
    let tools = ToolRegistry::new(
        Arc::new(MockDataProvider::new()),
        Arc::new(NoDrugLookup),
        skills.clone(),
    );
    let agent = Agent::new(
        backend,
        Arc::new(tools),
        tool_definitions(),
        "You are a test doctor.".to_string(),
        skills.names(),
    )
    .with_limits(10, Duration::ZERO);
    gateway::router(AppState { agent, skills })
}

fn scripted(turns: Vec<Result<ChatResponse, LlmError>>) -> Arc<dyn LlmBackend> {
    Arc::new(ScriptedBackend {
        turns: Mutex::new(turns.into()),
    })
}

async fn serve_app(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind free port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

async fn serve(turns: Vec<Result<ChatResponse, LlmError>>) -> String {
    serve_app(app(scripted(turns))).await
}

/// Post a chat request; returns the content type and the parsed events.
async fn post_chat(base: &str, body: serde_json::Value) -> (Option<String>, Vec<StreamEvent>) {
    let resp = reqwest::Client::new()
        .post(format!("{}/chat", base))
        .json(&body)
        .send()
        .await
        .expect("request");
    assert!(resp.status().is_success());
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let text = resp.text().await.expect("body");
    assert!(text.ends_with('\n'));
    let events = text
        .lines()
        .map(|l| serde_json::from_str::<StreamEvent>(l).expect("every line is one JSON event"))
        .collect();
    (content_type, events)
}

#[tokio::test]
async fn tool_turn_then_answer_streams_in_order() {
    let base = serve(vec![
        Ok(ChatResponse {
            message: Some(ChatMessage::assistant(
                "",
                vec![ToolCall::new(
                    "call_1",
                    "read_skill",
                    json!({"skill_name": "symptom-analysis"}),
                )],
            )),
        }),
        Ok(ChatResponse {
            message: Some(ChatMessage::assistant("Take rest and see a physician.", vec![])),
        }),
    ])
    .await;

    let (content_type, events) =
        post_chat(&base, json!({"message": "허리가 아파요", "patient_id": "P002"})).await;
    assert_eq!(content_type.as_deref(), Some("text/event-stream"));

    let steps: Vec<&str> = events.iter().map(|e| e.step().unwrap_or("response")).collect();
    assert_eq!(
        steps,
        vec![
            "discovery",
            "skills_loaded",
            "start",
            "llm_thinking",
            "activation",
            "tool_result",
            "llm_thinking",
            "complete",
            "response"
        ]
    );
    match events.last() {
        Some(StreamEvent::Response(r)) => assert_eq!(r.content, "Take rest and see a physician."),
        other => panic!("expected response last, got {:?}", other),
    }
    match &events[1] {
        StreamEvent::Log(l) => assert!(l.message.contains("symptom-analysis")),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn provider_failure_streams_error_and_apology() {
    let base = serve(vec![Err(LlmError::Api {
        status: 401,
        body: "invalid api key".to_string(),
    })])
    .await;
    let (_, events) = post_chat(&base, json!({"message": "headache"})).await;
    let n = events.len();
    assert_eq!(events[n - 2].step(), Some("error"));
    assert!(matches!(&events[n - 1], StreamEvent::Response(_)));
}

#[tokio::test]
async fn photo_sized_image_is_accepted() {
    let base = serve(vec![Ok(ChatResponse {
        message: Some(ChatMessage::assistant("The rash looks mild.", vec![])),
    })])
    .await;
    let image = format!("data:image/jpeg;base64,{}", "A".repeat(3_200_000));
    let (_, events) = post_chat(
        &base,
        json!({"message": "What is this rash?", "patientId": "P001", "image": image}),
    )
    .await;
    match events.last() {
        Some(StreamEvent::Response(r)) => assert_eq!(r.content, "The rash looks mild."),
        other => panic!("expected response last, got {:?}", other),
    }
}

#[tokio::test]
async fn body_over_limit_is_413_with_json_envelope() {
    let image = "A".repeat(CHAT_BODY_LIMIT + 1024);
    let body = json!({"message": "hi", "image": image}).to_string();
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body))
        .unwrap();
    let resp = app(scripted(vec![])).oneshot(req).await.unwrap();
    assert_eq!(resp.status().as_u16(), 413);
    let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["statusCode"], 413);
    assert!(json["error"].as_str().unwrap().contains("exceeds"));
}

/// Split complete lines off `buf` and parse each as an event.
fn drain_events(buf: &mut Vec<u8>, out: &mut Vec<StreamEvent>) {
    while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
        let line: Vec<u8> = buf.drain(..=pos).collect();
        out.push(serde_json::from_slice(&line).expect("every line is one JSON event"));
    }
}

#[tokio::test]
async fn events_reach_the_client_before_the_model_answers() {
    let gate = Arc::new(Notify::new());
    let base = serve_app(app(Arc::new(GatedBackend {
        calls: AtomicUsize::new(0),
        gate: gate.clone(),
    })))
    .await;

    let resp = reqwest::Client::new()
        .post(format!("{}/chat", base))
        .json(&json!({"message": "sore throat"}))
        .send()
        .await
        .expect("request");
    assert!(resp.status().is_success());
    let mut stream = resp.bytes_stream();
    let mut buf = Vec::new();
    let mut events = Vec::new();

    // The second model turn is held, so only the events before it can arrive.
    tokio::time::timeout(Duration::from_secs(5), async {
        while events.len() < 7 {
            let chunk = stream.next().await.expect("stream open").expect("chunk");
            buf.extend_from_slice(&chunk);
            drain_events(&mut buf, &mut events);
        }
    })
    .await
    .expect("early events flushed while the model is still working");
    let steps: Vec<&str> = events.iter().map(|e| e.step().unwrap_or("response")).collect();
    assert_eq!(
        steps,
        vec![
            "discovery",
            "skills_loaded",
            "start",
            "llm_thinking",
            "activation",
            "tool_result",
            "llm_thinking"
        ]
    );

    gate.notify_one();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk.expect("chunk"));
            drain_events(&mut buf, &mut events);
        }
    })
    .await
    .expect("stream ends after the answer");
    assert!(buf.is_empty());
    match events.last() {
        Some(StreamEvent::Response(r)) => assert_eq!(r.content, "Rest and drink fluids."),
        other => panic!("expected response last, got {:?}", other),
    }
}
