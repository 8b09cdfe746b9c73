//! Agent loop: one chat request from discovery to the final answer.
//! The model is called with the full history and tool catalog; each requested tool call is run
//! and its result appended, until the model answers in plain text or the iteration cap is hit.
//! Progress is streamed as [`StreamEvent`]s through a bounded channel.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::config::{DEFAULT_MAX_ITERATIONS, DEFAULT_PACING_MS};
use crate::events::{step, LogEvent, StreamEvent};
use crate::llm::{ChatMessage, ContentPart, ImageUrl, LlmBackend, MessageContent, ToolCall, ToolDefinition};
use crate::tools::{ToolCategory, ToolError};

const RESULT_PREVIEW_CHARS: usize = 300;
const MESSAGE_PREVIEW_CHARS: usize = 50;
const IMAGE_MESSAGE_PREVIEW_CHARS: usize = 30;
const IMAGE_INSTRUCTION: &str = "[Please analyze the attached image. Describe medically relevant observations such as skin condition, wounds or rashes.]";

/// Executes a tool by name with JSON arguments.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, name: &str, args: &Value) -> Result<String, ToolError>;
}

/// One chat request.
#[derive(Debug, Clone)]
pub struct ChatInput {
    pub message: String,
    pub patient_id: String,
    /// Base64 image, with or without a `data:` URL prefix.
    pub image: Option<String>,
}

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    /// The model answered; a `response` event was sent.
    Completed,
    /// A model call failed; an `error` event and an apologetic `response` were sent.
    ProviderFailed,
    /// The iteration cap was reached without a plain answer. No `response` was sent.
    IterationLimit,
    /// The client went away before the request finished.
    Disconnected,
}

/// Receiver dropped.
#[derive(Debug)]
struct Disconnected;

/// Sends events in order, with an optional delay after each step.
struct EventSink {
    tx: mpsc::Sender<StreamEvent>,
    pacing: Duration,
}

impl EventSink {
    async fn emit(&self, event: impl Into<StreamEvent>) -> Result<(), Disconnected> {
        self.tx.send(event.into()).await.map_err(|_| Disconnected)
    }

    async fn pace(&self) {
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }
    }
}

/// First `n` characters of `s`.
fn preview(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// User turn: patient-tagged text, plus an image part when an image is attached.
pub fn build_user_content(message: &str, patient_id: &str, image: Option<&str>) -> MessageContent {
    let text = format!("[Patient ID: {}]\n\n{}", patient_id, message);
    let Some(image) = image.filter(|i| !i.is_empty()) else {
        return MessageContent::Text(text);
    };
    let url = if image.starts_with("data:") {
        image.to_string()
    } else {
        format!("data:image/jpeg;base64,{}", image)
    };
    MessageContent::Parts(vec![
        ContentPart::Text {
            text: format!("{}\n\n{}", text, IMAGE_INSTRUCTION),
        },
        ContentPart::ImageUrl {
            image_url: ImageUrl { url },
        },
    ])
}

/// Log event announcing a tool call, worded by tool category.
fn announce(call: &ToolCall) -> LogEvent {
    let name = call.function.name.as_str();
    let args = call.function.arguments.clone();
    let event = match ToolCategory::of(name) {
        ToolCategory::SkillActivation => {
            let skill = args.get("skill_name").and_then(Value::as_str).unwrap_or("?");
            LogEvent::new(step::ACTIVATION, format!("📚 Loading skill: {}", skill))
                .description("Checking diagnosis and treatment guidelines")
        }
        ToolCategory::ImagingAnalysis => {
            LogEvent::new(step::TOOL_CALL, format!("🔬 Running analysis tool: {}", name))
                .description("Analyzing medical data")
        }
        ToolCategory::ClinicalAnalysis => {
            LogEvent::new(step::TOOL_CALL, format!("🩺 Running analysis tool: {}", name))
                .description("Analyzing medical data")
        }
        ToolCategory::SeverityAssessment => LogEvent::new(step::TOOL_CALL, "⚖️ Assessing severity")
            .description("Determining disease stage"),
        ToolCategory::TreatmentSearch => LogEvent::new(step::TOOL_CALL, "💊 Searching treatment options")
            .description("Exploring the best treatment options"),
        ToolCategory::Other => LogEvent::new(step::TOOL_CALL, format!("🔧 Running tool: {}", name)),
    };
    event.tool(name).args(args)
}

/// Shared, immutable agent setup; cloned into each request task.
#[derive(Clone)]
pub struct Agent {
    backend: Arc<dyn LlmBackend>,
    tools: Arc<dyn ToolExecutor>,
    definitions: Arc<Vec<ToolDefinition>>,
    system_prompt: Arc<str>,
    skill_names: Arc<Vec<String>>,
    max_iterations: usize,
    pacing: Duration,
}

impl Agent {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        tools: Arc<dyn ToolExecutor>,
        definitions: Vec<ToolDefinition>,
        system_prompt: String,
        skill_names: Vec<String>,
    ) -> Self {
        Self {
            backend,
            tools,
            definitions: Arc::new(definitions),
            system_prompt: Arc::from(system_prompt),
            skill_names: Arc::new(skill_names),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            pacing: Duration::from_millis(DEFAULT_PACING_MS),
        }
    }

    /// Override the iteration cap (zero is ignored) and the delay between events.
    pub fn with_limits(mut self, max_iterations: usize, pacing: Duration) -> Self {
        if max_iterations > 0 {
            self.max_iterations = max_iterations;
        }
        self.pacing = pacing;
        self
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Run one request, sending events to `tx` as they happen.
    pub async fn run(&self, input: ChatInput, tx: mpsc::Sender<StreamEvent>) -> ChatOutcome {
        let sink = EventSink {
            tx,
            pacing: self.pacing,
        };
        let outcome = match self.drive(&input, &sink).await {
            Ok(outcome) => outcome,
            Err(Disconnected) => {
                log::info!("agent: client disconnected (patient {})", input.patient_id);
                ChatOutcome::Disconnected
            }
        };
        log::debug!("agent: request finished: {:?}", outcome);
        outcome
    }

    async fn drive(&self, input: &ChatInput, sink: &EventSink) -> Result<ChatOutcome, Disconnected> {
        let image = input.image.as_deref().filter(|i| !i.is_empty());
        let mut messages = vec![
            ChatMessage::system(&*self.system_prompt),
            ChatMessage::user(build_user_content(&input.message, &input.patient_id, image)),
        ];

        // Discovery
        sink.emit(
            LogEvent::new(step::DISCOVERY, "🏥 AI Doctor Agent started")
                .description("Skill metadata loaded"),
        )
        .await?;
        sink.pace().await;
        sink.emit(
            LogEvent::new(
                step::SKILLS_LOADED,
                format!("Available skills: {}", self.skill_names.join(", ")),
            )
            .description("Diagnosis and treatment skills ready"),
        )
        .await?;
        sink.pace().await;
        let start = if image.is_some() {
            LogEvent::new(
                step::START,
                format!(
                    "📷 Image attached - {}...",
                    preview(&input.message, IMAGE_MESSAGE_PREVIEW_CHARS)
                ),
            )
            .description("Starting image and symptom analysis")
        } else {
            LogEvent::new(
                step::START,
                format!(
                    "Patient symptoms received: {}...",
                    preview(&input.message, MESSAGE_PREVIEW_CHARS)
                ),
            )
            .description("Starting symptom analysis")
        };
        sink.emit(start).await?;
        sink.pace().await;

        for iteration in 1..=self.max_iterations {
            // Thinking
            sink.emit(
                LogEvent::new(step::LLM_THINKING, format!("[Step #{}] Analyzing...", iteration))
                    .description("The AI is analyzing the symptoms"),
            )
            .await?;
            sink.pace().await;

            let response = match self.backend.chat(&messages, &self.definitions).await {
                Ok(r) => r,
                Err(e) if e.is_provider_error() => {
                    let msg = format!("AI provider error: {}", e);
                    log::error!("agent: {}", msg);
                    sink.emit(LogEvent::new(step::ERROR, msg)).await?;
                    sink.emit(StreamEvent::response(
                        "Sorry, the AI service returned an error. Please try again shortly.",
                    ))
                    .await?;
                    return Ok(ChatOutcome::ProviderFailed);
                }
                Err(e) => {
                    let msg = format!("Unexpected error: {}", e);
                    log::error!("agent: {}", msg);
                    sink.emit(LogEvent::new(step::ERROR, msg)).await?;
                    sink.emit(StreamEvent::response(format!(
                        "Sorry, a system error occurred: {}",
                        e
                    )))
                    .await?;
                    return Ok(ChatOutcome::ProviderFailed);
                }
            };
            log::debug!("agent: model response received (iteration {})", iteration);

            let tool_calls = response.tool_calls().to_vec();
            if tool_calls.is_empty() {
                // Completion
                sink.emit(
                    LogEvent::new(step::COMPLETE, "📋 Diagnosis and treatment recommendation complete")
                        .description("AI analysis finished"),
                )
                .await?;
                sink.emit(StreamEvent::response(response.content())).await?;
                return Ok(ChatOutcome::Completed);
            }

            // Tool dispatch
            messages.push(ChatMessage::assistant(response.content(), tool_calls.clone()));
            for call in &tool_calls {
                let name = call.function.name.as_str();
                sink.emit(announce(call)).await?;
                sink.pace().await;

                log::info!("agent: executing tool {} with args {}", name, call.function.arguments);
                let result = match self.tools.execute(name, &call.function.arguments).await {
                    Ok(out) => {
                        sink.emit(
                            LogEvent::new(step::TOOL_RESULT, format!("✅ {} done", name))
                                .tool(name)
                                .result(preview(&out, RESULT_PREVIEW_CHARS)),
                        )
                        .await?;
                        out
                    }
                    Err(e) => {
                        let msg = format!("Tool execution error ({}): {}", name, e);
                        log::warn!("agent: {}", msg);
                        sink.emit(LogEvent::new(step::ERROR, msg)).await?;
                        e.to_payload()
                    }
                };
                sink.pace().await;
                messages.push(ChatMessage::tool(call.id.clone(), result));
            }
        }

        log::warn!(
            "agent: iteration cap of {} reached without a final answer",
            self.max_iterations
        );
        Ok(ChatOutcome::IterationLimit)
    }
}
