//! Gateway HTTP server: health, skill listing and the streaming chat endpoint.

use crate::agent::{Agent, ChatInput};
use crate::config::{self, Config};
use crate::data::MockDataProvider;
use crate::drugs::{DrugLookup, NoDrugLookup, RxNormClient};
use crate::events::StreamEvent;
use crate::gateway::protocol::{ChatRequest, ErrorResponse, HealthResponse, SkillsResponse};
use crate::init;
use crate::llm::OpenAiClient;
use crate::prompt;
use crate::skills::SkillCatalog;
use crate::tools::{tool_definitions, ToolRegistry};
use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::StreamExt;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;

pub const AGENT_NAME: &str = "AI Doctor Agent";

/// Events buffered per request before the agent waits on the client.
const EVENT_BUFFER: usize = 32;

/// Largest accepted `/chat` body; a base64 phone photo fits comfortably.
pub const CHAT_BODY_LIMIT: usize = 20 * 1024 * 1024;

/// Shared state for the gateway (agent, skill catalog).
#[derive(Clone)]
pub struct AppState {
    pub agent: Agent,
    pub skills: Arc<SkillCatalog>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge {
                limit: CHAT_BODY_LIMIT,
            }
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
            status_code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build all collaborators from config: skill catalog, system prompt, model client, drug lookup, tools.
pub fn build_state(config: &Config, config_path: &std::path::Path) -> Result<AppState> {
    let skills_dir = config::resolve_skills_dir(config, config_path);
    let skills = Arc::new(SkillCatalog::discover(&skills_dir));
    log::info!("loaded {} skill(s) from {}", skills.len(), skills_dir.display());

    let prompts_dir = config::resolve_prompts_dir(config, config_path);
    let template = prompt::load_prompt_template(&prompts_dir, "system")?;
    let system_prompt = prompt::render_system_prompt(&template, &skills.render_summary_markup());

    let api_key = config::resolve_api_key(config);
    if api_key.is_none() {
        log::warn!("no API key configured (set OPENAI_API_KEY or agents.apiKey); model calls will likely fail");
    }
    let model = config::resolve_model(config);
    let llm = OpenAiClient::new(
        &config::resolve_llm_base_url(config),
        api_key,
        &model,
        config::resolve_llm_timeout(config),
    )
    .context("building LLM client")?;
    log::info!("using model {} at {}", model, llm.base_url());

    let drugs: Arc<dyn DrugLookup> = if config.drugs.enabled {
        Arc::new(
            RxNormClient::new(config.drugs.base_url.clone(), config::resolve_drug_timeout(config))
                .context("building RxNorm client")?,
        )
    } else {
        log::info!("drug lookup disabled; medication options use fallback data");
        Arc::new(NoDrugLookup)
    };

    let tools = ToolRegistry::new(Arc::new(MockDataProvider::new()), drugs, skills.clone());
    let agent = Agent::new(
        Arc::new(llm),
        Arc::new(tools),
        tool_definitions(),
        system_prompt,
        skills.names(),
    )
    .with_limits(
        config::resolve_max_iterations(config),
        config::resolve_pacing(config),
    );
    Ok(AppState { agent, skills })
}

/// Routes are served both at the root and under `/api`.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health))
        .route("/skills", get(list_skills))
        .route(
            "/chat",
            post(chat).layer(DefaultBodyLimit::max(CHAT_BODY_LIMIT)),
        )
        .method_not_allowed_fallback(method_not_allowed);
    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_gateway(config: Config, config_path: PathBuf) -> Result<()> {
    init::require_initialized(&config_path, &config)?;
    let state = build_state(&config, &config_path)?;
    let app = router(state);

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        agent: AGENT_NAME.to_string(),
        skills_count: state.skills.len(),
        model: state.agent.model().to_string(),
    })
}

/// GET /skills
async fn list_skills(State(state): State<AppState>) -> Json<SkillsResponse> {
    log::debug!("listing {} skill(s)", state.skills.len());
    Json(SkillsResponse {
        skills: state.skills.summaries(),
        markup: state.skills.render_summary_markup(),
    })
}

/// POST /chat streams newline-delimited events while the agent runs in its own task.
async fn chat(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let body = body?;
    let req: ChatRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {}", e)))?;
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let request_id = uuid::Uuid::new_v4();
    log::info!(
        "chat request {} | patient_id: {} | message: {}...",
        request_id,
        req.patient_id,
        req.message.chars().take(50).collect::<String>()
    );
    if req.image.as_deref().is_some_and(|i| !i.is_empty()) {
        log::info!("chat request {}: image attached", request_id);
    }

    let (tx, rx) = mpsc::channel::<StreamEvent>(EVENT_BUFFER);
    let agent = state.agent.clone();
    let input = ChatInput {
        message: req.message,
        patient_id: req.patient_id,
        image: req.image,
    };
    tokio::spawn(async move {
        let outcome = agent.run(input, tx).await;
        log::info!("chat request {} finished: {:?}", request_id, outcome);
    });

    let stream = ReceiverStream::new(rx).map(|ev| Ok::<_, Infallible>(ev.to_line()));
    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
