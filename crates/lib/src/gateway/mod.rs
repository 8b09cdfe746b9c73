//! Gateway: HTTP server exposing health, the skill catalog and streaming chat.
//!
//! `POST /chat` answers with newline-delimited JSON events, one per line, flushed as the
//! agent produces them. Every route is also reachable under `/api`.

mod protocol;
mod server;

pub use protocol::{ChatRequest, ErrorResponse, HealthResponse, SkillsResponse, DEFAULT_PATIENT_ID};
pub use server::{build_state, router, run_gateway, ApiError, AppState, AGENT_NAME, CHAT_BODY_LIMIT};
