//! Events streamed to the client during a chat request, one JSON object per line.
//!
//! `{"type":"log","data":{"step":..,"message":..}}` for progress and
//! `{"type":"response","data":{"content":..}}` for the final answer.

use serde::{Deserialize, Serialize};

pub mod step {
    pub const DISCOVERY: &str = "discovery";
    pub const SKILLS_LOADED: &str = "skills_loaded";
    pub const START: &str = "start";
    pub const LLM_THINKING: &str = "llm_thinking";
    pub const ACTIVATION: &str = "activation";
    pub const TOOL_CALL: &str = "tool_call";
    pub const TOOL_RESULT: &str = "tool_result";
    pub const COMPLETE: &str = "complete";
    pub const ERROR: &str = "error";
}

/// Progress entry. Optional fields are omitted from the wire when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub step: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl LogEvent {
    pub fn new(step: &str, message: impl Into<String>) -> Self {
        Self {
            step: step.to_string(),
            message: message.into(),
            description: None,
            tool: None,
            args: None,
            result: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn args(mut self, args: serde_json::Value) -> Self {
        self.args = Some(args);
        self
    }

    pub fn result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEvent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StreamEvent {
    Log(LogEvent),
    Response(ResponseEvent),
}

impl StreamEvent {
    pub fn response(content: impl Into<String>) -> Self {
        StreamEvent::Response(ResponseEvent {
            content: content.into(),
        })
    }

    /// Step name for log events.
    pub fn step(&self) -> Option<&str> {
        match self {
            StreamEvent::Log(l) => Some(&l.step),
            StreamEvent::Response(_) => None,
        }
    }

    /// Serialized event followed by exactly one newline.
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            log::error!("event serialization failed: {}", e);
            String::from(r#"{"type":"log","data":{"step":"error","message":"event serialization failed"}}"#)
        });
        line.push('\n');
        line
    }
}

impl From<LogEvent> for StreamEvent {
    fn from(l: LogEvent) -> Self {
        StreamEvent::Log(l)
    }
}
