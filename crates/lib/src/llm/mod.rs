//! LLM abstraction and the OpenAI-compatible chat-completions client.
//!
//! The agent loop only sees [`LlmBackend`]; message and tool types here are provider-neutral
//! and converted to the wire format inside each client.

mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One part of multimodal user content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Message content: plain text, or text and image parts for a vision-capable model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Text of the content; parts are joined by newlines and images are skipped.
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn has_image(&self) -> bool {
        matches!(self, MessageContent::Parts(parts) if parts.iter().any(|p| matches!(p, ContentPart::ImageUrl { .. })))
    }
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

/// One entry in the conversation history of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// When role is "tool", the id of the call this message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role("system", MessageContent::Text(content.into()))
    }

    pub fn user(content: MessageContent) -> Self {
        Self::with_role("user", content)
    }

    /// Assistant turn; `tool_calls` is stored as None when empty.
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: MessageContent::Text(content.into()),
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            tool_call_id: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: MessageContent::Text(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn with_role(role: &str, content: MessageContent) -> Self {
        Self {
            role: role.to_string(),
            content,
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// One tool/function call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub typ: String,
    pub function: ToolCallFunction,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    /// Parsed JSON arguments. A string the model produced that is not valid JSON stays a `Value::String`.
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            typ: function_type(),
            function: ToolCallFunction {
                name: name.into(),
                arguments,
            },
        }
    }
}

/// Tool definition advertised to the model (function-calling).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub typ: String,
    pub function: ToolFunctionDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFunctionDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: serde_json::Value,
}

/// Result of one model turn.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub message: Option<ChatMessage>,
}

impl ChatResponse {
    /// Text content of the assistant message, if any.
    pub fn content(&self) -> String {
        self.message
            .as_ref()
            .map(|m| m.content.as_text())
            .unwrap_or_default()
    }

    /// Tool calls requested by the assistant message, if any.
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.message
            .as_ref()
            .and_then(|m| m.tool_calls.as_deref())
            .unwrap_or(&[])
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("llm api error: {status} {body}")]
    Api { status: u16, body: String },
    #[error("llm response malformed: {0}")]
    Decode(String),
}

impl LlmError {
    /// True for failures talking to the provider (error status or transport); false when its answer could not be understood.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, LlmError::Api { .. } | LlmError::Request(_))
    }
}

/// A chat model with function calling.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Model id sent with each request.
    fn model(&self) -> &str;

    /// One non-streaming completion over the full history with the given tool catalog.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_content_serializes_as_string() {
        let msg = ChatMessage::system("hello");
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v, json!({"role": "system", "content": "hello"}));
    }

    #[test]
    fn parts_content_serializes_as_typed_array() {
        let content = MessageContent::Parts(vec![
            ContentPart::Text {
                text: "look".to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/png;base64,AAAA".to_string(),
                },
            },
        ]);
        assert!(content.has_image());
        assert_eq!(content.as_text(), "look");
        let v = serde_json::to_value(ChatMessage::user(content)).unwrap();
        assert_eq!(
            v["content"],
            json!([
                {"type": "text", "text": "look"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
            ])
        );
    }

    #[test]
    fn assistant_without_calls_omits_tool_calls() {
        let msg = ChatMessage::assistant("done", vec![]);
        assert!(msg.tool_calls.is_none());
        let tool = ChatMessage::tool("call_1", "result");
        assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn decode_errors_are_not_provider_errors() {
        assert!(LlmError::Api {
            status: 500,
            body: String::new()
        }
        .is_provider_error());
        assert!(!LlmError::Decode("x".to_string()).is_provider_error());
    }
}
