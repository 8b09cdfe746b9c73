//! OpenAI-compatible chat completions client (`POST {base}/chat/completions`).
//!
//! Works against api.openai.com and any server exposing the same API. Tools are sent with
//! `tool_choice: "auto"`; tool call arguments come back as a JSON string and are parsed here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::llm::{
    ChatMessage, ChatResponse, LlmBackend, LlmError, MessageContent, ToolCall, ToolCallFunction,
    ToolDefinition,
};

/// Client for an OpenAI-compatible endpoint. `base_url` includes the version segment (e.g. `/v1`).
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// `timeout` bounds each request end to end; an expired request fails as [`LlmError::Request`].
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LlmBackend for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = OpenAiChatRequest {
            model: &self.model,
            messages: messages.iter().map(message_to_openai).collect(),
            tool_choice: if tools.is_empty() { None } else { Some("auto") },
            tools,
        };
        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }
        let data: OpenAiChatResponse = res
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;
        openai_response_to_chat_response(data)
    }
}

// --- wire types ---

#[derive(Debug, Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
enum OpenAiMessage {
    System {
        content: String,
    },
    User {
        content: MessageContent,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<OpenAiToolCallRef>>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize)]
struct OpenAiToolCallRef {
    id: String,
    #[serde(rename = "type")]
    typ: String,
    function: OpenAiToolCallFunctionRef,
}

#[derive(Debug, Serialize)]
struct OpenAiToolCallFunctionRef {
    name: String,
    arguments: String,
}

/// Assistant tool call arguments go back to the API as a JSON string, as the API returned them.
fn arguments_to_string(arguments: &serde_json::Value) -> String {
    match arguments {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "{}".to_string(),
        other => other.to_string(),
    }
}

fn message_to_openai(m: &ChatMessage) -> OpenAiMessage {
    match m.role.as_str() {
        "system" => OpenAiMessage::System {
            content: m.content.as_text(),
        },
        "assistant" => {
            let text = m.content.as_text();
            let tool_calls = m.tool_calls.as_ref().map(|tcs| {
                tcs.iter()
                    .map(|tc| OpenAiToolCallRef {
                        id: tc.id.clone(),
                        typ: if tc.typ.is_empty() {
                            "function".to_string()
                        } else {
                            tc.typ.clone()
                        },
                        function: OpenAiToolCallFunctionRef {
                            name: tc.function.name.clone(),
                            arguments: arguments_to_string(&tc.function.arguments),
                        },
                    })
                    .collect()
            });
            OpenAiMessage::Assistant {
                content: if text.is_empty() && tool_calls.is_some() {
                    None
                } else {
                    Some(text)
                },
                tool_calls,
            }
        }
        "tool" => OpenAiMessage::Tool {
            tool_call_id: m.tool_call_id.clone().unwrap_or_default(),
            content: m.content.as_text(),
        },
        _ => OpenAiMessage::User {
            content: m.content.clone(),
        },
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Option<Vec<OpenAiChoice>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseToolCall {
    id: Option<String>,
    #[serde(rename = "type")]
    typ: Option<String>,
    function: Option<OpenAiResponseToolCallFunction>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseToolCallFunction {
    name: Option<String>,
    arguments: Option<String>,
}

/// Parse the argument string; an empty string is an empty object, invalid JSON is kept as a string.
fn parse_arguments(raw: Option<&str>) -> serde_json::Value {
    match raw.map(str::trim) {
        None | Some("") => serde_json::Value::Object(Default::default()),
        Some(s) => serde_json::from_str(s).unwrap_or_else(|_| serde_json::Value::String(s.to_string())),
    }
}

fn openai_response_to_chat_response(data: OpenAiChatResponse) -> Result<ChatResponse, LlmError> {
    let message = data
        .choices
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| LlmError::Decode("response has no choices".to_string()))?
        .message
        .ok_or_else(|| LlmError::Decode("choice has no message".to_string()))?;

    let tool_calls: Vec<ToolCall> = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(i, tc)| {
            let function = tc.function?;
            let name = function.name?;
            Some(ToolCall {
                id: tc.id.unwrap_or_else(|| format!("call_{}", i)),
                typ: tc.typ.unwrap_or_else(|| "function".to_string()),
                function: ToolCallFunction {
                    name,
                    arguments: parse_arguments(function.arguments.as_deref()),
                },
            })
        })
        .collect();

    Ok(ChatResponse {
        message: Some(ChatMessage::assistant(
            message.content.unwrap_or_default(),
            tool_calls,
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ContentPart, ImageUrl, ToolFunctionDefinition};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_TIMEOUT: Duration = Duration::from_secs(10);

    fn demo_tool() -> ToolDefinition {
        ToolDefinition {
            typ: "function".to_string(),
            function: ToolFunctionDefinition {
                name: "get_patient_history".to_string(),
                description: Some("history".to_string()),
                parameters: json!({"type": "object", "properties": {}}),
            },
        }
    }

    #[tokio::test]
    async fn sends_tools_and_parses_tool_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-4o", "tool_choice": "auto"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "get_patient_history", "arguments": "{\"patient_id\":\"P001\"}"}
                    }]
                }}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(
            &format!("{}/v1/", server.uri()),
            Some("sk-test".to_string()),
            "gpt-4o",
            TEST_TIMEOUT,
        )
        .unwrap();
        let res = client
            .chat(&[ChatMessage::system("sys")], &[demo_tool()])
            .await
            .unwrap();
        assert_eq!(res.content(), "");
        let calls = res.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_abc");
        assert_eq!(calls[0].function.name, "get_patient_history");
        assert_eq!(calls[0].function.arguments, json!({"patient_id": "P001"}));
    }

    #[tokio::test]
    async fn plain_answer_has_no_tool_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Rest and ice."}}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&server.uri(), None, "m", TEST_TIMEOUT).unwrap();
        let res = client.chat(&[ChatMessage::system("s")], &[]).await.unwrap();
        assert_eq!(res.content(), "Rest and ice.");
        assert!(res.tool_calls().is_empty());
    }

    #[tokio::test]
    async fn error_status_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&server.uri(), Some("bad".to_string()), "m", TEST_TIMEOUT).unwrap();
        let err = client.chat(&[ChatMessage::system("s")], &[]).await.unwrap_err();
        assert!(err.is_provider_error());
        match err {
            LlmError::Api { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("invalid api key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_provider_times_out_as_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(json!({"choices": [{"message": {"role": "assistant", "content": "late"}}]})),
            )
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&server.uri(), None, "m", Duration::from_millis(50)).unwrap();
        let err = client.chat(&[ChatMessage::system("s")], &[]).await.unwrap_err();
        assert!(err.is_provider_error());
        match err {
            LlmError::Request(e) => assert!(e.is_timeout()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&server.uri(), None, "m", TEST_TIMEOUT).unwrap();
        let err = client.chat(&[ChatMessage::system("s")], &[]).await.unwrap_err();
        assert!(matches!(err, LlmError::Decode(_)));
        assert!(!err.is_provider_error());
    }

    #[test]
    fn history_converts_to_wire_messages() {
        let call = ToolCall::new("call_1", "read_skill", json!({"skill_name": "x"}));
        let user = MessageContent::Parts(vec![
            ContentPart::Text { text: "t".to_string() },
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: "data:image/jpeg;base64,AA".to_string() },
            },
        ]);
        let wire: Vec<serde_json::Value> = [
            ChatMessage::system("s"),
            ChatMessage::user(user),
            ChatMessage::assistant("", vec![call]),
            ChatMessage::tool("call_1", "result"),
        ]
        .iter()
        .map(|m| serde_json::to_value(message_to_openai(m)).unwrap())
        .collect();

        assert_eq!(wire[0], json!({"role": "system", "content": "s"}));
        assert_eq!(wire[1]["content"][1]["type"], "image_url");
        assert_eq!(
            wire[2],
            json!({"role": "assistant", "content": null, "tool_calls": [{
                "id": "call_1", "type": "function",
                "function": {"name": "read_skill", "arguments": "{\"skill_name\":\"x\"}"}
            }]})
        );
        assert_eq!(
            wire[3],
            json!({"role": "tool", "tool_call_id": "call_1", "content": "result"})
        );
    }

    #[test]
    fn unparsable_arguments_stay_strings() {
        assert_eq!(parse_arguments(Some("not json")), json!("not json"));
        assert_eq!(parse_arguments(Some("")), json!({}));
        assert_eq!(parse_arguments(None), json!({}));
    }
}
