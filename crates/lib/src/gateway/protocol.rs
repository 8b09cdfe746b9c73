//! Gateway HTTP request and response bodies.

use serde::{Deserialize, Serialize};

use crate::skills::SkillSummary;

pub const DEFAULT_PATIENT_ID: &str = "P001";

fn default_patient_id() -> String {
    DEFAULT_PATIENT_ID.to_string()
}

/// Body of `POST /chat`. `patientId` also accepts `patient_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_patient_id", alias = "patient_id")]
    pub patient_id: String,
    /// Base64 image, optionally with a `data:` URL prefix.
    #[serde(default)]
    pub image: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub agent: String,
    pub skills_count: usize,
    pub model: String,
}

/// Body of `GET /skills`: summaries plus the markup injected into the system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsResponse {
    pub skills: Vec<SkillSummary>,
    pub markup: String,
}

/// Error envelope for failures outside a stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub status_code: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_defaults_and_alias() {
        let r: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(r.patient_id, "P001");
        assert!(r.image.is_none());

        let r: ChatRequest =
            serde_json::from_str(r#"{"message":"hi","patient_id":"P002","image":"QUJD"}"#).unwrap();
        assert_eq!(r.patient_id, "P002");
        assert_eq!(r.image.as_deref(), Some("QUJD"));

        let r: ChatRequest = serde_json::from_str(r#"{"message":"hi","patientId":"P003"}"#).unwrap();
        assert_eq!(r.patient_id, "P003");
    }

    #[test]
    fn chat_request_requires_message() {
        assert!(serde_json::from_str::<ChatRequest>(r#"{"patientId":"P001"}"#).is_err());
    }

    #[test]
    fn envelopes_use_camel_case() {
        let v = serde_json::to_value(ErrorResponse {
            error: "not found".to_string(),
            status_code: 404,
        })
        .unwrap();
        assert_eq!(v["statusCode"], 404);
        let v = serde_json::to_value(HealthResponse {
            status: "ok".to_string(),
            agent: "AI Doctor Agent".to_string(),
            skills_count: 4,
            model: "gpt-4o".to_string(),
        })
        .unwrap();
        assert_eq!(v["skillsCount"], 4);
    }
}
