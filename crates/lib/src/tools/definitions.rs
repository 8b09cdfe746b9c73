//! JSON-Schema parameter contracts advertised to the model.

use serde_json::{json, Value};

use super::ToolKind;
use crate::llm::{ToolDefinition, ToolFunctionDefinition};

fn definition(kind: ToolKind, description: &str, parameters: Value) -> ToolDefinition {
    ToolDefinition {
        typ: "function".to_string(),
        function: ToolFunctionDefinition {
            name: kind.name().to_string(),
            description: Some(description.to_string()),
            parameters,
        },
    }
}

fn image_data() -> Value {
    json!({"type": "string", "description": "Image as base64 or URL"})
}

/// Definitions for every [`ToolKind`], in `ToolKind::ALL` order.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolKind::ALL.iter().map(|&k| definition_for(k)).collect()
}

fn definition_for(kind: ToolKind) -> ToolDefinition {
    match kind {
        ToolKind::AnalyzeSymptoms => definition(
            kind,
            "Analyze the patient's symptoms: location, intensity, character and duration of pain.",
            json!({
                "type": "object",
                "properties": {
                    "symptoms": {"type": "string", "description": "Symptoms the patient reports (e.g. low back pain, headache, knee pain)"},
                    "pain_scale": {"type": "integer", "description": "Pain intensity 1-10 (1: minimal, 10: worst)"},
                    "duration": {"type": "string", "description": "How long the symptoms have lasted (e.g. 3 days, 2 weeks)"},
                    "pain_type": {
                        "type": "string",
                        "enum": ["dull", "sharp", "radiating", "throbbing", "burning"],
                        "description": "Character of the pain"
                    }
                },
                "required": ["symptoms"]
            }),
        ),
        ToolKind::GetPatientHistory => definition(
            kind,
            "Look up the patient's medical history, surgeries, allergies and current medications.",
            json!({
                "type": "object",
                "properties": {
                    "patient_id": {"type": "string", "description": "Patient ID"}
                },
                "required": ["patient_id"]
            }),
        ),
        ToolKind::AnalyzeXray => definition(
            kind,
            "Analyze an X-ray: fractures, disc spaces, joint changes, lung lesions.",
            json!({
                "type": "object",
                "properties": {
                    "image_data": image_data(),
                    "body_part": {
                        "type": "string",
                        "enum": ["spine", "chest", "knee", "shoulder", "hip", "ankle", "wrist", "pelvis"],
                        "description": "Imaged body part"
                    }
                },
                "required": ["body_part"]
            }),
        ),
        ToolKind::AnalyzeMri => definition(
            kind,
            "Analyze an MRI: disc herniation, ligament injury, cartilage tears, brain lesions.",
            json!({
                "type": "object",
                "properties": {
                    "image_data": image_data(),
                    "body_part": {
                        "type": "string",
                        "enum": ["spine", "brain", "knee", "shoulder", "hip"],
                        "description": "Imaged body part"
                    }
                },
                "required": ["body_part"]
            }),
        ),
        ToolKind::AnalyzeCt => definition(
            kind,
            "Analyze a CT scan: intracranial bleeding, abdominal organ findings, pulmonary embolism.",
            json!({
                "type": "object",
                "properties": {
                    "image_data": image_data(),
                    "body_part": {
                        "type": "string",
                        "enum": ["brain", "chest", "abdomen", "pelvis"],
                        "description": "Imaged body part"
                    }
                },
                "required": ["body_part"]
            }),
        ),
        ToolKind::AssessSeverity => definition(
            kind,
            "Grade disease severity (mild, moderate or severe) and urgency.",
            json!({
                "type": "object",
                "properties": {
                    "diagnosis": {"type": "string", "description": "Working diagnosis (e.g. lumbar disc herniation, fracture)"},
                    "symptoms_summary": {"type": "string", "description": "Summary of the symptom analysis"},
                    "imaging_summary": {"type": "string", "description": "Summary of imaging findings, if any"}
                },
                "required": ["diagnosis"]
            }),
        ),
        ToolKind::CheckRiskFactors => definition(
            kind,
            "Check patient risk factors: age, underlying conditions, lifestyle.",
            json!({
                "type": "object",
                "properties": {
                    "patient_id": {"type": "string", "description": "Patient ID"},
                    "age": {"type": "integer", "description": "Patient age"},
                    "conditions": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Underlying conditions (diabetes, hypertension, ...)"
                    }
                },
                "required": []
            }),
        ),
        ToolKind::RecommendTreatment => definition(
            kind,
            "Recommend an overall treatment plan: operative or conservative, with options.",
            json!({
                "type": "object",
                "properties": {
                    "diagnosis": {"type": "string", "description": "Diagnosis"},
                    "severity": {
                        "type": "string",
                        "enum": ["mild", "moderate", "severe"],
                        "description": "Severity"
                    },
                    "patient_age": {"type": "integer", "description": "Patient age"},
                    "contraindications": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Contraindications (allergies, conditions, ...)"
                    }
                },
                "required": ["diagnosis", "severity"]
            }),
        ),
        ToolKind::GetMedicationOptions => definition(
            kind,
            "Look up medication options and dosing for a diagnosis.",
            json!({
                "type": "object",
                "properties": {
                    "diagnosis": {"type": "string", "description": "Diagnosis"},
                    "allergies": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Known drug allergies"
                    }
                },
                "required": ["diagnosis"]
            }),
        ),
        ToolKind::GetSurgeryOptions => definition(
            kind,
            "Look up surgical options for a diagnosis: method, pros and cons, recovery time.",
            json!({
                "type": "object",
                "properties": {
                    "diagnosis": {"type": "string", "description": "Diagnosis"},
                    "severity": {
                        "type": "string",
                        "enum": ["moderate", "severe"],
                        "description": "Severity"
                    }
                },
                "required": ["diagnosis"]
            }),
        ),
        ToolKind::ReadSkill => definition(
            kind,
            "Read a skill document (SKILL.md) to learn how to carry out a task.",
            json!({
                "type": "object",
                "properties": {
                    "skill_name": {
                        "type": "string",
                        "description": "Skill name (symptom-analysis, imaging-analysis, disease-assessment, treatment-recommendation)"
                    }
                },
                "required": ["skill_name"]
            }),
        ),
    }
}
