//! Tool layer: the fixed clinical tool set offered to the model and its dispatcher.

mod definitions;
mod medication;
mod registry;
mod report;

pub use crate::llm::ToolDefinition;
pub use definitions::tool_definitions;
pub use medication::{drug_queries_for_diagnosis, matches_allergy};
pub use registry::ToolRegistry;

/// Every tool the model may call. Names are part of the wire contract with the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    AnalyzeSymptoms,
    GetPatientHistory,
    AnalyzeXray,
    AnalyzeMri,
    AnalyzeCt,
    AssessSeverity,
    CheckRiskFactors,
    RecommendTreatment,
    GetMedicationOptions,
    GetSurgeryOptions,
    ReadSkill,
}

impl ToolKind {
    pub const ALL: [ToolKind; 11] = [
        ToolKind::AnalyzeSymptoms,
        ToolKind::GetPatientHistory,
        ToolKind::AnalyzeXray,
        ToolKind::AnalyzeMri,
        ToolKind::AnalyzeCt,
        ToolKind::AssessSeverity,
        ToolKind::CheckRiskFactors,
        ToolKind::RecommendTreatment,
        ToolKind::GetMedicationOptions,
        ToolKind::GetSurgeryOptions,
        ToolKind::ReadSkill,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::AnalyzeSymptoms => "analyze_symptoms",
            ToolKind::GetPatientHistory => "get_patient_history",
            ToolKind::AnalyzeXray => "analyze_xray",
            ToolKind::AnalyzeMri => "analyze_mri",
            ToolKind::AnalyzeCt => "analyze_ct",
            ToolKind::AssessSeverity => "assess_severity",
            ToolKind::CheckRiskFactors => "check_risk_factors",
            ToolKind::RecommendTreatment => "recommend_treatment",
            ToolKind::GetMedicationOptions => "get_medication_options",
            ToolKind::GetSurgeryOptions => "get_surgery_options",
            ToolKind::ReadSkill => "read_skill",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

/// How a tool call is announced in the event stream. Derived from the name alone,
/// so calls to unknown tools are still announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCategory {
    SkillActivation,
    ImagingAnalysis,
    ClinicalAnalysis,
    SeverityAssessment,
    TreatmentSearch,
    Other,
}

impl ToolCategory {
    pub fn of(name: &str) -> Self {
        if name == ToolKind::ReadSkill.name() {
            ToolCategory::SkillActivation
        } else if name.starts_with("analyze") {
            if ["xray", "mri", "ct"].iter().any(|m| name.contains(m)) {
                ToolCategory::ImagingAnalysis
            } else {
                ToolCategory::ClinicalAnalysis
            }
        } else if name == ToolKind::AssessSeverity.name() {
            ToolCategory::SeverityAssessment
        } else if name == ToolKind::RecommendTreatment.name() {
            ToolCategory::TreatmentSearch
        } else {
            ToolCategory::Other
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },
}

impl ToolError {
    /// `{"error": "<message>"}` as fed back to the model.
    pub fn to_payload(&self) -> String {
        error_payload(&self.to_string())
    }
}

fn error_payload(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
