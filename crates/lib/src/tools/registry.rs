//! Dispatch from tool name to handler. Handlers parse typed arguments, pull data from the
//! provider or drug lookup, and format a report.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::medication::medication_report;
use super::{report, ToolError, ToolKind};
use crate::agent::ToolExecutor;
use crate::data::{BodyPart, DataProvider, Modality, PainType, Severity};
use crate::drugs::DrugLookup;
use crate::skills::SkillCatalog;

#[derive(Debug, Deserialize)]
struct SymptomsArgs {
    symptoms: String,
    pain_scale: Option<i64>,
    duration: Option<String>,
    pain_type: Option<PainType>,
}

#[derive(Debug, Deserialize)]
struct PatientArgs {
    patient_id: String,
}

#[derive(Debug, Deserialize)]
struct ImagingArgs {
    body_part: BodyPart,
    #[allow(dead_code)]
    image_data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeverityArgs {
    diagnosis: String,
    symptoms_summary: Option<String>,
    imaging_summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RiskArgs {
    #[allow(dead_code)]
    patient_id: Option<String>,
    age: Option<i64>,
    #[serde(default)]
    conditions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TreatmentArgs {
    diagnosis: String,
    severity: Severity,
    patient_age: Option<i64>,
    #[serde(default)]
    contraindications: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct MedicationArgs {
    diagnosis: String,
    #[serde(default)]
    allergies: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SurgeryArgs {
    diagnosis: String,
    severity: Option<Severity>,
}

#[derive(Debug, Deserialize)]
struct SkillArgs {
    skill_name: String,
}

/// Parse handler arguments. Null counts as an empty object; anything else that is not an object is rejected.
fn parse_args<T: DeserializeOwned>(kind: ToolKind, args: &Value) -> Result<T, ToolError> {
    let invalid = |reason: String| ToolError::InvalidArguments {
        tool: kind.name(),
        reason,
    };
    let value = match args {
        Value::Null => Value::Object(Default::default()),
        Value::Object(_) => args.clone(),
        other => return Err(invalid(format!("expected a JSON object, got {}", other))),
    };
    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}

/// The fixed set of clinical tools, sharing one data provider, drug lookup and skill catalog.
#[derive(Clone)]
pub struct ToolRegistry {
    data: Arc<dyn DataProvider>,
    drugs: Arc<dyn DrugLookup>,
    skills: Arc<SkillCatalog>,
}

impl ToolRegistry {
    pub fn new(
        data: Arc<dyn DataProvider>,
        drugs: Arc<dyn DrugLookup>,
        skills: Arc<SkillCatalog>,
    ) -> Self {
        Self {
            data,
            drugs,
            skills,
        }
    }

    /// Run a tool, converting any failure into the same `{"error": ...}` payload the agent
    /// feeds back to the model. Never fails.
    pub async fn execute_or_payload(&self, name: &str, args: &Value) -> String {
        match self.dispatch(name, args).await {
            Ok(out) => out,
            Err(e) => {
                log::warn!("tool {} failed: {}", name, e);
                e.to_payload()
            }
        }
    }

    /// Run a tool by name. Unknown names and bad arguments are errors.
    pub async fn dispatch(&self, name: &str, args: &Value) -> Result<String, ToolError> {
        let kind = ToolKind::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        log::debug!("dispatching {}", kind.name());
        match kind {
            ToolKind::AnalyzeSymptoms => {
                let a: SymptomsArgs = parse_args(kind, args)?;
                let analysis = self.data.analyze_symptoms(
                    &a.symptoms,
                    a.pain_scale,
                    a.duration.as_deref(),
                    a.pain_type,
                );
                Ok(report::symptoms(
                    &a.symptoms,
                    a.pain_scale,
                    a.duration.as_deref(),
                    a.pain_type,
                    &analysis,
                ))
            }
            ToolKind::GetPatientHistory => {
                let a: PatientArgs = parse_args(kind, args)?;
                Ok(match self.data.patient_history(&a.patient_id) {
                    Some(h) => report::patient_history(&a.patient_id, &h),
                    None => report::patient_not_found(&a.patient_id),
                })
            }
            ToolKind::AnalyzeXray => self.imaging(kind, Modality::Xray, args),
            ToolKind::AnalyzeMri => self.imaging(kind, Modality::Mri, args),
            ToolKind::AnalyzeCt => self.imaging(kind, Modality::Ct, args),
            ToolKind::AssessSeverity => {
                let a: SeverityArgs = parse_args(kind, args)?;
                let assessment = self.data.assess_severity(
                    &a.diagnosis,
                    a.symptoms_summary.as_deref(),
                    a.imaging_summary.as_deref(),
                );
                Ok(report::severity(&a.diagnosis, &assessment))
            }
            ToolKind::CheckRiskFactors => {
                let a: RiskArgs = parse_args(kind, args)?;
                let risk = self
                    .data
                    .check_risk_factors(a.age, a.conditions.as_deref().unwrap_or_default());
                Ok(report::risk_factors(&risk))
            }
            ToolKind::RecommendTreatment => {
                let a: TreatmentArgs = parse_args(kind, args)?;
                let plan = self.data.recommend_treatment(
                    &a.diagnosis,
                    a.severity,
                    a.patient_age,
                    a.contraindications.as_deref().unwrap_or_default(),
                );
                Ok(report::treatment(&a.diagnosis, a.severity, &plan))
            }
            ToolKind::GetMedicationOptions => {
                let a: MedicationArgs = parse_args(kind, args)?;
                Ok(medication_report(
                    self.drugs.as_ref(),
                    self.data.as_ref(),
                    &a.diagnosis,
                    a.allergies.as_deref().unwrap_or_default(),
                )
                .await)
            }
            ToolKind::GetSurgeryOptions => {
                let a: SurgeryArgs = parse_args(kind, args)?;
                if a.severity == Some(Severity::Mild) {
                    return Err(ToolError::InvalidArguments {
                        tool: kind.name(),
                        reason: "severity must be moderate or severe".to_string(),
                    });
                }
                let options = self.data.surgery_options(&a.diagnosis, a.severity);
                Ok(report::surgery(&a.diagnosis, a.severity, &options))
            }
            ToolKind::ReadSkill => {
                let a: SkillArgs = parse_args(kind, args)?;
                Ok(self
                    .skills
                    .activate(&a.skill_name)
                    .unwrap_or_else(|| report::skill_not_found(&a.skill_name)))
            }
        }
    }

    fn imaging(&self, kind: ToolKind, modality: Modality, args: &Value) -> Result<String, ToolError> {
        let a: ImagingArgs = parse_args(kind, args)?;
        if !modality.supports(a.body_part) {
            return Err(ToolError::InvalidArguments {
                tool: kind.name(),
                reason: format!(
                    "body_part {} is not supported for {}",
                    a.body_part.as_str(),
                    modality.label()
                ),
            });
        }
        let findings = match modality {
            Modality::Xray => self.data.analyze_xray(a.body_part),
            Modality::Mri => self.data.analyze_mri(a.body_part),
            Modality::Ct => self.data.analyze_ct(a.body_part),
        };
        Ok(report::imaging(modality, a.body_part, &findings))
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, name: &str, args: &Value) -> Result<String, ToolError> {
        self.dispatch(name, args).await
    }
}
