//! Clinical data behind the tool handlers.
//!
//! Handlers only format; every number, finding and recommendation comes from a [`DataProvider`].
//! [`MockDataProvider`] serves fixed demo tables.

mod mock;

pub use mock::MockDataProvider;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Body parts accepted by the imaging tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyPart {
    Spine,
    Chest,
    Knee,
    Shoulder,
    Hip,
    Ankle,
    Wrist,
    Pelvis,
    Brain,
    Abdomen,
}

impl BodyPart {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyPart::Spine => "spine",
            BodyPart::Chest => "chest",
            BodyPart::Knee => "knee",
            BodyPart::Shoulder => "shoulder",
            BodyPart::Hip => "hip",
            BodyPart::Ankle => "ankle",
            BodyPart::Wrist => "wrist",
            BodyPart::Pelvis => "pelvis",
            BodyPart::Brain => "brain",
            BodyPart::Abdomen => "abdomen",
        }
    }

    /// Korean clinical label, shown next to the English name in reports.
    pub fn localized(&self) -> &'static str {
        match self {
            BodyPart::Spine => "척추",
            BodyPart::Chest => "흉부",
            BodyPart::Knee => "무릎",
            BodyPart::Shoulder => "어깨",
            BodyPart::Hip => "고관절",
            BodyPart::Ankle => "발목",
            BodyPart::Wrist => "손목",
            BodyPart::Pelvis => "골반",
            BodyPart::Brain => "뇌",
            BodyPart::Abdomen => "복부",
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.localized())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Xray,
    Mri,
    Ct,
}

impl Modality {
    pub fn label(&self) -> &'static str {
        match self {
            Modality::Xray => "X-ray",
            Modality::Mri => "MRI",
            Modality::Ct => "CT",
        }
    }

    /// Body parts the modality's tool schema accepts.
    pub fn supported_parts(&self) -> &'static [BodyPart] {
        use BodyPart::*;
        match self {
            Modality::Xray => &[Spine, Chest, Knee, Shoulder, Hip, Ankle, Wrist, Pelvis],
            Modality::Mri => &[Spine, Brain, Knee, Shoulder, Hip],
            Modality::Ct => &[Brain, Chest, Abdomen, Pelvis],
        }
    }

    pub fn supports(&self, part: BodyPart) -> bool {
        self.supported_parts().contains(&part)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PainType {
    Dull,
    Sharp,
    Radiating,
    Throbbing,
    Burning,
}

impl PainType {
    pub fn describe(&self) -> &'static str {
        match self {
            PainType::Dull => "dull (heavy, aching)",
            PainType::Sharp => "sharp (stabbing)",
            PainType::Radiating => "radiating (spreads along a nerve path)",
            PainType::Throbbing => "throbbing (pulsating)",
            PainType::Burning => "burning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Severity::Mild => "🟢",
            Severity::Moderate => "🟡",
            Severity::Severe => "🔴",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymptomAnalysis {
    pub analysis: String,
    pub related_symptoms: Vec<String>,
    pub red_flags: Vec<String>,
    pub possible_diagnoses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatientHistory {
    pub age: u32,
    pub gender: String,
    pub medical_history: Vec<String>,
    pub surgeries: Vec<String>,
    pub allergies: Vec<String>,
    pub current_medications: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImagingFindings {
    pub findings: String,
    pub abnormalities: Vec<String>,
    pub normal_findings: Vec<String>,
    /// Sequence-level detail; MRI only.
    pub detailed_analysis: Option<String>,
    pub conclusion: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeverityAssessment {
    pub severity: Severity,
    pub urgency: String,
    pub rationale: String,
    pub key_findings: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub overall_risk: String,
    pub identified_risks: Vec<String>,
    pub precautions: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreatmentPlan {
    pub treatment_direction: String,
    pub primary_treatment: String,
    pub alternative_treatment: String,
    pub lifestyle_recommendations: Vec<String>,
    pub follow_up: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Medication {
    pub name: String,
    pub ingredient: String,
    pub dosage: String,
    pub effect: String,
    pub warning: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryMedication {
    pub name: String,
    pub effect: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MedicationOptions {
    pub primary: Vec<Medication>,
    pub secondary: Vec<SecondaryMedication>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurgeryOption {
    pub name: String,
    pub method: String,
    pub pros: String,
    pub cons: String,
    pub recovery_time: String,
    pub success_rate: String,
}

/// Source of clinical data for the tool handlers. Implementations must be deterministic for equal inputs.
pub trait DataProvider: Send + Sync {
    fn analyze_symptoms(
        &self,
        symptoms: &str,
        pain_scale: Option<i64>,
        duration: Option<&str>,
        pain_type: Option<PainType>,
    ) -> SymptomAnalysis;

    /// None when no record exists for the id.
    fn patient_history(&self, patient_id: &str) -> Option<PatientHistory>;

    fn analyze_xray(&self, part: BodyPart) -> ImagingFindings;

    fn analyze_mri(&self, part: BodyPart) -> ImagingFindings;

    fn analyze_ct(&self, part: BodyPart) -> ImagingFindings;

    fn assess_severity(
        &self,
        diagnosis: &str,
        symptoms_summary: Option<&str>,
        imaging_summary: Option<&str>,
    ) -> SeverityAssessment;

    fn check_risk_factors(&self, age: Option<i64>, conditions: &[String]) -> RiskAssessment;

    fn recommend_treatment(
        &self,
        diagnosis: &str,
        severity: Severity,
        patient_age: Option<i64>,
        contraindications: &[String],
    ) -> TreatmentPlan;

    /// Static medication table used when the drug terminology lookup yields nothing.
    fn medication_options(&self, diagnosis: &str) -> MedicationOptions;

    fn surgery_options(&self, diagnosis: &str, severity: Option<Severity>) -> Vec<SurgeryOption>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_part_display_includes_localized_label() {
        assert_eq!(BodyPart::Spine.to_string(), "spine (척추)");
        assert_eq!(BodyPart::Brain.localized(), "뇌");
    }

    #[test]
    fn modality_parts_match_tool_schemas() {
        assert!(Modality::Xray.supports(BodyPart::Wrist));
        assert!(!Modality::Xray.supports(BodyPart::Brain));
        assert!(Modality::Mri.supports(BodyPart::Brain));
        assert!(!Modality::Mri.supports(BodyPart::Chest));
        assert!(Modality::Ct.supports(BodyPart::Abdomen));
        assert!(!Modality::Ct.supports(BodyPart::Spine));
    }

    #[test]
    fn enums_parse_from_lowercase() {
        let p: PainType = serde_json::from_str("\"radiating\"").unwrap();
        assert_eq!(p, PainType::Radiating);
        let s: Severity = serde_json::from_str("\"severe\"").unwrap();
        assert_eq!(s, Severity::Severe);
        assert!(serde_json::from_str::<Severity>("\"critical\"").is_err());
    }
}
