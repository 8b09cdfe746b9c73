//! Markdown reports returned to the model. Pure formatting: equal inputs give equal strings.

use crate::data::{
    BodyPart, ImagingFindings, MedicationOptions, Modality, PainType, PatientHistory,
    RiskAssessment, Severity, SeverityAssessment, SurgeryOption, SymptomAnalysis, TreatmentPlan,
};

const NOT_PROVIDED: &str = "not provided";

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "- none".to_string();
    }
    items
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

fn red_flag_list(items: &[String]) -> String {
    if items.is_empty() {
        return "- none".to_string();
    }
    items
        .iter()
        .map(|i| format!("⚠️ {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn symptoms(
    symptoms: &str,
    pain_scale: Option<i64>,
    duration: Option<&str>,
    pain_type: Option<PainType>,
    analysis: &SymptomAnalysis,
) -> String {
    format!(
        "## Symptom Analysis\n\n\
         **Chief complaint**: {}\n\
         **Pain scale**: {}/10\n\
         **Duration**: {}\n\
         **Pain type**: {}\n\n\
         ### Assessment\n{}\n\n\
         ### Related symptoms\n{}\n\n\
         ### Red flags\n{}\n\n\
         ### Possible diagnoses\n{}\n",
        symptoms,
        pain_scale.map(|p| p.to_string()).unwrap_or_else(|| NOT_PROVIDED.to_string()),
        duration.unwrap_or(NOT_PROVIDED),
        pain_type.map(|p| p.describe()).unwrap_or(NOT_PROVIDED),
        analysis.analysis,
        analysis.related_symptoms.join(", "),
        red_flag_list(&analysis.red_flags),
        analysis.possible_diagnoses.join(", "),
    )
}

pub fn patient_history(patient_id: &str, history: &PatientHistory) -> String {
    format!(
        "## Patient History\n\n\
         **Patient ID**: {}\n\
         **Age**: {}\n\
         **Gender**: {}\n\n\
         ### Medical history\n{}\n\n\
         ### Surgeries\n{}\n\n\
         ### Allergies\n{}\n\n\
         ### Current medications\n{}\n",
        patient_id,
        history.age,
        history.gender,
        bullet_list(&history.medical_history),
        bullet_list(&history.surgeries),
        bullet_list(&history.allergies),
        bullet_list(&history.current_medications),
    )
}

pub fn patient_not_found(patient_id: &str) -> String {
    format!(
        "## Patient History\n\n**Patient ID**: {}\n\nNo record on file for this patient. Ask the patient for history, allergies and current medications.\n",
        patient_id
    )
}

pub fn imaging(modality: Modality, part: BodyPart, findings: &ImagingFindings) -> String {
    let mut out = format!(
        "## {} Analysis\n\n\
         **Body part**: {}\n\
         **Image quality**: adequate\n\n\
         ### Findings\n{}\n\n\
         ### Abnormal findings\n{}\n",
        modality.label(),
        part,
        findings.findings,
        bullet_list(&findings.abnormalities),
    );
    if !findings.normal_findings.is_empty() {
        out.push_str(&format!(
            "\n### Normal findings\n{}\n",
            bullet_list(&findings.normal_findings)
        ));
    }
    if let Some(detail) = &findings.detailed_analysis {
        out.push_str(&format!("\n### Detailed analysis\n{}\n", detail));
    }
    out.push_str(&format!(
        "\n### Conclusion\n{}\n\n### Recommendation\n{}\n",
        findings.conclusion, findings.recommendation
    ));
    out
}

pub fn severity(diagnosis: &str, assessment: &SeverityAssessment) -> String {
    format!(
        "## Severity Assessment\n\n\
         **Diagnosis**: {}\n\
         **Severity**: {} {}\n\
         **Urgency**: {}\n\n\
         ### Rationale\n{}\n\n\
         ### Key findings\n{}\n\n\
         ### Recommendation\n{}\n",
        diagnosis,
        assessment.severity.marker(),
        assessment.severity,
        assessment.urgency,
        assessment.rationale,
        bullet_list(&assessment.key_findings),
        assessment.recommendation,
    )
}

pub fn risk_factors(risk: &RiskAssessment) -> String {
    format!(
        "## Risk Factor Assessment\n\n\
         **Overall risk**: {}\n\n\
         ### Identified risks\n{}\n\n\
         ### Precautions\n{}\n\n\
         ### Recommendation\n{}\n",
        risk.overall_risk,
        bullet_list(&risk.identified_risks),
        bullet_list(&risk.precautions),
        risk.recommendation,
    )
}

pub fn treatment(diagnosis: &str, severity: Severity, plan: &TreatmentPlan) -> String {
    format!(
        "## Treatment Recommendation\n\n\
         **Diagnosis**: {}\n\
         **Severity**: {}\n\
         **Treatment direction**: {}\n\n\
         ### First-line treatment\n{}\n\n\
         ### Alternatives\n{}\n\n\
         ### Lifestyle\n{}\n\n\
         ### Follow-up\n{}\n\n\
         ---\n\
         ⚠️ **Note**: AI-assisted suggestion only. Treatment decisions must be made with a physician.\n",
        diagnosis,
        severity,
        plan.treatment_direction,
        plan.primary_treatment,
        plan.alternative_treatment,
        bullet_list(&plan.lifestyle_recommendations),
        plan.follow_up,
    )
}

/// One drug found through the terminology lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct LookedUpDrug {
    pub name: String,
    pub rxcui: String,
    pub term_type: Option<String>,
    pub interaction_count: usize,
}

pub fn medication_lookup(diagnosis: &str, drugs: &[LookedUpDrug]) -> String {
    let mut out = format!(
        "## Medication Treatment Options (via RxNorm)\n\n**Diagnosis**: {}\n\n### Primary medications\n",
        diagnosis
    );
    for d in drugs {
        out.push_str(&format!(
            "\n**{}**\n- RxCUI: {}\n- Type: {}\n- Note: consult a healthcare provider for dosage and usage\n",
            d.name,
            d.rxcui,
            d.term_type.as_deref().unwrap_or("N/A"),
        ));
        if d.interaction_count > 0 {
            out.push_str(&format!(
                "- ⚠️ Known interactions: {} found\n",
                d.interaction_count
            ));
        }
    }
    out.push_str(
        "\n---\n⚠️ **Disclaimer**: Drug data from the NLM RxNorm database. Always consult a healthcare professional before taking any medication.\n",
    );
    out
}

pub fn medication_fallback(diagnosis: &str, options: &MedicationOptions) -> String {
    let mut out = format!(
        "## Medication Treatment Options (Fallback Data)\n\n**Diagnosis**: {}\n\n### Primary medications\n",
        diagnosis
    );
    for m in &options.primary {
        out.push_str(&format!(
            "\n**{}**\n- Ingredient: {}\n- Dosage: {}\n- Effect: {}\n- Warning: {}\n",
            m.name, m.ingredient, m.dosage, m.effect, m.warning
        ));
    }
    out.push_str("\n### Secondary medications\n");
    for m in &options.secondary {
        out.push_str(&format!("- {}: {}\n", m.name, m.effect));
    }
    out.push_str("\n⚠️ **Note**: Demo data. Live drug data unavailable.\n");
    out
}

pub fn surgery(diagnosis: &str, severity: Option<Severity>, options: &[SurgeryOption]) -> String {
    let mut out = format!("## Surgical Options\n\n**Diagnosis**: {}\n", diagnosis);
    if let Some(s) = severity {
        out.push_str(&format!("**Severity**: {}\n", s));
    }
    out.push('\n');
    for o in options {
        out.push_str(&format!(
            "### {}\n- **Method**: {}\n- **Pros**: {}\n- **Cons**: {}\n- **Recovery**: {}\n- **Success rate**: {}\n\n",
            o.name, o.method, o.pros, o.cons, o.recovery_time, o.success_rate
        ));
    }
    out.push_str("---\n⚠️ Decide on surgery only after thorough consultation with a specialist.");
    out
}

pub fn skill_not_found(name: &str) -> String {
    format!("skill not found: {}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lists_render_none() {
        assert_eq!(bullet_list(&[]), "- none");
        assert_eq!(red_flag_list(&[]), "- none");
        assert_eq!(bullet_list(&["a".to_string(), "b".to_string()]), "- a\n- b");
    }

    #[test]
    fn lookup_report_mentions_interactions_only_when_present() {
        let drugs = vec![
            LookedUpDrug {
                name: "naproxen 250 MG Oral Tablet".to_string(),
                rxcui: "198013".to_string(),
                term_type: Some("SCD".to_string()),
                interaction_count: 3,
            },
            LookedUpDrug {
                name: "Aleve".to_string(),
                rxcui: "215101".to_string(),
                term_type: None,
                interaction_count: 0,
            },
        ];
        let out = medication_lookup("back pain", &drugs);
        assert!(out.contains("**naproxen 250 MG Oral Tablet**"));
        assert!(out.contains("- Type: SCD"));
        assert!(out.contains("- Type: N/A"));
        assert_eq!(out.matches("Known interactions").count(), 1);
        assert!(out.contains("3 found"));
    }
}
