//! Fixed demo data. Free-text inputs are classified by keyword (English or Korean) into a
//! handful of conditions; every answer is a pure function of the inputs.

use super::{
    BodyPart, DataProvider, ImagingFindings, Medication, MedicationOptions, PainType,
    PatientHistory, RiskAssessment, SecondaryMedication, Severity, SeverityAssessment,
    SurgeryOption, SymptomAnalysis, TreatmentPlan,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Condition {
    DiscHerniation,
    Osteoarthritis,
    Migraine,
    Dermatitis,
    General,
}

const KEYWORDS: &[(Condition, &[&str])] = &[
    (
        Condition::DiscHerniation,
        &["disc", "herniat", "back", "lumbar", "sciatica", "추간판", "디스크", "허리", "요추"],
    ),
    (
        Condition::Osteoarthritis,
        &["arthritis", "knee", "joint", "관절", "무릎"],
    ),
    (
        Condition::Migraine,
        &["migraine", "headache", "head", "편두통", "두통", "머리"],
    ),
    (
        Condition::Dermatitis,
        &["rash", "skin", "itch", "eczema", "dermatitis", "피부", "발진", "가려"],
    ),
];

fn classify(text: &str) -> Condition {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(c, _)| *c)
        .unwrap_or(Condition::General)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Demo provider with three patients (P001-P003) and keyword-driven findings.
#[derive(Debug, Default, Clone)]
pub struct MockDataProvider;

impl MockDataProvider {
    pub fn new() -> Self {
        Self
    }
}

impl DataProvider for MockDataProvider {
    fn analyze_symptoms(
        &self,
        symptoms: &str,
        pain_scale: Option<i64>,
        duration: Option<&str>,
        pain_type: Option<PainType>,
    ) -> SymptomAnalysis {
        let condition = classify(symptoms);
        let mut red_flags = Vec::new();
        if pain_scale.is_some_and(|p| p >= 8) {
            red_flags.push("Pain rated 8/10 or higher; rule out acute pathology".to_string());
        }
        let mut analysis = match condition {
            Condition::DiscHerniation => {
                "Pattern consistent with mechanical low back pain, possibly with nerve root involvement."
            }
            Condition::Osteoarthritis => {
                "Pattern consistent with degenerative joint disease aggravated by weight bearing."
            }
            Condition::Migraine => "Pattern consistent with a primary headache disorder.",
            Condition::Dermatitis => "Pattern consistent with an inflammatory skin reaction.",
            Condition::General => "Non-specific presentation; further history and examination needed.",
        }
        .to_string();
        if pain_type == Some(PainType::Radiating) {
            analysis.push_str(" Radiating quality suggests nerve compression.");
        }
        if let Some(d) = duration {
            analysis.push_str(&format!(" Reported duration: {}.", d));
        }

        let (related, flags, diagnoses): (&[&str], &[&str], &[&str]) = match condition {
            Condition::DiscHerniation => (
                &["leg numbness", "pain on bending forward", "morning stiffness"],
                &["loss of bladder or bowel control", "progressive leg weakness"],
                &["lumbar disc herniation", "lumbar strain", "spinal stenosis"],
            ),
            Condition::Osteoarthritis => (
                &["joint stiffness", "crepitus", "swelling after activity"],
                &["hot swollen joint with fever"],
                &["knee osteoarthritis", "meniscus tear", "patellofemoral pain syndrome"],
            ),
            Condition::Migraine => (
                &["nausea", "light sensitivity", "visual aura"],
                &["sudden worst-ever headache", "headache with fever and stiff neck"],
                &["migraine", "tension-type headache"],
            ),
            Condition::Dermatitis => (
                &["itching", "dry skin", "redness"],
                &["rapidly spreading rash with fever"],
                &["contact dermatitis", "atopic dermatitis", "urticaria"],
            ),
            Condition::General => (
                &["fatigue"],
                &[],
                &["requires clinical evaluation"],
            ),
        };
        red_flags.extend(strings(flags));
        SymptomAnalysis {
            analysis,
            related_symptoms: strings(related),
            red_flags,
            possible_diagnoses: strings(diagnoses),
        }
    }

    fn patient_history(&self, patient_id: &str) -> Option<PatientHistory> {
        let history = match patient_id.trim().to_uppercase().as_str() {
            "P001" => PatientHistory {
                age: 45,
                gender: "male".to_string(),
                medical_history: strings(&["hypertension (2018)", "recurrent low back pain"]),
                surgeries: vec![],
                allergies: strings(&["penicillin"]),
                current_medications: strings(&["amlodipine 5mg once daily"]),
            },
            "P002" => PatientHistory {
                age: 62,
                gender: "female".to_string(),
                medical_history: strings(&["type 2 diabetes", "knee osteoarthritis", "osteoporosis"]),
                surgeries: strings(&["right knee arthroscopy (2019)"]),
                allergies: strings(&["ibuprofen"]),
                current_medications: strings(&["metformin 500mg twice daily", "calcium with vitamin D"]),
            },
            "P003" => PatientHistory {
                age: 34,
                gender: "female".to_string(),
                medical_history: strings(&["migraine with aura"]),
                surgeries: vec![],
                allergies: vec![],
                current_medications: strings(&["sumatriptan 50mg as needed"]),
            },
            _ => return None,
        };
        Some(history)
    }

    fn analyze_xray(&self, part: BodyPart) -> ImagingFindings {
        let (findings, abnormalities, normal, recommendation): (&str, &[&str], &[&str], &str) = match part {
            BodyPart::Spine => (
                "Mild loss of disc height at L4-L5 with small anterior osteophytes.",
                &["L4-L5 disc space narrowing", "early degenerative spurring"],
                &["vertebral alignment preserved", "no fracture"],
                "MRI recommended to evaluate disc and nerve roots.",
            ),
            BodyPart::Knee => (
                "Medial joint space narrowing with subchondral sclerosis.",
                &["medial compartment narrowing", "marginal osteophytes"],
                &["no effusion", "patella well seated"],
                "Correlate clinically; MRI if mechanical symptoms persist.",
            ),
            BodyPart::Chest => (
                "Clear lung fields; cardiac silhouette within normal limits.",
                &[],
                &["no consolidation", "no pleural effusion", "normal heart size"],
                "No further imaging needed.",
            ),
            _ => (
                "No acute osseous abnormality.",
                &[],
                &["joint spaces preserved", "no fracture or dislocation"],
                "Follow up clinically.",
            ),
        };
        ImagingFindings {
            findings: findings.to_string(),
            abnormalities: strings(abnormalities),
            normal_findings: strings(normal),
            detailed_analysis: None,
            conclusion: if abnormalities.is_empty() {
                "No significant abnormality.".to_string()
            } else {
                "Degenerative changes present.".to_string()
            },
            recommendation: recommendation.to_string(),
        }
    }

    fn analyze_mri(&self, part: BodyPart) -> ImagingFindings {
        let (findings, abnormalities, detail, conclusion): (&str, &[&str], &str, &str) = match part {
            BodyPart::Spine => (
                "Posterolateral disc protrusion at L4-L5 contacting the left L5 nerve root.",
                &["L4-L5 disc protrusion (left)", "mild foraminal narrowing"],
                "T2 signal loss at L4-L5 indicates disc desiccation; no cord signal change.",
                "Findings consistent with lumbar disc herniation with nerve root contact.",
            ),
            BodyPart::Knee => (
                "Degenerative signal in the posterior horn of the medial meniscus.",
                &["medial meniscus degeneration", "partial-thickness cartilage loss"],
                "No complete ligament tear; small joint effusion.",
                "Degenerative meniscal change with early osteoarthritis.",
            ),
            BodyPart::Brain => (
                "No mass, hemorrhage or acute infarct.",
                &[],
                "Diffusion sequences normal; ventricles normal in size.",
                "Normal brain MRI.",
            ),
            _ => (
                "Soft tissue and osseous structures unremarkable.",
                &[],
                "No marrow edema or tendon tear.",
                "No significant abnormality.",
            ),
        };
        ImagingFindings {
            findings: findings.to_string(),
            abnormalities: strings(abnormalities),
            normal_findings: vec![],
            detailed_analysis: Some(detail.to_string()),
            conclusion: conclusion.to_string(),
            recommendation: "Correlate with clinical findings.".to_string(),
        }
    }

    fn analyze_ct(&self, part: BodyPart) -> ImagingFindings {
        let (findings, abnormalities, conclusion): (&str, &[&str], &str) = match part {
            BodyPart::Brain => (
                "No intracranial hemorrhage or mass effect.",
                &[],
                "Normal non-contrast head CT.",
            ),
            BodyPart::Abdomen => (
                "Solid organs unremarkable; no free fluid.",
                &[],
                "No acute abdominal pathology.",
            ),
            BodyPart::Chest => (
                "Small 4mm nodule in the right upper lobe.",
                &["4mm right upper lobe nodule"],
                "Likely benign nodule; follow-up CT in 12 months.",
            ),
            _ => (
                "No fracture; sacroiliac joints symmetric.",
                &[],
                "No acute osseous abnormality.",
            ),
        };
        ImagingFindings {
            findings: findings.to_string(),
            abnormalities: strings(abnormalities),
            normal_findings: vec![],
            detailed_analysis: None,
            conclusion: conclusion.to_string(),
            recommendation: "Correlate with clinical findings.".to_string(),
        }
    }

    fn assess_severity(
        &self,
        diagnosis: &str,
        symptoms_summary: Option<&str>,
        imaging_summary: Option<&str>,
    ) -> SeverityAssessment {
        let context = format!(
            "{} {} {}",
            diagnosis,
            symptoms_summary.unwrap_or_default(),
            imaging_summary.unwrap_or_default()
        )
        .to_lowercase();
        let severe_markers = ["weakness", "paralysis", "incontinence", "마비", "근력 저하"];
        let moderate_markers = ["severe", "compression", "심한", "압박"];
        let mild_markers = ["mild", "minor", "경미", "가벼운"];
        let severity = if severe_markers.iter().any(|m| context.contains(m)) {
            Severity::Severe
        } else if moderate_markers.iter().any(|m| context.contains(m)) {
            Severity::Moderate
        } else if mild_markers.iter().any(|m| context.contains(m)) {
            Severity::Mild
        } else {
            Severity::Moderate
        };

        let (urgency, recommendation) = match severity {
            Severity::Mild => ("routine", "Conservative care and reassessment in 4-6 weeks."),
            Severity::Moderate => (
                "semi-urgent",
                "Specialist review within 2 weeks; start conservative treatment now.",
            ),
            Severity::Severe => (
                "urgent",
                "Prompt specialist referral; consider surgical consultation.",
            ),
        };
        let mut key_findings = vec![format!("working diagnosis: {}", diagnosis)];
        if let Some(s) = symptoms_summary.filter(|s| !s.is_empty()) {
            key_findings.push(format!("symptoms: {}", s));
        }
        if let Some(i) = imaging_summary.filter(|s| !s.is_empty()) {
            key_findings.push(format!("imaging: {}", i));
        }
        SeverityAssessment {
            severity,
            urgency: urgency.to_string(),
            rationale: format!(
                "Graded {} from reported symptoms and imaging for {}.",
                severity, diagnosis
            ),
            key_findings,
            recommendation: recommendation.to_string(),
        }
    }

    fn check_risk_factors(&self, age: Option<i64>, conditions: &[String]) -> RiskAssessment {
        let mut risks = Vec::new();
        let mut precautions = Vec::new();
        if let Some(age) = age {
            if age >= 65 {
                risks.push(format!("age {} (65 or older)", age));
                precautions.push("reduce NSAID dose and monitor renal function".to_string());
            }
        }
        for c in conditions {
            let lower = c.to_lowercase();
            if lower.contains("diabet") || lower.contains("당뇨") {
                risks.push(format!("{} (delayed healing, infection risk)", c));
                precautions.push("monitor blood glucose during steroid use".to_string());
            } else if lower.contains("hypertens") || lower.contains("고혈압") {
                risks.push(format!("{} (NSAIDs may raise blood pressure)", c));
                precautions.push("check blood pressure when starting NSAIDs".to_string());
            } else if lower.contains("kidney") || lower.contains("renal") || lower.contains("신장") {
                risks.push(format!("{} (drug clearance reduced)", c));
                precautions.push("avoid nephrotoxic drugs".to_string());
            } else {
                risks.push(c.clone());
            }
        }
        let overall = match risks.len() {
            0 => "low",
            1 => "moderate",
            _ => "high",
        };
        RiskAssessment {
            overall_risk: overall.to_string(),
            identified_risks: risks,
            precautions,
            recommendation: match overall {
                "low" => "Standard treatment pathway.".to_string(),
                _ => "Adjust treatment to the identified risks; review medication doses.".to_string(),
            },
        }
    }

    fn recommend_treatment(
        &self,
        diagnosis: &str,
        severity: Severity,
        patient_age: Option<i64>,
        contraindications: &[String],
    ) -> TreatmentPlan {
        let condition = classify(diagnosis);
        let (direction, primary, alternative) = match severity {
            Severity::Mild => (
                "conservative",
                "Activity modification, heat or ice, and short-course oral analgesics.",
                "Physical therapy if not improved within 2 weeks.",
            ),
            Severity::Moderate => (
                "conservative with active rehabilitation",
                "Oral NSAIDs with a structured physical therapy program for 6 weeks.",
                "Image-guided injection if pain limits rehabilitation.",
            ),
            Severity::Severe => (
                "interventional",
                "Specialist referral for injection or surgical evaluation.",
                "Intensive supervised rehabilitation when surgery is declined.",
            ),
        };
        let mut lifestyle = match condition {
            Condition::DiscHerniation => strings(&[
                "avoid prolonged sitting",
                "core strengthening exercises",
                "lift with the legs, not the back",
            ]),
            Condition::Osteoarthritis => strings(&[
                "weight management",
                "low-impact exercise such as cycling or swimming",
            ]),
            Condition::Migraine => strings(&["regular sleep schedule", "keep a headache diary"]),
            Condition::Dermatitis => strings(&["avoid known irritants", "moisturize daily"]),
            Condition::General => strings(&["stay active within comfort limits"]),
        };
        if patient_age.is_some_and(|a| a >= 65) {
            lifestyle.push("fall prevention at home".to_string());
        }
        let mut primary = primary.to_string();
        if !contraindications.is_empty() {
            primary.push_str(&format!(" Avoid: {}.", contraindications.join(", ")));
        }
        TreatmentPlan {
            treatment_direction: direction.to_string(),
            primary_treatment: primary,
            alternative_treatment: alternative.to_string(),
            lifestyle_recommendations: lifestyle,
            follow_up: match severity {
                Severity::Severe => "Reassess within 1 week.".to_string(),
                _ => "Reassess in 4-6 weeks.".to_string(),
            },
        }
    }

    fn medication_options(&self, diagnosis: &str) -> MedicationOptions {
        let ibuprofen = Medication {
            name: "Ibuprofen 200mg".to_string(),
            ingredient: "ibuprofen".to_string(),
            dosage: "200-400mg every 6-8 hours, max 1200mg/day".to_string(),
            effect: "anti-inflammatory analgesic".to_string(),
            warning: "take with food; avoid with peptic ulcer".to_string(),
        };
        let acetaminophen = Medication {
            name: "Acetaminophen 500mg".to_string(),
            ingredient: "acetaminophen".to_string(),
            dosage: "500-1000mg every 6 hours, max 3000mg/day".to_string(),
            effect: "analgesic and antipyretic".to_string(),
            warning: "avoid with heavy alcohol use".to_string(),
        };
        match classify(diagnosis) {
            Condition::Migraine => MedicationOptions {
                primary: vec![
                    Medication {
                        name: "Sumatriptan 50mg".to_string(),
                        ingredient: "sumatriptan".to_string(),
                        dosage: "50mg at onset, may repeat after 2 hours".to_string(),
                        effect: "aborts migraine attacks".to_string(),
                        warning: "contraindicated in coronary artery disease".to_string(),
                    },
                    acetaminophen,
                ],
                secondary: vec![SecondaryMedication {
                    name: "Metoclopramide".to_string(),
                    effect: "relieves migraine-associated nausea".to_string(),
                }],
            },
            Condition::Dermatitis => MedicationOptions {
                primary: vec![Medication {
                    name: "Hydrocortisone 1% cream".to_string(),
                    ingredient: "hydrocortisone".to_string(),
                    dosage: "thin layer twice daily for up to 7 days".to_string(),
                    effect: "topical anti-inflammatory".to_string(),
                    warning: "do not apply to broken skin".to_string(),
                }],
                secondary: vec![SecondaryMedication {
                    name: "Cetirizine".to_string(),
                    effect: "reduces itching".to_string(),
                }],
            },
            _ => MedicationOptions {
                primary: vec![
                    ibuprofen,
                    Medication {
                        name: "Naproxen 250mg".to_string(),
                        ingredient: "naproxen".to_string(),
                        dosage: "250mg twice daily".to_string(),
                        effect: "long-acting anti-inflammatory".to_string(),
                        warning: "avoid in kidney disease".to_string(),
                    },
                    acetaminophen,
                ],
                secondary: vec![
                    SecondaryMedication {
                        name: "Eperisone".to_string(),
                        effect: "muscle relaxant for spasm".to_string(),
                    },
                    SecondaryMedication {
                        name: "Pregabalin".to_string(),
                        effect: "neuropathic pain relief".to_string(),
                    },
                ],
            },
        }
    }

    fn surgery_options(&self, diagnosis: &str, _severity: Option<Severity>) -> Vec<SurgeryOption> {
        match classify(diagnosis) {
            Condition::DiscHerniation => vec![
                SurgeryOption {
                    name: "Microdiscectomy".to_string(),
                    method: "removal of the herniated fragment through a small incision".to_string(),
                    pros: "fast leg pain relief, small incision".to_string(),
                    cons: "recurrence in 5-15% of cases".to_string(),
                    recovery_time: "2-6 weeks".to_string(),
                    success_rate: "85-90%".to_string(),
                },
                SurgeryOption {
                    name: "Endoscopic discectomy".to_string(),
                    method: "percutaneous endoscopic removal under local anesthesia".to_string(),
                    pros: "minimal tissue damage, same-day discharge".to_string(),
                    cons: "limited for large or migrated fragments".to_string(),
                    recovery_time: "1-4 weeks".to_string(),
                    success_rate: "80-90%".to_string(),
                },
            ],
            Condition::Osteoarthritis => vec![
                SurgeryOption {
                    name: "Arthroscopic debridement".to_string(),
                    method: "removal of loose cartilage through arthroscopy".to_string(),
                    pros: "minimally invasive".to_string(),
                    cons: "limited benefit in advanced arthritis".to_string(),
                    recovery_time: "4-6 weeks".to_string(),
                    success_rate: "60-70%".to_string(),
                },
                SurgeryOption {
                    name: "Total knee replacement".to_string(),
                    method: "replacement of joint surfaces with a prosthesis".to_string(),
                    pros: "durable pain relief for end-stage disease".to_string(),
                    cons: "major surgery, long rehabilitation".to_string(),
                    recovery_time: "3-6 months".to_string(),
                    success_rate: "90-95%".to_string(),
                },
            ],
            _ => vec![SurgeryOption {
                name: "Surgical consultation".to_string(),
                method: "specialist evaluation to decide whether surgery is indicated".to_string(),
                pros: "individualized decision".to_string(),
                cons: "no standard procedure for this diagnosis".to_string(),
                recovery_time: "n/a".to_string(),
                success_rate: "n/a".to_string(),
            }],
        }
    }
}
