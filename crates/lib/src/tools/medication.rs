//! `get_medication_options`: live drug terminology lookup with a static fallback.

use super::report::{self, LookedUpDrug};
use crate::data::{DataProvider, MedicationOptions};
use crate::drugs::DrugLookup;

const MAX_QUERIES: usize = 3;
const MAX_DRUGS_PER_QUERY: usize = 2;

/// Diagnosis keyword to drug search queries; the first matching row wins.
const DRUG_TABLE: &[(&str, &[&str])] = &[
    ("disc herniation", &["ibuprofen", "naproxen", "celecoxib"]),
    ("herniated disc", &["ibuprofen", "naproxen", "celecoxib"]),
    ("back pain", &["ibuprofen", "acetaminophen", "naproxen"]),
    ("arthritis", &["ibuprofen", "naproxen", "celecoxib"]),
    ("headache", &["acetaminophen", "ibuprofen", "aspirin"]),
    ("migraine", &["sumatriptan", "ibuprofen", "acetaminophen"]),
    ("knee pain", &["ibuprofen", "naproxen", "acetaminophen"]),
];

const DEFAULT_QUERIES: &[&str] = &["ibuprofen", "acetaminophen"];

pub fn drug_queries_for_diagnosis(diagnosis: &str) -> &'static [&'static str] {
    let lower = diagnosis.to_lowercase();
    DRUG_TABLE
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, queries)| *queries)
        .unwrap_or(DEFAULT_QUERIES)
}

/// True when `name` contains any non-blank allergy as a case-insensitive substring.
pub fn matches_allergy(name: &str, allergies: &[String]) -> bool {
    let name = name.to_lowercase();
    allergies
        .iter()
        .map(|a| a.trim().to_lowercase())
        .filter(|a| !a.is_empty())
        .any(|a| name.contains(&a))
}

fn without_allergens(options: MedicationOptions, allergies: &[String]) -> MedicationOptions {
    MedicationOptions {
        primary: options
            .primary
            .into_iter()
            .filter(|m| !matches_allergy(&m.name, allergies) && !matches_allergy(&m.ingredient, allergies))
            .collect(),
        secondary: options
            .secondary
            .into_iter()
            .filter(|m| !matches_allergy(&m.name, allergies))
            .collect(),
    }
}

pub(crate) async fn medication_report(
    lookup: &dyn DrugLookup,
    data: &dyn DataProvider,
    diagnosis: &str,
    allergies: &[String],
) -> String {
    let mut found_any = false;
    let mut drugs = Vec::new();
    for query in drug_queries_for_diagnosis(diagnosis).iter().take(MAX_QUERIES) {
        let results = lookup.search_drugs(query).await;
        if results.is_empty() {
            continue;
        }
        found_any = true;
        for concept in results.into_iter().take(MAX_DRUGS_PER_QUERY) {
            if matches_allergy(&concept.name, allergies) {
                log::debug!("skipping {} (allergy match)", concept.name);
                continue;
            }
            let details = lookup.drug_details(&concept.rxcui).await;
            let interactions = lookup.interactions(&concept.rxcui).await;
            drugs.push(LookedUpDrug {
                name: concept.name,
                rxcui: concept.rxcui,
                term_type: details.and_then(|d| d.tty),
                interaction_count: interactions.len(),
            });
        }
    }

    if !found_any {
        log::warn!("no drugs found via lookup for {}, using fallback data", diagnosis);
        let options = without_allergens(data.medication_options(diagnosis), allergies);
        return report::medication_fallback(diagnosis, &options);
    }
    report::medication_lookup(diagnosis, &drugs)
}
