//! Drug terminology lookup. Every operation degrades to an empty or `None` result;
//! callers never see transport or parse errors.

mod rxnorm;

pub use rxnorm::{RxNormClient, DEFAULT_RXNORM_BASE_URL};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugConcept {
    pub rxcui: String,
    pub name: String,
    pub synonym: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugDetails {
    pub rxcui: String,
    pub name: String,
    pub synonym: String,
    /// RxNorm term type (IN, BN, SCD, ...).
    pub tty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugInteraction {
    pub drug: String,
    pub severity: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedDrug {
    pub rxcui: String,
    pub name: String,
    pub tty: Option<String>,
}

#[async_trait]
pub trait DrugLookup: Send + Sync {
    /// Concepts matching a drug name, at most 5.
    async fn search_drugs(&self, query: &str) -> Vec<DrugConcept>;

    async fn drug_details(&self, rxcui: &str) -> Option<DrugDetails>;

    /// Known interactions, at most 10.
    async fn interactions(&self, rxcui: &str) -> Vec<DrugInteraction>;

    /// Related concepts of the given term type (e.g. "SCD" for clinical drugs, "BN" for brands).
    async fn related(&self, rxcui: &str, tty: &str) -> Vec<RelatedDrug>;
}

/// Lookup that never finds anything; used when `drugs.enabled` is false.
#[derive(Debug, Default, Clone)]
pub struct NoDrugLookup;

#[async_trait]
impl DrugLookup for NoDrugLookup {
    async fn search_drugs(&self, _query: &str) -> Vec<DrugConcept> {
        Vec::new()
    }

    async fn drug_details(&self, _rxcui: &str) -> Option<DrugDetails> {
        None
    }

    async fn interactions(&self, _rxcui: &str) -> Vec<DrugInteraction> {
        Vec::new()
    }

    async fn related(&self, _rxcui: &str, _tty: &str) -> Vec<RelatedDrug> {
        Vec::new()
    }
}
