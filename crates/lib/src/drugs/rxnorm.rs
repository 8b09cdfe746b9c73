//! RxNav REST client (https://lhncbc.nlm.nih.gov/RxNav/APIs/).

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{DrugConcept, DrugDetails, DrugInteraction, DrugLookup, RelatedDrug};

pub const DEFAULT_RXNORM_BASE_URL: &str = "https://rxnav.nlm.nih.gov/REST";
const USER_AGENT: &str = "AI-Doctor-Agent/1.0";
const MAX_SEARCH_RESULTS: usize = 5;
const MAX_INTERACTIONS: usize = 10;

#[derive(Debug, thiserror::Error)]
enum RxNormError {
    #[error("rxnorm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("rxnorm api error: {0}")]
    Api(reqwest::StatusCode),
}

#[derive(Clone)]
pub struct RxNormClient {
    base_url: String,
    client: reqwest::Client,
}

impl RxNormClient {
    /// Build a client with a per-request timeout. Fails only if the HTTP client cannot be constructed.
    pub fn new(base_url: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_RXNORM_BASE_URL.to_string());
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { base_url, client })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RxNormError> {
        let url = format!("{}/{}", self.base_url, path);
        let res = self.client.get(&url).query(query).send().await?;
        if !res.status().is_success() {
            return Err(RxNormError::Api(res.status()));
        }
        Ok(res.json().await?)
    }
}

#[async_trait]
impl DrugLookup for RxNormClient {
    async fn search_drugs(&self, query: &str) -> Vec<DrugConcept> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        log::info!("rxnorm: searching drugs: {}", query);
        let data: DrugsResponse = match self.get_json("drugs.json", &[("name", query)]).await {
            Ok(d) => d,
            Err(e) => {
                log::warn!("rxnorm: search for {} failed: {}", query, e);
                return Vec::new();
            }
        };
        let drugs: Vec<DrugConcept> = data
            .drug_group
            .map(|g| g.concept_group)
            .unwrap_or_default()
            .into_iter()
            .flat_map(|g| g.concept_properties)
            .map(|p| DrugConcept {
                rxcui: p.rxcui.unwrap_or_default(),
                name: p.name.unwrap_or_default(),
                synonym: p.synonym.unwrap_or_default(),
            })
            .take(MAX_SEARCH_RESULTS)
            .collect();
        log::debug!("rxnorm: {} result(s) for {}", drugs.len(), query);
        drugs
    }

    async fn drug_details(&self, rxcui: &str) -> Option<DrugDetails> {
        let path = format!("rxcui/{}/properties.json", rxcui);
        let data: PropertiesResponse = match self.get_json(&path, &[]).await {
            Ok(d) => d,
            Err(e) => {
                log::warn!("rxnorm: properties for {} failed: {}", rxcui, e);
                return None;
            }
        };
        data.properties.map(|p| DrugDetails {
            rxcui: p.rxcui.unwrap_or_else(|| rxcui.to_string()),
            name: p.name.unwrap_or_default(),
            synonym: p.synonym.unwrap_or_default(),
            tty: p.tty,
        })
    }

    async fn interactions(&self, rxcui: &str) -> Vec<DrugInteraction> {
        let data: InteractionResponse = match self
            .get_json("interaction/interaction.json", &[("rxcui", rxcui)])
            .await
        {
            Ok(d) => d,
            Err(e) => {
                log::warn!("rxnorm: interactions for {} failed: {}", rxcui, e);
                return Vec::new();
            }
        };
        data.interaction_type_group
            .into_iter()
            .flat_map(|g| g.interaction_type)
            .flat_map(|t| t.interaction_pair)
            .map(|pair| DrugInteraction {
                drug: pair
                    .interaction_concept
                    .get(1)
                    .and_then(|c| c.min_concept_item.as_ref())
                    .and_then(|i| i.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                severity: pair.severity.unwrap_or_else(|| "Unknown".to_string()),
                description: pair
                    .description
                    .unwrap_or_else(|| "No description available".to_string()),
            })
            .take(MAX_INTERACTIONS)
            .collect()
    }

    async fn related(&self, rxcui: &str, tty: &str) -> Vec<RelatedDrug> {
        let path = format!("rxcui/{}/related.json", rxcui);
        let data: RelatedResponse = match self.get_json(&path, &[("tty", tty)]).await {
            Ok(d) => d,
            Err(e) => {
                log::warn!("rxnorm: related {} for {} failed: {}", tty, rxcui, e);
                return Vec::new();
            }
        };
        data.related_group
            .map(|g| g.concept_group)
            .unwrap_or_default()
            .into_iter()
            .flat_map(|g| g.concept_properties)
            .map(|p| RelatedDrug {
                rxcui: p.rxcui.unwrap_or_default(),
                name: p.name.unwrap_or_default(),
                tty: p.tty,
            })
            .collect()
    }
}

// --- wire types ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrugsResponse {
    drug_group: Option<ConceptGroups>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelatedResponse {
    related_group: Option<ConceptGroups>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConceptGroups {
    #[serde(default)]
    concept_group: Vec<ConceptGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConceptGroup {
    #[serde(default)]
    concept_properties: Vec<ConceptProperties>,
}

#[derive(Debug, Deserialize)]
struct ConceptProperties {
    rxcui: Option<String>,
    name: Option<String>,
    synonym: Option<String>,
    tty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PropertiesResponse {
    properties: Option<ConceptProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionResponse {
    #[serde(default)]
    interaction_type_group: Vec<InteractionTypeGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionTypeGroup {
    #[serde(default)]
    interaction_type: Vec<InteractionType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionType {
    #[serde(default)]
    interaction_pair: Vec<InteractionPair>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionPair {
    #[serde(default)]
    interaction_concept: Vec<InteractionConcept>,
    severity: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionConcept {
    min_concept_item: Option<MinConceptItem>,
}

#[derive(Debug, Deserialize)]
struct MinConceptItem {
    name: Option<String>,
}
