//! ChEMBL REST client.
//!
//! Implements all three registry collaborators against the ChEMBL web
//! services:
//!   - `/target.json`    targets by UniProt accession
//!   - `/activity.json`  IC50 binding-assay activities for a target
//!   - `/molecule.json`  structures for batches of compound ids
//!
//! API docs: https://chembl.gitbook.io/chembl-interface-documentation/web-resources/chembl-api
//!
//! Every listing is paginated; the client follows `page_meta.next` until it
//! is null. Each page request goes through the configured [`RetryPolicy`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};
use url::Url;

use ferroscreen_common::sandbox::SandboxClient as Client;
use ferroscreen_common::{RetrievalConfig, ScreenError};

use super::{BioactivitySource, StructureSource, TargetSource};
use crate::models::{ActivityQuery, BioactivityRecord, StructureRecord, TargetRecord};
use crate::retry::RetryPolicy;

const ACTIVITY_FIELDS: &str = "activity_id,assay_chembl_id,assay_description,assay_type,\
molecule_chembl_id,type,standard_units,relation,standard_value,target_chembl_id,target_organism";
const TARGET_FIELDS: &str = "target_chembl_id,organism,pref_name,target_type";
const MOLECULE_FIELDS: &str = "molecule_chembl_id,molecule_structures";

/// ChEMBL client for targets, activities and structures.
pub struct ChemblClient {
    client: Client,
    base_url: String,
    page_size: usize,
    batch_size: usize,
    retry: RetryPolicy,
}

impl ChemblClient {
    /// Client for the public ChEMBL endpoint with default retry settings.
    pub fn new() -> Result<Self, ScreenError> {
        Self::from_config(&RetrievalConfig::default())
    }

    pub fn from_config(cfg: &RetrievalConfig) -> Result<Self, ScreenError> {
        if cfg.page_size == 0 || cfg.structure_batch_size == 0 {
            return Err(ScreenError::Validation(
                "page_size and structure_batch_size must be positive integers".into(),
            ));
        }
        let mut client = Client::with_timeout(cfg.timeout())?;
        client.allow_url_host(&cfg.base_url)?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            page_size: cfg.page_size,
            batch_size: cfg.structure_batch_size,
            retry: RetryPolicy::from_config(cfg)?,
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One GET with retries, decoded as JSON. 4xx responses are permanent.
    async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<serde_json::Value, ScreenError> {
        let client = &self.client;
        self.retry
            .run(url, || async move {
                let resp = client.get(url)?.query(params).send().await?.error_for_status()?;
                let json: serde_json::Value = resp.json().await?;
                Ok::<_, ScreenError>(json)
            })
            .await
    }

    /// Fetch every page of a listing endpoint and decode the `key` array.
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        key: &str,
        mut params: Vec<(&str, String)>,
    ) -> Result<Vec<T>, ScreenError> {
        params.push(("limit", self.page_size.to_string()));
        params.push(("format", "json".to_string()));

        let mut url = format!("{}/{}", self.base_url, endpoint);
        let mut out = Vec::new();
        let mut page = 0usize;

        loop {
            // the next link already carries the full query
            let query: &[(&str, String)] = if page == 0 { &params } else { &[] };
            let json = self.get_json(&url, query).await?;
            let records: Vec<T> = parse_page(&json, key)?;
            page += 1;
            debug!(endpoint, page, n = records.len(), "Fetched ChEMBL page");
            out.extend(records);

            match next_page_url(&self.base_url, &json)? {
                Some(next) => url = next,
                None => break,
            }
        }
        Ok(out)
    }
}

/// Decode the record array under `key`; a missing array is an empty page.
fn parse_page<T: DeserializeOwned>(json: &serde_json::Value, key: &str) -> Result<Vec<T>, ScreenError> {
    match json.get(key) {
        Some(arr) if arr.is_array() => Ok(serde_json::from_value(arr.clone())?),
        _ => Ok(Vec::new()),
    }
}

/// Absolute URL of the next page, if any. ChEMBL serves it as a path
/// relative to the host.
fn next_page_url(base_url: &str, json: &serde_json::Value) -> Result<Option<String>, ScreenError> {
    let Some(next) = json["page_meta"]["next"].as_str() else {
        return Ok(None);
    };
    let base = Url::parse(base_url).map_err(|e| ScreenError::Config(format!("Invalid base URL {base_url}: {e}")))?;
    let url = base
        .join(next)
        .map_err(|e| ScreenError::Retrieval(format!("Invalid next page link {next}: {e}")))?;
    Ok(Some(url.to_string()))
}

#[async_trait]
impl TargetSource for ChemblClient {
    #[instrument(skip(self))]
    async fn targets_for_accession(&self, accession: &str) -> Result<Vec<TargetRecord>, ScreenError> {
        debug!(accession, "Fetching ChEMBL targets");
        let params = vec![
            ("target_components__accession", accession.to_string()),
            ("only", TARGET_FIELDS.to_string()),
        ];
        let targets: Vec<TargetRecord> = self.fetch_all("target.json", "targets", params).await?;
        info!(accession, n = targets.len(), "Targets resolved");
        Ok(targets)
    }
}

#[async_trait]
impl BioactivitySource for ChemblClient {
    #[instrument(skip(self))]
    async fn bioactivities(&self, query: &ActivityQuery) -> Result<Vec<BioactivityRecord>, ScreenError> {
        debug!(target = %query.target_chembl_id, "Fetching target activities");
        let params = vec![
            ("target_chembl_id", query.target_chembl_id.clone()),
            ("type", query.activity_type.clone()),
            ("relation", query.relation.clone()),
            ("assay_type", query.assay_type.clone()),
            ("only", ACTIVITY_FIELDS.to_string()),
        ];
        let activities: Vec<BioactivityRecord> = self.fetch_all("activity.json", "activities", params).await?;
        info!(target = %query.target_chembl_id, n = activities.len(), "Bioactivity data retrieved");
        Ok(activities)
    }
}

#[async_trait]
impl StructureSource for ChemblClient {
    #[instrument(skip(self, compound_ids), fields(n = compound_ids.len()))]
    async fn structures(&self, compound_ids: &[String]) -> Result<Vec<StructureRecord>, ScreenError> {
        let mut out = Vec::with_capacity(compound_ids.len());
        for (i, batch) in compound_ids.chunks(self.batch_size).enumerate() {
            debug!(batch = i, size = batch.len(), "Fetching compound structures");
            let params = vec![
                ("molecule_chembl_id__in", batch.join(",")),
                ("only", MOLECULE_FIELDS.to_string()),
            ];
            let records: Vec<StructureRecord> = self.fetch_all("molecule.json", "molecules", params).await?;
            out.extend(records);
        }
        info!(requested = compound_ids.len(), n = out.len(), "Compound data retrieved");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_client_from_default_config() {
        let client = ChemblClient::new().unwrap();
        assert_eq!(client.base_url(), "https://www.ebi.ac.uk/chembl/api/data");
        assert!(client.client.is_allowed("https://www.ebi.ac.uk/chembl/api/data/activity.json"));
    }

    #[test]
    fn test_mirror_host_is_allowed() {
        let cfg = RetrievalConfig {
            base_url: "http://chembl.internal.lab:8080/api/data/".into(),
            ..Default::default()
        };
        let client = ChemblClient::from_config(&cfg).unwrap();
        assert_eq!(client.base_url(), "http://chembl.internal.lab:8080/api/data");
        assert!(client.client.is_allowed("http://chembl.internal.lab:8080/api/data/target.json"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let cfg = RetrievalConfig { structure_batch_size: 0, ..Default::default() };
        assert!(matches!(ChemblClient::from_config(&cfg), Err(ScreenError::Validation(_))));
    }

    #[test]
    fn test_next_page_url_resolves_host_relative_link() {
        let page = json!({
            "page_meta": { "next": "/chembl/api/data/activity.json?limit=1000&offset=1000", "total_count": 2400 }
        });
        let next = next_page_url("https://www.ebi.ac.uk/chembl/api/data", &page).unwrap();
        assert_eq!(
            next.as_deref(),
            Some("https://www.ebi.ac.uk/chembl/api/data/activity.json?limit=1000&offset=1000")
        );

        let last = json!({ "page_meta": { "next": null } });
        assert_eq!(next_page_url("https://www.ebi.ac.uk/chembl/api/data", &last).unwrap(), None);
    }

    #[test]
    fn test_parse_target_page() {
        let page = json!({
            "page_meta": { "next": null },
            "targets": [
                { "target_chembl_id": "CHEMBL203", "organism": "Homo sapiens",
                  "pref_name": "Epidermal growth factor receptor erbB1", "target_type": "SINGLE PROTEIN" },
                { "target_chembl_id": "CHEMBL2111431", "organism": "Homo sapiens",
                  "pref_name": "Epidermal growth factor receptor", "target_type": "PROTEIN FAMILY" }
            ]
        });
        let targets: Vec<TargetRecord> = parse_page(&page, "targets").unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].target_chembl_id, "CHEMBL203");
        assert_eq!(targets[1].target_type.as_deref(), Some("PROTEIN FAMILY"));
    }

    #[test]
    fn test_parse_molecule_page_and_missing_key() {
        let page = json!({
            "molecules": [
                { "molecule_chembl_id": "CHEMBL25",
                  "molecule_structures": { "canonical_smiles": "CC(=O)Oc1ccccc1C(=O)O" } },
                { "molecule_chembl_id": "CHEMBL1201", "molecule_structures": null }
            ]
        });
        let molecules: Vec<StructureRecord> = parse_page(&page, "molecules").unwrap();
        assert_eq!(molecules.len(), 2);
        assert!(molecules[1].molecule_structures.is_none());

        let empty: Vec<StructureRecord> = parse_page(&json!({}), "molecules").unwrap();
        assert!(empty.is_empty());
    }
}
