//! Data models for the data-request pipeline.
//!
//! Raw registry records (`TargetRecord`, `BioactivityRecord`,
//! `StructureRecord`) deserialize straight from ChEMBL JSON and keep every
//! field optional. The cleaned and merged records are what the pipeline
//! stages hand to each other.

use serde::{Deserialize, Deserializer, Serialize};

/// A ChEMBL target matching an accession.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub target_chembl_id: String,
    #[serde(default)]
    pub organism: Option<String>,
    #[serde(default)]
    pub pref_name: Option<String>,
    #[serde(default)]
    pub target_type: Option<String>,
}

/// One assay measurement as served by the registry. Unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BioactivityRecord {
    pub activity_id: Option<i64>,
    pub assay_chembl_id: Option<String>,
    pub assay_description: Option<String>,
    pub assay_type: Option<String>,
    pub molecule_chembl_id: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub standard_units: Option<String>,
    pub relation: Option<String>,
    /// Served as a string; numbers are accepted and kept as text.
    #[serde(deserialize_with = "string_or_number")]
    pub standard_value: Option<String>,
    pub target_chembl_id: Option<String>,
    pub target_organism: Option<String>,

    // Legacy pair superseded by standard_units / standard_value.
    pub units: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub value: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// A bioactivity row that survived cleaning: nanomolar IC50, exact
/// relation, one row per compound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanBioactivityRecord {
    pub compound_id: String,
    /// IC50 in nM
    pub ic50: f64,
    pub units: String,
    pub assay_chembl_id: Option<String>,
    pub assay_type: Option<String>,
    pub relation: Option<String>,
    pub target_chembl_id: Option<String>,
}

/// A compound as returned by the structure endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub molecule_chembl_id: String,
    /// Opaque mapping; `canonical_smiles` is the only key we read.
    #[serde(default)]
    pub molecule_structures: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStructure {
    pub compound_id: String,
    pub smiles: Option<String>,
}

/// Final pipeline output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningRecord {
    pub compound_id: String,
    pub smiles: String,
    #[serde(rename = "pIC50")]
    pub pic50: f64,
}

/// Fixed filter parameters for bioactivity retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityQuery {
    pub target_chembl_id: String,
    pub activity_type: String,
    pub relation: String,
    pub assay_type: String,
}

impl ActivityQuery {
    /// IC50 values with an exact relation from binding ("B") assays.
    pub fn ic50_binding(target_chembl_id: impl Into<String>) -> Self {
        Self {
            target_chembl_id: target_chembl_id.into(),
            activity_type: "IC50".to_string(),
            relation: "=".to_string(),
            assay_type: "B".to_string(),
        }
    }
}
