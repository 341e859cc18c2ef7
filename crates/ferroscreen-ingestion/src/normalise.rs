//! Structure normalisation.
//!
//! Pulls `molecule_structures.canonical_smiles` out of each structure record.
//! Not every compound carries a structure; those come back as `None` from
//! [`extract`] and are dropped by [`normalize`].

use std::collections::HashSet;

use tracing::{debug, info};

use crate::models::{NormalizedStructure, StructureRecord};

/// Canonical SMILES for one record, or `None` when the field is missing.
pub fn extract(record: &StructureRecord) -> NormalizedStructure {
    let smiles = record
        .molecule_structures
        .as_ref()
        .and_then(|s| s.get("canonical_smiles"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    if smiles.is_none() {
        debug!(compound_id = %record.molecule_chembl_id, "No canonical SMILES");
    }
    NormalizedStructure {
        compound_id: record.molecule_chembl_id.clone(),
        smiles,
    }
}

/// Extract every record, then drop absent structures and repeated compound
/// ids (first wins).
pub fn normalize(records: &[StructureRecord]) -> Vec<NormalizedStructure> {
    let mut seen = HashSet::new();
    let out: Vec<NormalizedStructure> = records
        .iter()
        .map(extract)
        .filter(|s| s.smiles.is_some())
        .filter(|s| seen.insert(s.compound_id.clone()))
        .collect();
    info!(input = records.len(), kept = out.len(), "Canonical SMILES extracted");
    out
}
