//! Bioactivity cleaning.
//!
//! Keeps one nanomolar, exact-relation IC50 per compound. Per-row problems
//! (unparseable value, other units, missing or inexact relation, missing
//! compound id) drop the row; only a
//! required field absent from the whole batch fails the step.

use std::collections::HashSet;

use tracing::{debug, info};

use ferroscreen_common::ScreenError;

use crate::models::{BioactivityRecord, CleanBioactivityRecord};

const NANOMOLAR: &str = "nM";
const EXACT_RELATION: &str = "=";

const REQUIRED_FIELDS: [&str; 3] = ["molecule_chembl_id", "standard_value", "standard_units"];

fn has_field(record: &BioactivityRecord, name: &str) -> bool {
    match name {
        "molecule_chembl_id" => record.molecule_chembl_id.is_some(),
        "standard_value" => record.standard_value.is_some(),
        "standard_units" => record.standard_units.is_some(),
        _ => false,
    }
}

pub fn clean(records: &[BioactivityRecord]) -> Result<Vec<CleanBioactivityRecord>, ScreenError> {
    if records.is_empty() {
        return Ok(Vec::new());
    }
    for name in REQUIRED_FIELDS {
        if !records.iter().any(|r| has_field(r, name)) {
            return Err(ScreenError::Cleaning(format!(
                "missing expected column '{name}' in {} bioactivity records",
                records.len()
            )));
        }
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let (mut bad_value, mut other_unit, mut inexact, mut duplicate) = (0usize, 0usize, 0usize, 0usize);

    for record in records {
        let Some(compound_id) = record.molecule_chembl_id.as_deref() else {
            continue;
        };
        let Some(ic50) = record
            .standard_value
            .as_deref()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| !v.is_nan())
        else {
            bad_value += 1;
            continue;
        };
        if record.standard_units.as_deref() != Some(NANOMOLAR) {
            other_unit += 1;
            continue;
        }
        if record.relation.as_deref() != Some(EXACT_RELATION) {
            inexact += 1;
            continue;
        }
        if !seen.insert(compound_id) {
            duplicate += 1;
            continue;
        }
        out.push(CleanBioactivityRecord {
            compound_id: compound_id.to_string(),
            ic50,
            units: NANOMOLAR.to_string(),
            assay_chembl_id: record.assay_chembl_id.clone(),
            assay_type: record.assay_type.clone(),
            relation: Some(EXACT_RELATION.to_string()),
            target_chembl_id: record.target_chembl_id.clone(),
        });
    }

    debug!(bad_value, other_unit, inexact, duplicate, "Dropped bioactivity rows");
    info!(input = records.len(), kept = out.len(), "Bioactivity data cleaned");
    Ok(out)
}
