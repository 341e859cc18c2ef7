//! End-to-end data-request pipeline.
//!
//! Orchestrates one run for a single UniProt accession:
//!   1. Resolve the accession to a ChEMBL target (by selection index)
//!   2. Retrieve IC50 binding-assay activities for the target
//!   3. Clean them (nM only, exact relation, one row per compound)
//!   4. Fetch structures for the surviving compound ids
//!   5. Normalise structures to canonical SMILES
//!   6. Inner-join activities and structures on compound id
//!   7. Convert IC50 to pIC50 and rank, most potent first
//!
//! Each stage is a prerequisite for the next. `run` never fails: a stage
//! error is logged and reported alongside an empty record set. Progress
//! events go out on an optional broadcast channel.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use ferroscreen_common::{ScreenError, Table, Value};

use crate::clean::clean;
use crate::models::{ActivityQuery, CleanBioactivityRecord, NormalizedStructure, ScreeningRecord, TargetRecord};
use crate::normalise::normalize;
use crate::potency;
use crate::sources::chembl::ChemblClient;
use crate::sources::{BioactivitySource, StructureSource, TargetSource};

lazy_static! {
    // UniProtKB accession format
    static ref ACCESSION_RE: Regex =
        Regex::new(r"^([OPQ][0-9][A-Z0-9]{3}[0-9]|[A-NR-Z][0-9]([A-Z][A-Z0-9]{2}[0-9]){1,2})$")
            .expect("valid accession regex");
}

// ── Stages and errors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Resolve,
    Retrieve,
    Clean,
    FetchStructures,
    Normalise,
    Merge,
    Convert,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Resolve => "resolve",
            PipelineStage::Retrieve => "retrieve",
            PipelineStage::Clean => "clean",
            PipelineStage::FetchStructures => "fetch_structures",
            PipelineStage::Normalise => "normalise",
            PipelineStage::Merge => "merge",
            PipelineStage::Convert => "convert",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage failure, tagged with the stage that raised it.
#[derive(Debug, Error)]
#[error("pipeline stage '{stage}' failed: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    #[source]
    pub source: ScreenError,
}

trait StageContext<T> {
    fn at(self, stage: PipelineStage) -> Result<T, PipelineError>;
}

impl<T> StageContext<T> for Result<T, ScreenError> {
    fn at(self, stage: PipelineStage) -> Result<T, PipelineError> {
        self.map_err(|source| PipelineError { stage, source })
    }
}

// ── Progress events ───────────────────────────────────────────────────────────

/// Progress event emitted during a pipeline run (cloneable for broadcast).
#[derive(Debug, Clone, Serialize)]
pub struct PipelineProgress {
    pub run_id: Uuid,
    pub stage: PipelineStage,
    pub message: String,
    pub rows: usize,
}

// ── Result summary ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub accession: String,
    pub target: Option<TargetRecord>,
    /// Sorted by pIC50, descending. Empty whenever `error` is set.
    pub records: Vec<ScreeningRecord>,
    pub error: Option<PipelineError>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn failed_stage(&self) -> Option<PipelineStage> {
        self.error.as_ref().map(|e| e.stage)
    }
}

// ── Pipeline orchestrator ─────────────────────────────────────────────────────

pub struct DataRequestPipeline {
    targets: Arc<dyn TargetSource>,
    bioactivities: Arc<dyn BioactivitySource>,
    structures: Arc<dyn StructureSource>,
    selection_index: usize,
    progress_tx: Option<broadcast::Sender<PipelineProgress>>,
}

impl DataRequestPipeline {
    pub fn new(
        targets: Arc<dyn TargetSource>,
        bioactivities: Arc<dyn BioactivitySource>,
        structures: Arc<dyn StructureSource>,
    ) -> Self {
        Self {
            targets,
            bioactivities,
            structures,
            selection_index: 0,
            progress_tx: None,
        }
    }

    /// All three collaborators served by one ChEMBL client.
    pub fn chembl(client: ChemblClient) -> Self {
        let client = Arc::new(client);
        Self::new(client.clone(), client.clone(), client)
    }

    /// Which of several matching targets to use (default: the first).
    pub fn with_selection_index(mut self, index: usize) -> Self {
        self.selection_index = index;
        self
    }

    pub fn with_progress(mut self, tx: broadcast::Sender<PipelineProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Run every stage. Never fails; see [`PipelineReport::error`].
    #[instrument(skip(self))]
    pub async fn run(&self, accession: &str) -> PipelineReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let t0 = std::time::Instant::now();
        let mut target = None;

        let outcome = self.execute(run_id, accession, &mut target).await;
        let duration_ms = t0.elapsed().as_millis() as u64;

        let (records, error) = match outcome {
            Ok(records) => {
                info!(run_id = %run_id, accession, n = records.len(), duration_ms, "Pipeline complete");
                (records, None)
            }
            Err(e) => {
                error!(run_id = %run_id, accession, stage = %e.stage, error = %e.source, "Pipeline failed");
                self.emit(run_id, e.stage, format!("failed: {}", e.source), 0);
                (Vec::new(), Some(e))
            }
        };

        PipelineReport {
            run_id,
            accession: accession.to_string(),
            target,
            records,
            error,
            started_at,
            duration_ms,
        }
    }

    /// Like [`run`](Self::run) but hands the stage error to the caller.
    pub async fn try_run(&self, accession: &str) -> Result<Vec<ScreeningRecord>, PipelineError> {
        let mut target = None;
        self.execute(Uuid::new_v4(), accession, &mut target).await
    }

    async fn execute(
        &self,
        run_id: Uuid,
        accession: &str,
        target_out: &mut Option<TargetRecord>,
    ) -> Result<Vec<ScreeningRecord>, PipelineError> {
        info!(run_id = %run_id, accession, "Starting data-request pipeline");

        // ── 1. Resolve ────────────────────────────────────────────────────────
        let accession = validate_accession(accession).at(PipelineStage::Resolve)?;
        let target = self.resolve(accession).await.at(PipelineStage::Resolve)?;
        info!(target = %target.target_chembl_id, pref_name = ?target.pref_name, "Target selected");
        self.emit(run_id, PipelineStage::Resolve, format!("target {}", target.target_chembl_id), 1);
        let query = ActivityQuery::ic50_binding(&target.target_chembl_id);
        *target_out = Some(target);

        // ── 2. Retrieve ───────────────────────────────────────────────────────
        let raw = self.bioactivities.bioactivities(&query).await.at(PipelineStage::Retrieve)?;
        self.emit(run_id, PipelineStage::Retrieve, "bioactivities retrieved".into(), raw.len());

        // ── 3. Clean ──────────────────────────────────────────────────────────
        let cleaned = clean(&raw).at(PipelineStage::Clean)?;
        self.emit(run_id, PipelineStage::Clean, "bioactivities cleaned".into(), cleaned.len());

        // ── 4. Fetch structures ───────────────────────────────────────────────
        let ids: Vec<String> = cleaned.iter().map(|r| r.compound_id.clone()).collect();
        let structures = if ids.is_empty() {
            Vec::new()
        } else {
            self.structures.structures(&ids).await.at(PipelineStage::FetchStructures)?
        };
        self.emit(run_id, PipelineStage::FetchStructures, "structures retrieved".into(), structures.len());

        // ── 5. Normalise ──────────────────────────────────────────────────────
        let normalized = normalize(&structures);
        self.emit(run_id, PipelineStage::Normalise, "canonical SMILES extracted".into(), normalized.len());

        // ── 6. Merge ──────────────────────────────────────────────────────────
        let merged = merge(&cleaned, &normalized);
        info!(n = merged.len(), "Merged bioactivity and compound data");
        self.emit(run_id, PipelineStage::Merge, "inner join on compound id".into(), merged.len());

        // ── 7. Convert and rank ───────────────────────────────────────────────
        let records = rank(merged);
        self.emit(run_id, PipelineStage::Convert, "pIC50 computed".into(), records.len());
        Ok(records)
    }

    async fn resolve(&self, accession: &str) -> Result<TargetRecord, ScreenError> {
        let mut targets = self.targets.targets_for_accession(accession).await?;
        if targets.is_empty() {
            return Err(ScreenError::TargetNotFound(accession.to_string()));
        }
        if self.selection_index >= targets.len() {
            return Err(ScreenError::Validation(format!(
                "selection index {} is out of bounds for {} targets matching {accession}",
                self.selection_index,
                targets.len()
            )));
        }
        Ok(targets.swap_remove(self.selection_index))
    }

    fn emit(&self, run_id: Uuid, stage: PipelineStage, message: String, rows: usize) {
        if let Some(ref tx) = self.progress_tx {
            let _ = tx.send(PipelineProgress { run_id, stage, message, rows });
        }
    }
}

fn validate_accession(accession: &str) -> Result<&str, ScreenError> {
    let accession = accession.trim();
    if accession.is_empty() {
        return Err(ScreenError::Validation("The UniProt accession must not be empty.".into()));
    }
    if !ACCESSION_RE.is_match(accession) {
        return Err(ScreenError::Validation(format!("'{accession}' is not a UniProt accession.")));
    }
    Ok(accession)
}

/// Inner join on compound id, in bioactivity order.
fn merge<'a>(
    bioactivities: &'a [CleanBioactivityRecord],
    structures: &'a [NormalizedStructure],
) -> Vec<(&'a CleanBioactivityRecord, &'a str)> {
    let by_id: HashMap<&str, &str> = structures
        .iter()
        .filter_map(|s| Some((s.compound_id.as_str(), s.smiles.as_deref()?)))
        .collect();
    bioactivities
        .iter()
        .filter_map(|b| by_id.get(b.compound_id.as_str()).map(|smiles| (b, *smiles)))
        .collect()
}

/// pIC50 per merged row; failed conversions are dropped. Stable sort, most
/// potent first.
fn rank(merged: Vec<(&CleanBioactivityRecord, &str)>) -> Vec<ScreeningRecord> {
    let mut records: Vec<ScreeningRecord> = merged
        .into_iter()
        .filter_map(|(activity, smiles)| match potency::convert(activity.ic50) {
            Ok(pic50) => Some(ScreeningRecord {
                compound_id: activity.compound_id.clone(),
                smiles: smiles.to_string(),
                pic50,
            }),
            Err(e) => {
                debug!(compound_id = %activity.compound_id, ic50 = activity.ic50, error = %e, "Dropping row");
                None
            }
        })
        .collect();
    records.sort_by(|a, b| b.pic50.total_cmp(&a.pic50));
    records
}

/// Pipeline output as a table with columns `compound_id, smiles, pIC50`.
pub fn screening_table(records: &[ScreeningRecord]) -> Result<Table, ScreenError> {
    Table::from_rows(
        ["compound_id", "smiles", "pIC50"],
        records
            .iter()
            .map(|r| {
                vec![
                    Value::Text(r.compound_id.clone()),
                    Value::Text(r.smiles.clone()),
                    Value::Float(r.pic50),
                ]
            })
            .collect(),
    )
}
