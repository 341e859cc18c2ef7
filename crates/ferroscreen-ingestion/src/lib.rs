//! ferroscreen-ingestion: Bioactivity data-request pipeline.
//! Turns a UniProt accession into a ranked potency table:
//! - Target resolution against ChEMBL
//! - IC50 binding-assay retrieval with bounded retries
//! - Bioactivity cleaning and structure normalisation
//! - Inner join and pIC50 conversion

pub mod clean;
pub mod models;
pub mod normalise;
pub mod pipeline;
pub mod potency;
pub mod retry;
pub mod sources;

pub use clean::clean;
pub use models::{
    ActivityQuery, BioactivityRecord, CleanBioactivityRecord, NormalizedStructure, ScreeningRecord,
    StructureRecord, TargetRecord,
};
pub use normalise::{extract, normalize};
pub use pipeline::{
    screening_table, DataRequestPipeline, PipelineError, PipelineProgress, PipelineReport, PipelineStage,
};
pub use potency::{convert, convert_with_unit, parse_and_convert, ConcentrationUnit};
pub use retry::RetryPolicy;
pub use sources::chembl::ChemblClient;
pub use sources::{BioactivitySource, StructureSource, TargetSource};
