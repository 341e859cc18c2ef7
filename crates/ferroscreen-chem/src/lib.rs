//! FerroScreen Chem - small-molecule handling for the screening pipeline.
//!
//! This crate covers everything downstream of data retrieval:
//! 1. Parsing SMILES into a molecular graph
//! 2. Ring and aromaticity perception
//! 3. Descriptor calculation (exact mass, H-bond donors/acceptors, logP, ...)
//! 4. Rule-based drug-likeness filtering (Rule of Five, soft REOS, custom)
//! 5. Fingerprint encoding, in batch or as a chunked CSV export
//! 6. Summary statistics over computed properties

pub mod element;
pub mod molecule;
pub mod smiles;
pub mod rings;
pub mod descriptors;
pub mod filters;
pub mod fingerprints;
pub mod stats;

pub use descriptors::{append_descriptors, Descriptors, DESCRIPTOR_COLUMNS};
pub use filters::{
    from_fn, FilterEngine, FilterVerdict, Measurement, PropertyEvaluator, RuleName, RuleOfFive, SoftReos,
};
pub use fingerprints::{
    encode, encode_batch, encode_batch_streaming, ExportProgress, ExportSummary, FingerprintScheme,
};
pub use molecule::Molecule;
pub use smiles::{parse_smiles, SmilesError};
pub use stats::{describe, scale_by_thresholds, PropertyStats};
