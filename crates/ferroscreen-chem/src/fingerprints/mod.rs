//! Fixed-length fingerprint encodings.
//!
//! Supported schemes:
//!   - `Morgan`       hashed circular substructures (radius, n_bits)
//!   - `AtomPair`     hashed atom pairs with topological distance (n_bits)
//!   - `Topological`  hashed linear bond paths (max_path, n_bits)
//!   - `Maccs`        166 structural keys, 167 bits with bit 0 unused
//!
//! `encode` never fails: an unparseable structure yields a zero vector of
//! the scheme's length so batch jobs carry on without per-row handling.

mod atom_pair;
mod export;
mod hashing;
mod maccs;
mod morgan;
mod topological;

pub use export::{encode_batch_streaming, ExportProgress, ExportSummary};
pub use maccs::MACCS_LEN;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ferroscreen_common::{FingerprintConfig, ScreenError, Table, Value};

use crate::molecule::Molecule;
use crate::smiles::parse_smiles;

pub const DEFAULT_MORGAN_RADIUS: u32 = 2;
pub const DEFAULT_MORGAN_BITS: usize = 1024;
pub const DEFAULT_ATOM_PAIR_BITS: usize = 2048;
pub const DEFAULT_PATH_BITS: usize = 2048;
pub const DEFAULT_MAX_PATH: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum FingerprintScheme {
    Morgan { radius: u32, n_bits: usize },
    AtomPair { n_bits: usize },
    Topological { max_path: usize, n_bits: usize },
    Maccs,
}

impl Default for FingerprintScheme {
    fn default() -> Self {
        FingerprintScheme::Morgan {
            radius: DEFAULT_MORGAN_RADIUS,
            n_bits: DEFAULT_MORGAN_BITS,
        }
    }
}

impl FingerprintScheme {
    /// Build a scheme from configuration, filling in per-scheme defaults.
    pub fn from_config(cfg: &FingerprintConfig) -> Result<Self, ScreenError> {
        let scheme = match cfg.scheme.trim().to_lowercase().as_str() {
            "morgan" | "ecfp" => FingerprintScheme::Morgan {
                radius: cfg.radius,
                n_bits: cfg.n_bits.unwrap_or(DEFAULT_MORGAN_BITS),
            },
            "atom_pair" | "atompair" => FingerprintScheme::AtomPair {
                n_bits: cfg.n_bits.unwrap_or(DEFAULT_ATOM_PAIR_BITS),
            },
            "topological" | "rdkit" | "path" => FingerprintScheme::Topological {
                max_path: cfg.max_path,
                n_bits: cfg.n_bits.unwrap_or(DEFAULT_PATH_BITS),
            },
            "maccs" => FingerprintScheme::Maccs,
            other => {
                return Err(ScreenError::Validation(format!(
                    "Unknown fingerprint scheme '{other}'. Supported schemes are: morgan, atom_pair, topological, maccs."
                )))
            }
        };
        scheme.validate()?;
        Ok(scheme)
    }

    pub fn validate(&self) -> Result<(), ScreenError> {
        match *self {
            FingerprintScheme::Morgan { n_bits: 0, .. }
            | FingerprintScheme::AtomPair { n_bits: 0 }
            | FingerprintScheme::Topological { n_bits: 0, .. } => {
                Err(ScreenError::Validation("n_bits must be a positive integer".into()))
            }
            FingerprintScheme::Topological { max_path: 0, .. } => {
                Err(ScreenError::Validation("max_path must be a positive integer".into()))
            }
            _ => Ok(()),
        }
    }

    /// Vector length this scheme always produces.
    pub fn len(&self) -> usize {
        match *self {
            FingerprintScheme::Morgan { n_bits, .. }
            | FingerprintScheme::AtomPair { n_bits }
            | FingerprintScheme::Topological { n_bits, .. } => n_bits,
            FingerprintScheme::Maccs => MACCS_LEN,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FingerprintScheme::Morgan { .. } => "morgan",
            FingerprintScheme::AtomPair { .. } => "atom_pair",
            FingerprintScheme::Topological { .. } => "topological",
            FingerprintScheme::Maccs => "maccs",
        }
    }

    /// `fp_0 .. fp_{len-1}`.
    pub fn column_names(&self) -> Vec<String> {
        (0..self.len()).map(|i| format!("fp_{i}")).collect()
    }
}

pub fn encode_molecule(mol: &Molecule, scheme: FingerprintScheme) -> Vec<u8> {
    match scheme {
        FingerprintScheme::Morgan { radius, n_bits } => morgan::encode(mol, radius, n_bits),
        FingerprintScheme::AtomPair { n_bits } => atom_pair::encode(mol, n_bits),
        FingerprintScheme::Topological { max_path, n_bits } => topological::encode(mol, max_path, n_bits),
        FingerprintScheme::Maccs => maccs::encode(mol),
    }
}

/// Encode one SMILES string. Unparseable input gives an all-zero vector.
pub fn encode(smiles: &str, scheme: FingerprintScheme) -> Vec<u8> {
    match parse_smiles(smiles) {
        Ok(mol) => encode_molecule(&mol, scheme),
        Err(e) => {
            debug!(smiles, error = %e, scheme = scheme.name(), "Unparseable structure, emitting zero vector");
            vec![0; scheme.len()]
        }
    }
}

fn bits_to_values(bits: Vec<u8>) -> Vec<Value> {
    bits.into_iter().map(|b| Value::Int(b as i64)).collect()
}

/// Append `fp_0..fp_{n-1}` to every row of `table`. Cells that are missing
/// or not text encode like unparseable structures.
pub fn encode_batch(table: &Table, scheme: FingerprintScheme, structure_field: &str) -> Result<Table, ScreenError> {
    scheme.validate()?;
    let col = table.require_column(structure_field)?;
    let values: Vec<Vec<Value>> = table
        .rows()
        .iter()
        .map(|row| {
            let bits = match row[col].as_str() {
                Some(smiles) => encode(smiles, scheme),
                None => vec![0; scheme.len()],
            };
            bits_to_values(bits)
        })
        .collect();
    table.with_columns(&scheme.column_names(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn all_schemes() -> Vec<FingerprintScheme> {
        vec![
            FingerprintScheme::default(),
            FingerprintScheme::AtomPair { n_bits: DEFAULT_ATOM_PAIR_BITS },
            FingerprintScheme::Topological { max_path: DEFAULT_MAX_PATH, n_bits: DEFAULT_PATH_BITS },
            FingerprintScheme::Maccs,
        ]
    }

    #[test]
    fn test_invalid_structure_gives_zero_vector() {
        for scheme in all_schemes() {
            let fp = encode("not_a_smiles(", scheme);
            assert_eq!(fp.len(), scheme.len());
            assert!(fp.iter().all(|&b| b == 0), "{} not all zero", scheme.name());
        }
    }

    #[test]
    fn test_valid_structure_sets_bits() {
        for scheme in all_schemes() {
            let fp = encode("CC(=O)Oc1ccccc1C(=O)O", scheme);
            assert_eq!(fp.len(), scheme.len());
            assert!(fp.iter().any(|&b| b == 1), "{} all zero", scheme.name());
        }
    }

    #[test]
    fn test_lengths() {
        assert_eq!(FingerprintScheme::default().len(), 1024);
        assert_eq!(FingerprintScheme::Maccs.len(), 167);
    }

    #[test]
    fn test_from_config() {
        let mut cfg = FingerprintConfig::default();
        assert_eq!(
            FingerprintScheme::from_config(&cfg).unwrap(),
            FingerprintScheme::Morgan { radius: 2, n_bits: 1024 }
        );

        cfg.scheme = "atom_pair".into();
        assert_eq!(FingerprintScheme::from_config(&cfg).unwrap().len(), 2048);

        cfg.scheme = "maccs".into();
        cfg.n_bits = Some(4096);
        assert_eq!(FingerprintScheme::from_config(&cfg).unwrap().len(), 167);

        cfg.scheme = "pubchem".into();
        assert!(FingerprintScheme::from_config(&cfg).is_err());
    }

    #[test]
    fn test_zero_bits_rejected() {
        let scheme = FingerprintScheme::Morgan { radius: 2, n_bits: 0 };
        assert!(scheme.validate().is_err());
    }

    #[test]
    fn test_encode_batch_appends_columns() {
        let table = Table::from_rows(
            ["compound_id", "smiles"],
            vec![
                vec!["C1".into(), "CCO".into()],
                vec!["C2".into(), Value::Null],
            ],
        )
        .unwrap();
        let out = encode_batch(&table, FingerprintScheme::Maccs, "smiles").unwrap();
        assert_eq!(out.columns().len(), 2 + 167);
        assert_eq!(out.columns()[2], "fp_0");
        assert_eq!(out.columns()[168], "fp_166");
        assert_eq!(out.len(), 2);
        assert!(out.rows()[1][2..].iter().all(|v| *v == Value::Int(0)));
    }

    #[test]
    fn test_encode_batch_missing_column() {
        let table = Table::new(["compound_id"]);
        assert!(matches!(
            encode_batch(&table, FingerprintScheme::Maccs, "smiles"),
            Err(ScreenError::Validation(_))
        ));
    }

    #[test]
    fn test_encode_batch_twice_rejected() {
        let table = Table::from_rows(["smiles"], vec![vec![Value::from("CCO")]]).unwrap();
        let once = encode_batch(&table, FingerprintScheme::Maccs, "smiles").unwrap();
        let err = encode_batch(&once, FingerprintScheme::Maccs, "smiles").unwrap_err();
        assert!(err.to_string().contains("fp_0"));
    }
}
