//! Screening run configuration.
//!
//! A run can be configured from a TOML, YAML or JSON file. Every section is
//! optional; missing values fall back to the defaults below, so an empty file
//! is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, ScreenError};

/// Complete configuration for one screening run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Which target to pick when an accession resolves to several
    #[serde(default)]
    pub target: TargetSelection,

    /// Registry access and retry behaviour
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Fingerprint scheme and export chunking
    #[serde(default)]
    pub fingerprint: FingerprintConfig,

    /// Drug-likeness rules applied by the filter engine
    #[serde(default)]
    pub filters: FilterConfig,
}

// ── Target Selection ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSelection {
    /// Index into the list of targets matching the accession
    #[serde(default)]
    pub selection_index: usize,
}

impl Default for TargetSelection {
    fn default() -> Self {
        Self { selection_index: 0 }
    }
}

// ── Retrieval ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// ChEMBL REST base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum attempts per registry call, including the first one
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Fixed pause between attempts, in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Compound ids per structure request
    #[serde(default = "default_structure_batch")]
    pub structure_batch_size: usize,

    /// Per-request timeout, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String { "https://www.ebi.ac.uk/chembl/api/data".to_string() }
fn default_retry_attempts() -> u32 { 10 }
fn default_retry_delay() -> u64 { 2 }
fn default_page_size() -> usize { 1000 }
fn default_structure_batch() -> usize { 50 }
fn default_timeout() -> u64 { 30 }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay(),
            page_size: default_page_size(),
            structure_batch_size: default_structure_batch(),
            timeout_secs: default_timeout(),
        }
    }
}

impl RetrievalConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ── Fingerprints ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// One of `morgan`, `atom_pair`, `topological`, `maccs`
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Morgan radius
    #[serde(default = "default_radius")]
    pub radius: u32,

    /// Bit length for hashed schemes; ignored for `maccs`
    pub n_bits: Option<usize>,

    /// Longest bond path for the topological scheme
    #[serde(default = "default_max_path")]
    pub max_path: usize,

    /// Rows per committed chunk in streaming export
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_scheme() -> String { "morgan".to_string() }
fn default_radius() -> u32 { 2 }
fn default_max_path() -> usize { 7 }
fn default_chunk_size() -> usize { 100 }

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            radius: default_radius(),
            n_bits: None,
            max_path: default_max_path(),
            chunk_size: default_chunk_size(),
        }
    }
}

// ── Filters ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Rule names, evaluated in this order
    #[serde(default = "default_rules")]
    pub rules: Vec<String>,

    /// Column holding the SMILES string
    #[serde(default = "default_structure_column")]
    pub structure_column: String,
}

fn default_rules() -> Vec<String> { vec!["rule_of_five".to_string(), "soft_reos".to_string()] }
fn default_structure_column() -> String { "smiles".to_string() }

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            structure_column: default_structure_column(),
        }
    }
}

// ── Loading and validation ────────────────────────────────────────────────────

impl ScreenConfig {
    /// Load from a file, picking the format from its extension
    /// (`.toml`, `.yaml`/`.yml`, `.json`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config: Self = match ext {
            "toml" => toml::from_str(&content).map_err(|e| ScreenError::Config(e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&content).map_err(|e| ScreenError::Config(e.to_string()))?
            }
            "json" => serde_json::from_str(&content)?,
            other => {
                return Err(ScreenError::Config(format!(
                    "Unsupported config format '{other}' for {}",
                    path.display()
                )))
            }
        };
        config.validate()?;
        debug!(path = %path.display(), format = ext, "Loaded configuration");
        Ok(config)
    }

    /// Load from `FERROSCREEN_CONFIG` when set, otherwise use defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var("FERROSCREEN_CONFIG") {
            Ok(path) if !path.is_empty() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ScreenError::Config(e.to_string()))
    }

    /// Reject non-positive numeric parameters.
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.retry_attempts == 0 {
            return Err(ScreenError::Validation("retry_attempts must be a positive integer".into()));
        }
        if r.page_size == 0 {
            return Err(ScreenError::Validation("page_size must be a positive integer".into()));
        }
        if r.structure_batch_size == 0 {
            return Err(ScreenError::Validation(
                "structure_batch_size must be a positive integer".into(),
            ));
        }
        if r.base_url.trim().is_empty() {
            return Err(ScreenError::Validation("base_url must not be empty".into()));
        }

        let f = &self.fingerprint;
        if f.chunk_size == 0 {
            return Err(ScreenError::Validation("chunk_size must be a positive integer".into()));
        }
        if f.n_bits == Some(0) {
            return Err(ScreenError::Validation("n_bits must be a positive integer".into()));
        }
        if f.max_path == 0 {
            return Err(ScreenError::Validation("max_path must be a positive integer".into()));
        }

        if self.filters.structure_column.trim().is_empty() {
            return Err(ScreenError::Validation("structure_column must not be empty".into()));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ScreenConfig::default();
        assert_eq!(config.target.selection_index, 0);
        assert_eq!(config.retrieval.retry_attempts, 10);
        assert_eq!(config.retrieval.retry_delay(), Duration::from_secs(2));
        assert_eq!(config.fingerprint.chunk_size, 100);
        assert_eq!(config.fingerprint.scheme, "morgan");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: ScreenConfig = toml::from_str("").unwrap();
        assert_eq!(config, ScreenConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "retrieval:\n  retry_attempts: 3\nfingerprint:\n  scheme: maccs\n";
        let config: ScreenConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.retrieval.retry_attempts, 3);
        assert_eq!(config.retrieval.retry_delay_secs, 2);
        assert_eq!(config.fingerprint.scheme, "maccs");
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut config = ScreenConfig::default();
        config.fingerprint.chunk_size = 0;
        assert!(matches!(config.validate(), Err(ScreenError::Validation(_))));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = ScreenConfig::default();
        config.retrieval.retry_attempts = 0;
        assert!(matches!(config.validate(), Err(ScreenError::Validation(_))));
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[target]\nselection_index = 1\n\n[fingerprint]\nn_bits = 2048").unwrap();
        let config = ScreenConfig::load(file.path()).unwrap();
        assert_eq!(config.target.selection_index, 1);
        assert_eq!(config.fingerprint.n_bits, Some(2048));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(ScreenConfig::load(file.path()), Err(ScreenError::Config(_))));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ScreenConfig::default();
        let text = config.to_toml().unwrap();
        let parsed: ScreenConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, parsed);
    }
}
