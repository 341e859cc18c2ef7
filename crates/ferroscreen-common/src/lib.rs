//! ferroscreen-common: Shared types, errors, configuration and the tabular
//! value type used across all FerroScreen crates.

pub mod error;
pub mod config;
pub mod sandbox;
pub mod table;

// Re-export commonly used types
pub use config::{ScreenConfig, TargetSelection, RetrievalConfig, FingerprintConfig, FilterConfig};
pub use error::{Result, ScreenError};
pub use table::{Table, Value};
