//! `ferroscreen` command-line front end.
//!
//! Subcommands mirror the pipeline stages:
//!   - `request`      accession → ranked pIC50 table (CSV)
//!   - `filter`       split a compound table into passed / violated
//!   - `fingerprint`  chunked fingerprint export
//!   - `describe`     descriptor summary, optionally scaled to rule limits

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ferroscreen_common::ScreenConfig;

#[derive(Parser)]
#[command(name = "ferroscreen")]
#[command(version, about = "ChEMBL potency retrieval, drug-likeness filtering and fingerprinting", long_about = None)]
struct Cli {
    /// Config file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "FERROSCREEN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch IC50 data for a UniProt accession and write compound_id, smiles, pIC50
    Request(RequestArgs),
    /// Apply drug-likeness rules to a compound table
    Filter(FilterArgs),
    /// Encode every structure in a compound table
    Fingerprint(FingerprintArgs),
    /// Mean and standard deviation of compound descriptors
    Describe(DescribeArgs),
}

#[derive(Args)]
struct RequestArgs {
    /// UniProt accession, e.g. P00533
    accession: String,

    /// Output CSV
    #[arg(short, long)]
    output: PathBuf,

    /// Which matching target to use
    #[arg(long)]
    selection_index: Option<usize>,

    /// Attempts per registry call
    #[arg(long)]
    retry_attempts: Option<u32>,

    /// Seconds between attempts
    #[arg(long)]
    retry_delay: Option<u64>,

    /// ChEMBL REST base URL
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Args)]
struct FilterArgs {
    /// Input compound CSV
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write compounds passing every rule
    #[arg(long)]
    passed: PathBuf,

    /// Where to write violating compounds, with a violation_reason column
    #[arg(long)]
    violated: PathBuf,

    /// Rules in evaluation order (comma-separated: rule_of_five,soft_reos)
    #[arg(long, value_delimiter = ',')]
    rules: Option<Vec<String>>,

    /// Column holding SMILES
    #[arg(long)]
    column: Option<String>,
}

#[derive(Args)]
struct FingerprintArgs {
    /// Input compound CSV
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV, replaced if it exists
    #[arg(short, long)]
    output: PathBuf,

    /// morgan, atom_pair, topological or maccs
    #[arg(long)]
    scheme: Option<String>,

    /// Morgan radius
    #[arg(long)]
    radius: Option<u32>,

    /// Bit length for hashed schemes
    #[arg(long)]
    n_bits: Option<usize>,

    /// Longest path for the topological scheme
    #[arg(long)]
    max_path: Option<usize>,

    /// Rows per committed chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Column holding SMILES
    #[arg(long)]
    column: Option<String>,
}

#[derive(Args)]
struct DescribeArgs {
    /// Input compound CSV
    #[arg(short, long)]
    input: PathBuf,

    /// Columns to summarise; computed from SMILES when absent from the input
    #[arg(long, value_delimiter = ',', default_value = "molecular_weight,n_hba,n_hbd,logp")]
    properties: Vec<String>,

    /// Scale each property so its Rule-of-Five limit maps to this value
    #[arg(long)]
    scale_to: Option<f64>,

    /// Column holding SMILES
    #[arg(long)]
    column: Option<String>,
}

impl RequestArgs {
    fn apply(&self, config: &mut ScreenConfig) {
        if let Some(i) = self.selection_index {
            config.target.selection_index = i;
        }
        if let Some(n) = self.retry_attempts {
            config.retrieval.retry_attempts = n;
        }
        if let Some(s) = self.retry_delay {
            config.retrieval.retry_delay_secs = s;
        }
        if let Some(ref url) = self.base_url {
            config.retrieval.base_url = url.clone();
        }
    }
}

impl FilterArgs {
    fn apply(&self, config: &mut ScreenConfig) {
        if let Some(ref rules) = self.rules {
            config.filters.rules = rules.clone();
        }
        if let Some(ref c) = self.column {
            config.filters.structure_column = c.clone();
        }
    }
}

impl FingerprintArgs {
    fn apply(&self, config: &mut ScreenConfig) {
        let fp = &mut config.fingerprint;
        if let Some(ref s) = self.scheme {
            fp.scheme = s.clone();
        }
        if let Some(r) = self.radius {
            fp.radius = r;
        }
        if self.n_bits.is_some() {
            fp.n_bits = self.n_bits;
        }
        if let Some(m) = self.max_path {
            fp.max_path = m;
        }
        if let Some(c) = self.chunk_size {
            fp.chunk_size = c;
        }
        if let Some(ref c) = self.column {
            config.filters.structure_column = c.clone();
        }
    }
}

impl DescribeArgs {
    fn apply(&self, config: &mut ScreenConfig) {
        if let Some(ref c) = self.column {
            config.filters.structure_column = c.clone();
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ScreenConfig> {
    Ok(match path {
        Some(p) => ScreenConfig::load(p)?,
        None => ScreenConfig::default(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ferroscreen=info,warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    info!(version = env!("CARGO_PKG_VERSION"), "ferroscreen starting");

    match cli.command {
        Commands::Request(args) => {
            args.apply(&mut config);
            config.validate()?;
            commands::request(&config, &args.accession, &args.output).await
        }
        Commands::Filter(args) => {
            args.apply(&mut config);
            config.validate()?;
            commands::filter(&config, &args.input, &args.passed, &args.violated)
        }
        Commands::Fingerprint(args) => {
            args.apply(&mut config);
            config.validate()?;
            commands::fingerprint(&config, &args.input, &args.output).await
        }
        Commands::Describe(args) => {
            args.apply(&mut config);
            config.validate()?;
            commands::describe(&config, &args.input, &args.properties, args.scale_to)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "ferroscreen",
            "fingerprint",
            "-i",
            "in.csv",
            "-o",
            "out.csv",
            "--scheme",
            "maccs",
            "--chunk-size",
            "25",
        ])
        .unwrap();
        let mut config = ScreenConfig::default();
        let Commands::Fingerprint(args) = cli.command else {
            panic!("expected fingerprint subcommand");
        };
        args.apply(&mut config);
        assert_eq!(config.fingerprint.scheme, "maccs");
        assert_eq!(config.fingerprint.chunk_size, 25);
        assert_eq!(config.fingerprint.radius, 2);
    }

    #[test]
    fn test_rules_are_comma_separated() {
        let cli = Cli::try_parse_from([
            "ferroscreen",
            "filter",
            "-i",
            "in.csv",
            "--passed",
            "p.csv",
            "--violated",
            "v.csv",
            "--rules",
            "soft_reos,ro5",
        ])
        .unwrap();
        let Commands::Filter(args) = cli.command else {
            panic!("expected filter subcommand");
        };
        assert_eq!(args.rules, Some(vec!["soft_reos".to_string(), "ro5".to_string()]));
    }

    #[test]
    fn test_request_overrides() {
        let cli = Cli::try_parse_from([
            "ferroscreen",
            "request",
            "P00533",
            "-o",
            "out.csv",
            "--selection-index",
            "1",
            "--retry-attempts",
            "3",
        ])
        .unwrap();
        let Commands::Request(args) = cli.command else {
            panic!("expected request subcommand");
        };
        let mut config = ScreenConfig::default();
        args.apply(&mut config);
        assert_eq!(config.target.selection_index, 1);
        assert_eq!(config.retrieval.retry_attempts, 3);
        assert_eq!(config.retrieval.retry_delay_secs, 2);
    }
}
