//! Subcommand bodies.

use std::path::Path;

use anyhow::{bail, Context};
use tokio::sync::broadcast;
use tracing::{info, warn};

use ferroscreen_chem::stats::rule_of_five_thresholds;
use ferroscreen_chem::{
    append_descriptors, describe as describe_table, encode_batch_streaming, scale_by_thresholds, ExportProgress,
    FilterEngine, FingerprintScheme, RuleName, DESCRIPTOR_COLUMNS,
};
use ferroscreen_common::{ScreenConfig, Table};
use ferroscreen_ingestion::{screening_table, ChemblClient, DataRequestPipeline, PipelineProgress};

pub async fn request(config: &ScreenConfig, accession: &str, output: &Path) -> anyhow::Result<()> {
    let client = ChemblClient::from_config(&config.retrieval)?;
    let (tx, mut rx) = broadcast::channel::<PipelineProgress>(64);

    let progress = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            info!(stage = %event.stage, rows = event.rows, "{}", event.message);
        }
    });

    let report = DataRequestPipeline::chembl(client)
        .with_selection_index(config.target.selection_index)
        .with_progress(tx)
        .run(accession)
        .await;
    // the pipeline (and with it the sender) is gone, so the listener ends
    let _ = progress.await;

    if let Some(e) = report.error {
        bail!("no data for {accession}: {e}");
    }
    if let Some(ref target) = report.target {
        info!(
            target = %target.target_chembl_id,
            pref_name = target.pref_name.as_deref().unwrap_or(""),
            organism = target.organism.as_deref().unwrap_or(""),
            "Resolved target"
        );
    }
    screening_table(&report.records)?
        .write_csv(output)
        .with_context(|| format!("writing {}", output.display()))?;
    info!(rows = report.records.len(), path = %output.display(), "Screening table written");
    Ok(())
}

pub fn filter(config: &ScreenConfig, input: &Path, passed_out: &Path, violated_out: &Path) -> anyhow::Result<()> {
    let rules = config
        .filters
        .rules
        .iter()
        .map(|r| r.parse::<RuleName>())
        .collect::<Result<Vec<_>, _>>()?;
    if rules.is_empty() {
        bail!("at least one filter rule is required");
    }
    let table = read_table(input)?;
    let engine = FilterEngine::with_rules(&rules);
    let (passed, violated) = engine.process(&table, &config.filters.structure_column)?;

    passed.write_csv(passed_out)?;
    violated.write_csv(violated_out)?;
    info!(passed = passed.len(), violated = violated.len(), "Filter results written");
    Ok(())
}

pub async fn fingerprint(config: &ScreenConfig, input: &Path, output: &Path) -> anyhow::Result<()> {
    let scheme = FingerprintScheme::from_config(&config.fingerprint)?;
    let table = read_table(input)?;
    let column = config.filters.structure_column.clone();
    let chunk_size = config.fingerprint.chunk_size;
    let sink = output.to_path_buf();

    let (tx, mut rx) = broadcast::channel::<ExportProgress>(64);
    let progress = tokio::spawn(async move {
        while let Ok(p) = rx.recv().await {
            if p.failed_rows > 0 {
                warn!(chunk = p.chunk, failed_rows = p.failed_rows, "Placeholder rows written");
            }
            eprintln!("{}/{} rows encoded", p.rows_written, p.total_rows);
        }
    });

    let summary = tokio::task::spawn_blocking(move || {
        encode_batch_streaming(&table, scheme, &column, &sink, chunk_size, Some(&tx))
    })
    .await??;
    let _ = progress.await;

    info!(
        path = %summary.path.display(),
        chunks = summary.chunks,
        rows = summary.rows_written,
        failed = summary.failed_rows,
        scheme = scheme.name(),
        "Fingerprint export complete"
    );
    Ok(())
}

pub fn describe(config: &ScreenConfig, input: &Path, properties: &[String], scale_to: Option<f64>) -> anyhow::Result<()> {
    let mut table = read_table(input)?;
    if properties.iter().any(|p| table.column_index(p).is_none()) {
        // recomputed descriptors replace any already present
        let keep: Vec<&str> = table
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| !DESCRIPTOR_COLUMNS.contains(c))
            .collect();
        table = append_descriptors(&table.select(&keep)?, &config.filters.structure_column)?;
    }
    let names: Vec<&str> = properties.iter().map(String::as_str).collect();
    let mut stats = describe_table(&table, &names)?;
    if let Some(target) = scale_to {
        stats = scale_by_thresholds(&stats, &rule_of_five_thresholds(), target)?;
    }
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn read_table(path: &Path) -> anyhow::Result<Table> {
    Table::read_csv(path).with_context(|| format!("reading {}", path.display()))
}
