//! Chunked fingerprint export to a CSV sink.
//!
//! Rows are encoded `chunk_size` at a time. Each chunk is written and flushed
//! before the next one starts, so an interrupted export leaves only complete
//! chunks behind. The first chunk replaces any existing file and writes the
//! header; later chunks append. Row order matches the input.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use ferroscreen_common::{ScreenError, Table};

use super::{encode, FingerprintScheme};

/// Emitted after every committed chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ExportProgress {
    /// 1-based chunk number.
    pub chunk: usize,
    pub rows_written: usize,
    pub total_rows: usize,
    pub failed_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub chunks: usize,
    pub rows_written: usize,
    pub failed_rows: usize,
}

/// Encode `table` chunk by chunk into the CSV file at `sink`.
///
/// A row whose structure cell is missing or not text is written with a
/// single `0` in `fp_0` and blank remaining fingerprint cells; the chunk
/// still commits.
pub fn encode_batch_streaming(
    table: &Table,
    scheme: FingerprintScheme,
    structure_field: &str,
    sink: impl AsRef<Path>,
    chunk_size: usize,
    progress_tx: Option<&broadcast::Sender<ExportProgress>>,
) -> Result<ExportSummary, ScreenError> {
    let sink = sink.as_ref();
    if chunk_size == 0 {
        return Err(ScreenError::Validation("chunk_size must be a positive integer".into()));
    }
    scheme.validate()?;
    let col = table.require_column(structure_field)?;
    let fp_columns = scheme.column_names();
    table.check_new_columns(&fp_columns)?;

    let mut header: Vec<String> = table.columns().to_vec();
    header.extend(fp_columns);

    let total_rows = table.len();
    let mut summary = ExportSummary {
        path: sink.to_path_buf(),
        chunks: 0,
        rows_written: 0,
        failed_rows: 0,
    };

    info!(
        path = %sink.display(),
        rows = total_rows,
        chunk_size,
        scheme = scheme.name(),
        "Starting fingerprint export"
    );

    if total_rows == 0 {
        // still leave a well-formed, header-only sink
        write_chunk(sink, &header, &[], true)?;
        return Ok(summary);
    }

    for (index, rows) in table.rows().chunks(chunk_size).enumerate() {
        let offset = index * chunk_size;
        let mut failed = 0;

        let records: Vec<Vec<String>> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                match row[col].as_str() {
                    Some(smiles) => {
                        record.extend(encode(smiles, scheme).into_iter().map(|b| b.to_string()));
                    }
                    None => {
                        failed += 1;
                        warn!(row = offset + i, column = structure_field, "Structure cell is not text, writing placeholder");
                        record.push("0".to_string());
                        record.extend(std::iter::repeat(String::new()).take(scheme.len() - 1));
                    }
                }
                record
            })
            .collect();

        write_chunk(sink, &header, &records, index == 0)?;

        summary.chunks += 1;
        summary.rows_written += records.len();
        summary.failed_rows += failed;

        info!(
            chunk = summary.chunks,
            rows_written = summary.rows_written,
            total_rows,
            "Chunk committed"
        );
        if let Some(tx) = progress_tx {
            let _ = tx.send(ExportProgress {
                chunk: summary.chunks,
                rows_written: summary.rows_written,
                total_rows,
                failed_rows: summary.failed_rows,
            });
        }
    }

    Ok(summary)
}

/// Write one chunk. `first` truncates the sink and writes the header.
fn write_chunk(sink: &Path, header: &[String], records: &[Vec<String>], first: bool) -> Result<(), ScreenError> {
    let file = if first {
        File::create(sink)?
    } else {
        OpenOptions::new().append(true).open(sink)?
    };
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if first {
        writer.write_record(header)?;
    }
    for record in records {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferroscreen_common::Value;
    use pretty_assertions::assert_eq;

    fn compounds(n: usize) -> Table {
        let smiles = ["CCO", "c1ccccc1", "CC(=O)O", "CCN"];
        Table::from_rows(
            ["compound_id", "smiles"],
            (0..n)
                .map(|i| vec![Value::Text(format!("C{i}")), smiles[i % smiles.len()].into()])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_chunks_preserve_order_and_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fps.csv");
        let (tx, mut rx) = broadcast::channel(16);

        let summary =
            encode_batch_streaming(&compounds(7), FingerprintScheme::Maccs, "smiles", &path, 3, Some(&tx)).unwrap();
        assert_eq!(summary.chunks, 3);
        assert_eq!(summary.rows_written, 7);
        assert_eq!(summary.failed_rows, 0);

        let out = Table::read_csv(&path).unwrap();
        assert_eq!(out.len(), 7);
        assert_eq!(out.columns().len(), 2 + 167);
        let ids: Vec<String> = out.column("compound_id").unwrap().iter().map(|v| v.to_string()).collect();
        assert_eq!(ids, (0..7).map(|i| format!("C{i}")).collect::<Vec<_>>());

        let events: Vec<ExportProgress> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].rows_written, 7);
        assert_eq!(events[0].chunk, 1);
    }

    #[test]
    fn test_existing_sink_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fps.csv");
        std::fs::write(&path, "stale,content\n1,2\n").unwrap();

        encode_batch_streaming(&compounds(2), FingerprintScheme::Maccs, "smiles", &path, 100, None).unwrap();
        let out = Table::read_csv(&path).unwrap();
        assert_eq!(out.columns()[0], "compound_id");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_bad_row_gets_placeholder_and_chunk_commits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fps.csv");
        let table = Table::from_rows(
            ["compound_id", "smiles"],
            vec![
                vec!["C1".into(), "CCO".into()],
                vec!["C2".into(), Value::Float(3.5)],
                vec!["C3".into(), "CCN".into()],
            ],
        )
        .unwrap();

        let summary = encode_batch_streaming(&table, FingerprintScheme::Maccs, "smiles", &path, 2, None).unwrap();
        assert_eq!(summary.failed_rows, 1);
        assert_eq!(summary.rows_written, 3);

        let out = Table::read_csv(&path).unwrap();
        assert_eq!(out.get(1, "fp_0"), Some(&Value::Int(0)));
        assert_eq!(out.get(1, "fp_1"), Some(&Value::Null));
        assert_eq!(out.get(2, "compound_id"), Some(&Value::Text("C3".into())));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = encode_batch_streaming(
            &compounds(1),
            FingerprintScheme::Maccs,
            "smiles",
            dir.path().join("x.csv"),
            0,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ScreenError::Validation(_)));
    }

    #[test]
    fn test_empty_table_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let summary = encode_batch_streaming(
            &Table::new(["compound_id", "smiles"]),
            FingerprintScheme::Morgan { radius: 2, n_bits: 8 },
            "smiles",
            &path,
            10,
            None,
        )
        .unwrap();
        assert_eq!(summary.chunks, 0);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("compound_id,smiles,fp_0"));
    }

    #[test]
    fn test_existing_fingerprint_columns_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fps.csv");
        let table = Table::from_rows(["smiles", "fp_3"], vec![vec!["CCO".into(), Value::Int(1)]]).unwrap();

        let err = encode_batch_streaming(&table, FingerprintScheme::Maccs, "smiles", &path, 10, None).unwrap_err();
        assert!(matches!(err, ScreenError::Validation(_)));
        assert!(!path.exists());
    }
}
