//! Summary statistics over computed compound properties.
//!
//! Backs the per-property mean/std summaries used to compare a compound set
//! against rule thresholds (e.g. Rule-of-Five limits scaled to a common axis).

use std::collections::HashMap;

use serde::Serialize;

use ferroscreen_common::{ScreenError, Table};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyStats {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN with fewer than two values.
    pub std: f64,
}

/// Mean and sample standard deviation of each named column. Null cells are
/// skipped; any other non-numeric cell is a validation error.
pub fn describe(table: &Table, columns: &[&str]) -> Result<Vec<PropertyStats>, ScreenError> {
    columns
        .iter()
        .map(|&name| {
            let mut values = Vec::with_capacity(table.len());
            for (row, cell) in table.column(name)?.into_iter().enumerate() {
                if cell.is_null() {
                    continue;
                }
                let v = cell.as_f64().ok_or_else(|| {
                    ScreenError::Validation(format!("column '{name}' row {row} is not numeric: {cell}"))
                })?;
                values.push(v);
            }
            Ok(summarise(name, &values))
        })
        .collect()
}

fn summarise(name: &str, values: &[f64]) -> PropertyStats {
    let count = values.len();
    let mean = if count == 0 {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / count as f64
    };
    let std = if count < 2 {
        f64::NAN
    } else {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    };
    PropertyStats { name: name.to_string(), count, mean, std }
}

/// Scale each property's mean and std so that its threshold maps onto
/// `scaled_threshold`. Every property needs a threshold.
pub fn scale_by_thresholds(
    stats: &[PropertyStats],
    thresholds: &HashMap<String, f64>,
    scaled_threshold: f64,
) -> Result<Vec<PropertyStats>, ScreenError> {
    stats
        .iter()
        .map(|s| {
            let threshold = thresholds.get(&s.name).ok_or_else(|| {
                ScreenError::Validation(format!("Add property '{}' to scaling variable.", s.name))
            })?;
            if *threshold == 0.0 {
                return Err(ScreenError::Validation(format!(
                    "threshold for property '{}' must be non-zero",
                    s.name
                )));
            }
            let factor = scaled_threshold / threshold;
            Ok(PropertyStats {
                name: s.name.clone(),
                count: s.count,
                mean: s.mean * factor,
                std: s.std * factor,
            })
        })
        .collect()
}

/// Rule-of-Five limits keyed by the property names the filters report.
pub fn rule_of_five_thresholds() -> HashMap<String, f64> {
    [
        ("molecular_weight", 500.0),
        ("n_hba", 10.0),
        ("n_hbd", 5.0),
        ("logp", 5.0),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}
