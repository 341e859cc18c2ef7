//! Rule-based compound filtering.
//!
//! A `FilterEngine` holds an ordered list of named `PropertyEvaluator`s and
//! partitions a compound table into rows that satisfy every rule and rows
//! that do not, with a reason string for each violation.
//!
//! Per compound, evaluators run in registration order:
//!   - an evaluator error records `"{name}: {message}"` and stops evaluation
//!     of that compound (its structure cannot be assessed further);
//!   - `fulfilled = false` records `name` and moves on to the next rule.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use ferroscreen_common::{ScreenError, Table, Value};

use crate::descriptors::Descriptors;

// ─────────────────────────────────────────────
//  Evaluator trait
// ─────────────────────────────────────────────

/// Properties measured by one evaluator, in the order it reports them,
/// plus whether the compound satisfies the rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub properties: Vec<(String, f64)>,
    pub fulfilled: bool,
}

impl Measurement {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.properties.iter().find(|(n, _)| n == name).map(|&(_, v)| v)
    }
}

/// A named drug-likeness rule evaluated on one structure string.
pub trait PropertyEvaluator: Send + Sync {
    fn evaluate(&self, structure: &str) -> Result<Measurement, ScreenError>;
}

/// Lipinski's Rule of Five: at most one of MW > 500, HBA > 10, HBD > 5,
/// logP > 5 may be violated.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleOfFive;

impl PropertyEvaluator for RuleOfFive {
    fn evaluate(&self, structure: &str) -> Result<Measurement, ScreenError> {
        let d = Descriptors::from_smiles(structure)?;
        let conditions = [
            d.molecular_weight <= 500.0,
            d.n_hba <= 10,
            d.n_hbd <= 5,
            d.logp <= 5.0,
        ];
        let met = conditions.iter().filter(|&&c| c).count();
        Ok(Measurement {
            properties: vec![
                ("molecular_weight".into(), d.molecular_weight),
                ("n_hba".into(), d.n_hba as f64),
                ("n_hbd".into(), d.n_hbd as f64),
                ("logp".into(), d.logp),
            ],
            fulfilled: met >= 3,
        })
    }
}

/// Soft REOS (Rapid Elimination Of Swill): every bound must hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftReos;

impl PropertyEvaluator for SoftReos {
    fn evaluate(&self, structure: &str) -> Result<Measurement, ScreenError> {
        let d = Descriptors::from_smiles(structure)?;
        let fulfilled = (100.0..=700.0).contains(&d.molecular_weight)
            && (5..=50).contains(&d.heavy_atoms)
            && d.rotatable_bonds <= 12
            && d.n_hbd <= 5
            && d.n_hba <= 10
            && d.logp > -5.0
            && d.logp < 7.5;
        Ok(Measurement {
            properties: vec![
                ("molecular_weight".into(), d.molecular_weight),
                ("heavy_atoms".into(), d.heavy_atoms as f64),
                ("rotatable_bonds".into(), d.rotatable_bonds as f64),
                ("n_hba".into(), d.n_hba as f64),
                ("n_hbd".into(), d.n_hbd as f64),
                ("logp".into(), d.logp),
            ],
            fulfilled,
        })
    }
}

/// Adapter turning a closure into an evaluator. Build it with [`from_fn`].
pub struct FnEvaluator<F>(F);

pub fn from_fn<F>(f: F) -> FnEvaluator<F>
where
    F: Fn(&str) -> Result<Measurement, ScreenError> + Send + Sync,
{
    FnEvaluator(f)
}

impl<F> PropertyEvaluator for FnEvaluator<F>
where
    F: Fn(&str) -> Result<Measurement, ScreenError> + Send + Sync,
{
    fn evaluate(&self, structure: &str) -> Result<Measurement, ScreenError> {
        (self.0)(structure)
    }
}

/// Built-in rules selectable by name from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleName {
    RuleOfFive,
    SoftReos,
}

impl RuleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleName::RuleOfFive => "rule_of_five",
            RuleName::SoftReos => "soft_reos",
        }
    }
}

impl FromStr for RuleName {
    type Err = ScreenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rule_of_five" | "ro5" | "lipinski" => Ok(RuleName::RuleOfFive),
            "soft_reos" | "reos" => Ok(RuleName::SoftReos),
            other => Err(ScreenError::Validation(format!(
                "Unknown filter rule '{other}'. Supported rules are: rule_of_five, soft_reos."
            ))),
        }
    }
}

// ─────────────────────────────────────────────
//  Verdicts and engine
// ─────────────────────────────────────────────

/// Outcome of running every registered rule on one compound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterVerdict {
    pub row: usize,
    pub properties: Vec<(String, f64)>,
    pub fulfilled: bool,
    pub reasons: Vec<String>,
}

impl FilterVerdict {
    pub fn reason_text(&self) -> String {
        self.reasons.join(", ")
    }

    /// Merge measured properties; a repeated name keeps its first position
    /// and takes the latest value.
    fn record(&mut self, properties: Vec<(String, f64)>) {
        for (name, value) in properties {
            match self.properties.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => self.properties.push((name, value)),
            }
        }
    }
}

pub const VIOLATION_REASON_COLUMN: &str = "violation_reason";

/// Ordered registry of named rules.
#[derive(Clone, Default)]
pub struct FilterEngine {
    filters: Vec<(String, Arc<dyn PropertyEvaluator>)>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine preloaded with built-in rules, in the given order.
    pub fn with_rules(rules: &[RuleName]) -> Self {
        let mut engine = Self::new();
        for rule in rules {
            match rule {
                RuleName::RuleOfFive => engine.add_filter(RuleOfFive, rule.as_str()),
                RuleName::SoftReos => engine.add_filter(SoftReos, rule.as_str()),
            };
        }
        engine
    }

    /// Register a rule. Names need not be unique; every entry runs.
    pub fn add_filter<E>(&mut self, evaluator: E, name: impl Into<String>) -> &mut Self
    where
        E: PropertyEvaluator + 'static,
    {
        self.filters.push((name.into(), Arc::new(evaluator)));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every rule on one structure string.
    pub fn evaluate(&self, structure: &str) -> FilterVerdict {
        self.evaluate_row(0, Some(structure))
    }

    fn evaluate_row(&self, row: usize, structure: Option<&str>) -> FilterVerdict {
        let mut verdict = FilterVerdict {
            row,
            properties: Vec::new(),
            fulfilled: true,
            reasons: Vec::new(),
        };

        for (name, evaluator) in &self.filters {
            let outcome = match structure {
                Some(s) => evaluator.evaluate(s),
                None => Err(ScreenError::InvalidStructure(
                    "structure cell is empty or not text".to_string(),
                )),
            };
            match outcome {
                Ok(m) => {
                    verdict.record(m.properties);
                    if !m.fulfilled {
                        verdict.reasons.push(name.clone());
                    }
                }
                Err(e) => {
                    debug!(row, filter = %name, error = %e, "Filter raised an error");
                    verdict.reasons.push(format!("{name}: {e}"));
                    break;
                }
            }
        }

        verdict.fulfilled = verdict.reasons.is_empty();
        verdict
    }

    /// Verdicts for every row of `table`, in row order.
    pub fn verdicts(&self, table: &Table, structure_field: &str) -> Result<Vec<FilterVerdict>, ScreenError> {
        let col = table.require_column(structure_field)?;
        Ok(table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| self.evaluate_row(i, row[col].as_str()))
            .collect())
    }

    /// Partition `table` into `(passed, violated)`. `passed` keeps the input
    /// columns; `violated` adds a `violation_reason` column.
    pub fn process(&self, table: &Table, structure_field: &str) -> Result<(Table, Table), ScreenError> {
        let verdicts = self.verdicts(table, structure_field)?;

        let (ok, bad): (Vec<&FilterVerdict>, Vec<&FilterVerdict>) =
            verdicts.iter().partition(|v| v.fulfilled);

        let passed = table.take_rows(&ok.iter().map(|v| v.row).collect::<Vec<_>>());
        let violated = table
            .take_rows(&bad.iter().map(|v| v.row).collect::<Vec<_>>())
            .with_column(
                VIOLATION_REASON_COLUMN,
                bad.iter().map(|v| Value::Text(v.reason_text())).collect(),
            )?;

        info!(
            compounds = table.len(),
            passed = passed.len(),
            violated = violated.len(),
            filters = self.filters.len(),
            "Filtering complete"
        );
        Ok((passed, violated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compounds() -> Table {
        Table::from_rows(
            ["compound_id", "smiles"],
            vec![
                vec!["ethanol".into(), "CCO".into()],
                vec!["eicosane".into(), "CCCCCCCCCCCCCCCCCCCC".into()],
                vec!["aspirin".into(), "CC(=O)Oc1ccccc1C(=O)O".into()],
                vec!["broken".into(), "C1CC(".into()],
                vec!["missing".into(), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rule_of_five_small_molecules() {
        let ethanol = RuleOfFive.evaluate("CCO").unwrap();
        assert!(ethanol.fulfilled);
        let mw = ethanol.get("molecular_weight").unwrap();
        assert!(mw > 0.0 && mw < 100.0);

        let eicosane = RuleOfFive.evaluate("CCCCCCCCCCCCCCCCCCCC").unwrap();
        assert!(eicosane.fulfilled);
    }

    #[test]
    fn test_soft_reos_rejects_ethanol() {
        let m = SoftReos.evaluate("CCO").unwrap();
        assert!(!m.fulfilled);
        assert_eq!(m.properties.len(), 6);
        assert!(SoftReos.evaluate("CC(=O)Oc1ccccc1C(=O)O").unwrap().fulfilled);
    }

    #[test]
    fn test_invalid_structure_errors() {
        assert!(matches!(RuleOfFive.evaluate("C1CC"), Err(ScreenError::InvalidStructure(_))));
        assert!(matches!(SoftReos.evaluate(""), Err(ScreenError::InvalidStructure(_))));
    }

    #[test]
    fn test_process_partitions_rows() {
        let engine = FilterEngine::with_rules(&[RuleName::RuleOfFive, RuleName::SoftReos]);
        let input = compounds();
        let (passed, violated) = engine.process(&input, "smiles").unwrap();

        assert_eq!(passed.len() + violated.len(), input.len());
        assert_eq!(passed.columns(), input.columns());
        assert_eq!(violated.columns().last().unwrap(), VIOLATION_REASON_COLUMN);

        let ids: Vec<String> = passed.column("compound_id").unwrap().iter().map(|v| v.to_string()).collect();
        assert_eq!(ids, vec!["aspirin"]);

        for row in violated.column(VIOLATION_REASON_COLUMN).unwrap() {
            assert!(!row.to_string().is_empty());
        }
        assert_eq!(violated.get(0, VIOLATION_REASON_COLUMN).unwrap().to_string(), "soft_reos");
    }

    #[test]
    fn test_error_short_circuits_but_failure_continues() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = calls.clone();

        let mut engine = FilterEngine::new();
        engine
            .add_filter(
                from_fn(|_: &str| Ok(Measurement { properties: vec![], fulfilled: false })),
                "always_fails",
            )
            .add_filter(RuleOfFive, "rule_of_five")
            .add_filter(
                from_fn(move |_: &str| {
                    counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok(Measurement { properties: vec![], fulfilled: true })
                }),
                "counter",
            );

        let bad = engine.evaluate("C1CC");
        assert!(!bad.fulfilled);
        assert_eq!(bad.reasons.len(), 2);
        assert_eq!(bad.reasons[0], "always_fails");
        assert!(bad.reasons[1].starts_with("rule_of_five: "));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);

        let good = engine.evaluate("CCO");
        assert_eq!(good.reasons, vec!["always_fails".to_string()]);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_names_all_run() {
        let mut engine = FilterEngine::new();
        engine.add_filter(SoftReos, "reos").add_filter(SoftReos, "reos");
        let verdict = engine.evaluate("CCO");
        assert_eq!(verdict.reasons, vec!["reos".to_string(), "reos".to_string()]);
        // repeated properties keep one slot each
        assert_eq!(verdict.properties.len(), 6);
    }

    #[test]
    fn test_non_text_cell_is_row_error() {
        let engine = FilterEngine::with_rules(&[RuleName::RuleOfFive]);
        let verdicts = engine.verdicts(&compounds(), "smiles").unwrap();
        assert!(verdicts[4].reasons[0].starts_with("rule_of_five: "));
    }

    #[test]
    fn test_missing_column_is_validation_error() {
        let engine = FilterEngine::with_rules(&[RuleName::RuleOfFive]);
        let err = engine.process(&compounds(), "structure").unwrap_err();
        assert!(matches!(err, ScreenError::Validation(_)));
    }

    #[test]
    fn test_rule_names_parse() {
        assert_eq!("rule_of_five".parse::<RuleName>().unwrap(), RuleName::RuleOfFive);
        assert_eq!("Soft_REOS".parse::<RuleName>().unwrap(), RuleName::SoftReos);
        assert!("pains".parse::<RuleName>().is_err());
    }

    #[test]
    fn test_empty_engine_passes_everything() {
        let (passed, violated) = FilterEngine::new().process(&compounds(), "smiles").unwrap();
        assert_eq!(passed.len(), 5);
        assert!(violated.is_empty());
    }
}
