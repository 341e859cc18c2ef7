//! Filter engine and fingerprint encoder over a realistic compound table.

use pretty_assertions::assert_eq;

use ferroscreen_chem::filters::VIOLATION_REASON_COLUMN;
use ferroscreen_chem::{
    encode, encode_batch, from_fn, FilterEngine, FingerprintScheme, Measurement, RuleName, RuleOfFive, SoftReos,
};
use ferroscreen_common::{Table, Value};

fn compounds() -> Table {
    let rows = [
        ("CHEMBL545", "CCO"),
        ("CHEMBL25", "CC(=O)Oc1ccccc1C(=O)O"),
        ("CHEMBL113", "Cn1cnc2c1c(=O)n(C)c(=O)n2C"),
        ("EICOSANE", "CCCCCCCCCCCCCCCCCCCC"),
        ("BROKEN", "C1CC("),
        ("CHEMBL939", "CC(C)Cc1ccc(cc1)C(C)C(=O)O"),
    ];
    Table::from_rows(
        ["compound_id", "smiles"],
        rows.iter().map(|(id, s)| vec![Value::from(*id), Value::from(*s)]).collect(),
    )
    .unwrap()
}

#[test]
fn test_rule_of_five_and_soft_reos_disagree_on_ethanol() {
    let ro5 = RuleOfFive.evaluate_checked("CCO");
    assert!(ro5.fulfilled);
    let mw = ro5.get("molecular_weight").unwrap();
    assert!(mw > 0.0 && mw < 100.0);

    assert!(!SoftReos.evaluate_checked("CCO").fulfilled);
    assert!(RuleOfFive.evaluate_checked("CCCCCCCCCCCCCCCCCCCC").fulfilled);
}

#[test]
fn test_process_partitions_every_row() {
    let table = compounds();
    let engine = FilterEngine::with_rules(&[RuleName::RuleOfFive, RuleName::SoftReos]);
    let (passed, violated) = engine.process(&table, "smiles").unwrap();

    assert_eq!(passed.len() + violated.len(), table.len());
    assert!(passed.column_index(VIOLATION_REASON_COLUMN).is_none());
    for reason in violated.column(VIOLATION_REASON_COLUMN).unwrap() {
        assert!(!reason.as_str().unwrap_or("").is_empty());
    }

    let passed_ids: Vec<String> = passed.column("compound_id").unwrap().iter().map(|v| v.to_string()).collect();
    assert_eq!(passed_ids, vec!["CHEMBL25", "CHEMBL113", "CHEMBL939"]);
}

#[test]
fn test_custom_evaluator_runs_after_builtins() {
    let mut engine = FilterEngine::with_rules(&[RuleName::RuleOfFive]);
    engine.add_filter(
        from_fn(|smiles: &str| {
            Ok(Measurement {
                properties: vec![("length".to_string(), smiles.len() as f64)],
                fulfilled: smiles.len() <= 12,
            })
        }),
        "short_smiles",
    );
    assert_eq!(engine.names().collect::<Vec<_>>(), vec!["rule_of_five", "short_smiles"]);

    let verdict = engine.evaluate("CC(=O)Oc1ccccc1C(=O)O");
    assert!(!verdict.fulfilled);
    assert_eq!(verdict.reasons, vec!["short_smiles".to_string()]);
}

#[test]
fn test_fingerprints_are_deterministic_and_fixed_length() {
    let schemes = [
        FingerprintScheme::Morgan { radius: 2, n_bits: 2048 },
        FingerprintScheme::AtomPair { n_bits: 1024 },
        FingerprintScheme::Topological { max_path: 5, n_bits: 512 },
        FingerprintScheme::Maccs,
    ];
    for scheme in schemes {
        let a = encode("Cn1cnc2c1c(=O)n(C)c(=O)n2C", scheme);
        let b = encode("Cn1cnc2c1c(=O)n(C)c(=O)n2C", scheme);
        assert_eq!(a, b);
        assert_eq!(a.len(), scheme.len());
        assert!(a.iter().any(|&bit| bit == 1));
        assert!(encode("C1CC(", scheme).iter().all(|&bit| bit == 0));
        assert!(encode("[CH255][H]", scheme).iter().all(|&bit| bit == 0));
        assert!(encode("[C-2147483648]", scheme).iter().all(|&bit| bit == 0));
    }
}

#[test]
fn test_encode_batch_keeps_every_row() {
    let table = compounds();
    let out = encode_batch(&table, FingerprintScheme::Morgan { radius: 2, n_bits: 64 }, "smiles").unwrap();
    assert_eq!(out.len(), table.len());
    assert_eq!(out.columns().len(), 2 + 64);
    // the broken structure row is all zeros
    assert!(out.rows()[4][2..].iter().all(|v| *v == Value::Int(0)));
}

trait EvaluateChecked {
    fn evaluate_checked(&self, smiles: &str) -> Measurement;
}

impl<T: ferroscreen_chem::PropertyEvaluator> EvaluateChecked for T {
    fn evaluate_checked(&self, smiles: &str) -> Measurement {
        self.evaluate(smiles).unwrap()
    }
}
