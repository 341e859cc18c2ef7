//! Live run against the public ChEMBL API.
//!
//! Requires network access. Run with:
//! ```bash
//! cargo test --package ferroscreen-ingestion --test test_chembl_live -- --ignored --nocapture
//! ```

use ferroscreen_common::RetrievalConfig;
use ferroscreen_ingestion::{ChemblClient, DataRequestPipeline, RetryPolicy, TargetSource};

fn client() -> ChemblClient {
    ChemblClient::from_config(&RetrievalConfig::default())
        .expect("Failed to build ChEMBL client")
        .with_retry(RetryPolicy::new(3, std::time::Duration::from_secs(2)).unwrap())
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires network access
async fn test_egfr_targets_resolve() {
    let targets = client().targets_for_accession("P00533").await.unwrap();
    println!("{} targets for P00533", targets.len());
    assert!(targets.iter().any(|t| t.target_chembl_id == "CHEMBL203"));
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires network access; slow (thousands of activities)
async fn test_egfr_pipeline() {
    let report = DataRequestPipeline::chembl(client()).run("P00533").await;

    println!("\n=== Pipeline Report ===");
    println!("Run ID: {}", report.run_id);
    println!("Target: {:?}", report.target);
    println!("Records: {}", report.records.len());
    println!("Duration: {}ms", report.duration_ms);
    if let Some(ref e) = report.error {
        println!("Error: {e}");
    }

    assert!(report.is_success());
    assert!(!report.records.is_empty(), "EGFR should have IC50 data");
    assert!(report.records.windows(2).all(|w| w[0].pic50 >= w[1].pic50));
}
