//! End-to-end integration tests: CSV -> impute -> JSON report -> deserialize.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use glycotree_io::{
    CandidateEntry, ClassEntry, DataSource, DatasetLoader, FEATURE_NAMES, FeatureEntry,
    MedianImputer, ParamsEntry, ReportWriter, RunReport, SENTINEL_COLUMNS, TreeShape,
    impute_zeros,
};
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture() -> glycotree_io::Dataset {
    DatasetLoader::default()
        .load(&DataSource::Local(fixture_path("pima_head.csv")))
        .expect("fixture should parse")
}

#[test]
fn fixture_loads_with_expected_shape() {
    let ds = load_fixture();
    assert_eq!(ds.len(), 20);
    assert_eq!(ds.class_counts(), (7, 13));
    // Insulin (column 4) is zero in 11 of the 20 rows.
    assert_eq!(ds.column(4).iter().filter(|&&v| v == 0.0).count(), 11);
}

#[test]
fn imputation_clears_sentinel_zeros() {
    let cleaned = impute_zeros(&load_fixture());
    for &col in &SENTINEL_COLUMNS {
        let min = cleaned.column(col).into_iter().fold(f64::INFINITY, f64::min);
        assert!(min > 0.0, "{} still has min {min}", FEATURE_NAMES[col]);
    }
    // Non-zero BMI values: 19 rows, median is the 10th smallest.
    let bmi = cleaned.column(5);
    assert!((bmi[9] - 30.5).abs() < 1e-12, "imputed BMI = {}", bmi[9]);
}

#[test]
fn train_scope_medians_differ_from_full() {
    let ds = load_fixture();
    let first_half: Vec<usize> = (0..10).collect();
    let all: Vec<usize> = (0..20).collect();
    let half: Vec<_> = MedianImputer::fit(&ds, &first_half).medians().collect();
    let full: Vec<_> = MedianImputer::fit(&ds, &all).medians().collect();
    assert_eq!(half.len(), 5);
    assert_ne!(half, full);
}

#[test]
fn report_round_trip() {
    let dir = TempDir::new().unwrap();
    let writer = ReportWriter::new(dir.path()).unwrap();

    let params = ParamsEntry {
        max_depth: Some(5),
        min_samples_leaf: 10,
    };
    let report = RunReport {
        source: "pima_head.csv".to_string(),
        n_records: 20,
        n_train: 16,
        n_test: 4,
        seed: 42,
        criterion: "gini".to_string(),
        impute_scope: "full".to_string(),
        imputation_medians: BTreeMap::from([
            ("Glucose".to_string(), Some(117.0)),
            ("Insulin".to_string(), None),
        ]),
        cv_results: vec![CandidateEntry {
            params,
            fold_scores: vec![0.7, 0.8],
            mean_score: 0.75,
            std_score: 0.05,
            rank: 1,
        }],
        best_params: params,
        best_cv_roc_auc: 0.75,
        accuracy: 0.75,
        roc_auc: 0.8,
        confusion_matrix: vec![vec![1, 1], vec![0, 2]],
        classes: vec![ClassEntry {
            name: "diabetes".to_string(),
            precision: 2.0 / 3.0,
            recall: 1.0,
            f1: 0.8,
            support: 2,
        }],
        feature_importances: vec![FeatureEntry {
            name: "Glucose".to_string(),
            importance: 1.0,
            rank: 1,
        }],
        tree: TreeShape {
            n_nodes: 3,
            n_leaves: 2,
            depth: 1,
        },
    };

    let path = writer.write_report(&report).unwrap();
    assert_eq!(path, dir.path().join("report.json"));

    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(content["n_test"], 4);
    assert_eq!(content["best_params"]["max_depth"], 5);
    assert!(content["imputation_medians"]["Insulin"].is_null());
    assert_eq!(content["confusion_matrix"][1][1], 2);
    assert_eq!(content["cv_results"][0]["fold_scores"].as_array().unwrap().len(), 2);
    assert_eq!(content["tree"]["n_leaves"], 2);
}
