//! Runs the `glycotree` binary end to end and checks its outputs.

use std::fmt::Write as _;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output};
use std::thread;

use tempfile::TempDir;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_glycotree"))
        .args(args)
        .arg("--quiet")
        .output()
        .expect("binary should start")
}

fn read_report(dir: &Path) -> serde_json::Value {
    let text = fs::read_to_string(dir.join("report.json")).expect("report.json should exist");
    serde_json::from_str(&text).expect("report.json should be valid JSON")
}

/// Deterministic 300-row table in the headerless Pima layout.
///
/// Glucose and BMI drive the outcome; every seventh row flips it. Insulin and
/// SkinThickness carry sentinel zeros.
fn synthetic_csv() -> String {
    let mut csv = String::new();
    for i in 0..300u32 {
        let glucose = 70 + (i * 37) % 130;
        let bmi = 18.0 + f64::from((i * 13) % 30);
        let insulin = if i % 3 == 0 { 0 } else { 40 + (i * 11) % 200 };
        let skin = if i % 5 == 0 { 0 } else { 10 + i % 40 };
        let age = 21 + (i * 7) % 50;
        let risky = f64::from(glucose) + 2.0 * bmi > 210.0;
        let outcome = u8::from(risky != (i % 7 == 0));
        writeln!(
            csv,
            "{},{glucose},{},{skin},{insulin},{bmi:.1},{:.3},{age},{outcome}",
            i % 12,
            60 + i % 30,
            0.1 + f64::from(i % 20) / 10.0,
        )
        .unwrap();
    }
    csv
}

fn write_synthetic_csv(path: &Path) {
    fs::write(path, synthetic_csv()).unwrap();
}

#[test]
fn local_csv_pipeline_writes_all_artifacts() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("pima.csv");
    write_synthetic_csv(&data);
    let out = dir.path().join("out");

    let output = run(&[
        "--data",
        data.to_str().unwrap(),
        "--output-dir",
        out.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    for needle in ["Best parameters:", "Accuracy:", "ROC-AUC:", "weighted avg", "Glucose"] {
        assert!(stdout.contains(needle), "missing {needle} in\n{stdout}");
    }

    for file in ["roc_curve.svg", "decision_tree.svg", "feature_importance.svg"] {
        assert!(out.join(file).is_file(), "{file} not written");
    }

    let report = read_report(&out);
    assert_eq!(report["n_records"], 300);
    assert_eq!(report["n_test"], 60);
    assert_eq!(report["cv_results"].as_array().unwrap().len(), 6);
    let cells: u64 = report["confusion_matrix"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|row| row.as_array().unwrap().iter().map(|v| v.as_u64().unwrap()))
        .sum();
    assert_eq!(cells, 60);
    assert!(report["accuracy"].as_f64().unwrap() > 0.6);
}

#[test]
fn train_scope_and_no_plots() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("pima.csv");
    write_synthetic_csv(&data);
    let out = dir.path().join("out");

    let output = run(&[
        "--data",
        data.to_str().unwrap(),
        "--output-dir",
        out.to_str().unwrap(),
        "--impute-scope",
        "train",
        "--criterion",
        "entropy",
        "--no-plots",
    ]);
    assert!(output.status.success());
    assert!(!out.join("roc_curve.svg").exists());

    let report = read_report(&out);
    assert_eq!(report["impute_scope"], "train");
    assert_eq!(report["criterion"], "entropy");
}

#[test]
fn unknown_criterion_fails() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("pima.csv");
    write_synthetic_csv(&data);
    let output = run(&["--data", data.to_str().unwrap(), "--criterion", "mse"]);
    assert!(!output.status.success());
}

#[test]
fn remote_url_is_fetched_and_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/pima.csv", listener.local_addr().unwrap());
    let body = synthetic_csv();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        write!(
            stream,
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
    });

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let output = run(&["--url", &url, "--output-dir", out.to_str().unwrap(), "--no-plots"]);
    server.join().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report = read_report(&out);
    assert_eq!(report["source"], url.as_str());
    assert_eq!(report["n_records"], 300);
    assert_eq!(report["n_test"], 60);
}

#[test]
fn remote_error_status_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/pima.csv", listener.local_addr().unwrap());
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 1024];
        let _ = stream.read(&mut buf).unwrap();
        stream
            .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .unwrap();
    });

    let output = run(&["--url", &url, "--no-plots"]);
    server.join().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("503"));
}

#[test]
fn missing_file_fails() {
    let output = run(&["--data", "/no/such/pima.csv"]);
    assert!(!output.status.success());
}

/// Fetches the canonical 768-row dataset; run with `cargo test -- --ignored`.
#[test]
#[ignore = "requires network access"]
fn canonical_dataset_metrics_in_expected_range() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let output = run(&["--output-dir", out.to_str().unwrap(), "--no-plots"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report = read_report(&out);
    assert_eq!(report["n_records"], 768);
    assert_eq!(report["n_test"], 154);

    let accuracy = report["accuracy"].as_f64().unwrap();
    let roc_auc = report["roc_auc"].as_f64().unwrap();
    assert!((0.65..=0.85).contains(&accuracy), "accuracy = {accuracy}");
    assert!((0.70..=0.90).contains(&roc_auc), "roc_auc = {roc_auc}");
}
