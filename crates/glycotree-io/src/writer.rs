//! JSON run report writer.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;

/// File name of the JSON report inside the output directory.
pub const REPORT_FILE: &str = "report.json";

/// Everything a run produced, as plain data.
///
/// Uses primitives only; the writer has no dependency on `glycotree-tree`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// URL or path the data came from.
    pub source: String,
    /// Total rows loaded.
    pub n_records: usize,
    /// Rows used for model selection.
    pub n_train: usize,
    /// Rows held out for evaluation.
    pub n_test: usize,
    /// Global seed.
    pub seed: u64,
    /// Split criterion name.
    pub criterion: String,
    /// Where imputation medians were fitted (`full` or `train`).
    pub impute_scope: String,
    /// Fitted median per sentinel column (`null` if the column was all zero).
    pub imputation_medians: BTreeMap<String, Option<f64>>,
    /// One entry per grid candidate, in enumeration order.
    pub cv_results: Vec<CandidateEntry>,
    /// Winning hyperparameters.
    pub best_params: ParamsEntry,
    /// Winner's mean cross-validated ROC-AUC.
    pub best_cv_roc_auc: f64,
    /// Holdout accuracy.
    pub accuracy: f64,
    /// Holdout ROC-AUC.
    pub roc_auc: f64,
    /// `confusion_matrix[true][predicted]`.
    pub confusion_matrix: Vec<Vec<usize>>,
    /// Per-class precision, recall, F1 and support.
    pub classes: Vec<ClassEntry>,
    /// Features by descending importance.
    pub feature_importances: Vec<FeatureEntry>,
    /// Shape of the refit tree.
    pub tree: TreeShape,
}

/// Hyperparameters of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamsEntry {
    /// `None` serializes as `null` (unlimited).
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
}

/// Cross-validation outcome of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateEntry {
    pub params: ParamsEntry,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
    pub rank: usize,
}

/// Holdout metrics for one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassEntry {
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// One ranked feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureEntry {
    pub name: String,
    pub importance: f64,
    pub rank: usize,
}

/// Size summary of a fitted tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreeShape {
    pub n_nodes: usize,
    pub n_leaves: usize,
    pub depth: usize,
}

/// Writes run artifacts into one output directory.
///
/// Creates the output directory on construction if it does not exist.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    /// Create a new writer targeting the given directory.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display()))]
    pub fn new(output_dir: &Path) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Return the output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Return `{output_dir}/{file_name}` without touching the filesystem.
    #[must_use]
    pub fn artifact_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Write `report` to `{output_dir}/report.json` and return the path.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all)]
    pub fn write_report(&self, report: &RunReport) -> Result<PathBuf, IoError> {
        let path = self.artifact_path(REPORT_FILE);
        let json =
            serde_json::to_string_pretty(report).map_err(|e| IoError::Serialize { source: e })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "run report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let writer = ReportWriter::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(writer.artifact_path("x.svg"), nested.join("x.svg"));
    }

    #[test]
    fn output_dir_blocked_by_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let err = ReportWriter::new(&blocker.join("sub")).unwrap_err();
        assert!(matches!(err, IoError::OutputDirCreate { .. }));
    }
}
