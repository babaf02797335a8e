//! Holdout evaluation of a fitted tree.

use tracing::{info, instrument};

use crate::confusion::ConfusionMatrix;
use crate::error::TreeError;
use crate::report::ClassificationReport;
use crate::roc::RocCurve;
use crate::search::POSITIVE_CLASS;
use crate::tree::DecisionTree;

/// Every holdout metric for one model.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Fraction of correct hard predictions.
    pub accuracy: f64,
    /// ROC curve of the positive-class probability.
    pub roc: RocCurve,
    /// Area under `roc`.
    pub roc_auc: f64,
    /// `matrix[true][predicted]` counts.
    pub confusion: ConfusionMatrix,
    /// Per-class precision, recall, F1 and support.
    pub report: ClassificationReport,
    /// Hard predictions, in input order.
    pub predictions: Vec<usize>,
    /// Positive-class probabilities, in input order.
    pub probabilities: Vec<f64>,
}

/// Score `tree` on a holdout set.
///
/// `class_names` label the report rows.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`TreeError::EmptyDataset`] | No holdout samples |
/// | [`TreeError::LabelCountMismatch`] | `features` and `labels` differ in length |
/// | [`TreeError::PredictionFeatureMismatch`] | A row has the wrong width |
/// | [`TreeError::UndefinedRocAuc`] | The holdout holds a single class |
#[instrument(skip_all, fields(n_samples = features.len()))]
pub fn evaluate(
    tree: &DecisionTree,
    features: &[Vec<f64>],
    labels: &[usize],
    class_names: &[&str],
) -> Result<Evaluation, TreeError> {
    if features.is_empty() {
        return Err(TreeError::EmptyDataset);
    }
    if features.len() != labels.len() {
        return Err(TreeError::LabelCountMismatch {
            n_features: features.len(),
            n_labels: labels.len(),
        });
    }

    let predictions = tree.predict_batch(features)?;
    let probabilities = tree.predict_class_proba_batch(features, POSITIVE_CLASS)?;

    let confusion = ConfusionMatrix::from_labels(labels, &predictions, tree.n_classes().max(2))?;
    let roc = RocCurve::from_scores(labels, &probabilities, POSITIVE_CLASS)?;
    let roc_auc = roc.auc();
    let accuracy = confusion.accuracy();
    let report = ClassificationReport::from_confusion(&confusion, class_names);

    info!(accuracy, roc_auc, "holdout evaluation");

    Ok(Evaluation {
        accuracy,
        roc,
        roc_auc,
        confusion,
        report,
        predictions,
        probabilities,
    })
}
