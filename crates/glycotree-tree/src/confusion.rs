//! Confusion matrix and per-class classification metrics.

use std::fmt;

use crate::error::TreeError;

/// Counts of (actual, predicted) class pairs.
///
/// `matrix[a][p]` is the number of samples of class `a` predicted as `p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    n_classes: usize,
}

/// Scores of one class treated as positive against all others.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    /// The class index.
    pub class: usize,
    /// Correct predictions of the class over all predictions of it; 0.0 when never predicted.
    pub precision: f64,
    /// Correct predictions of the class over its true samples; 0.0 when absent.
    pub recall: f64,
    /// Harmonic mean of precision and recall; 0.0 when both are zero.
    pub f1: f64,
    /// True samples of the class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from true and predicted labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::EmptyDataset`] | Zero labels provided |
    /// | [`TreeError::LabelCountMismatch`] | Slices differ in length |
    pub fn from_labels(
        true_labels: &[usize],
        predicted: &[usize],
        n_classes: usize,
    ) -> Result<Self, TreeError> {
        if true_labels.is_empty() {
            return Err(TreeError::EmptyDataset);
        }
        if true_labels.len() != predicted.len() {
            return Err(TreeError::LabelCountMismatch {
                n_features: predicted.len(),
                n_labels: true_labels.len(),
            });
        }
        let n_classes = true_labels
            .iter()
            .chain(predicted)
            .max()
            .map_or(n_classes, |&m| n_classes.max(m + 1));
        let mut matrix = vec![vec![0usize; n_classes]; n_classes];
        for (&t, &p) in true_labels.iter().zip(predicted.iter()) {
            matrix[t][p] += 1;
        }
        Ok(Self { matrix, n_classes })
    }

    /// Overall accuracy: diagonal sum over total.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.correct() as f64 / total as f64
        }
    }

    /// Number of correctly classified samples (diagonal sum).
    #[must_use]
    pub fn correct(&self) -> usize {
        (0..self.n_classes).map(|i| self.matrix[i][i]).sum()
    }

    /// Total number of samples counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flat_map(|row| row.iter()).sum()
    }

    /// One-vs-rest precision, recall, F1 and support for every class.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        (0..self.n_classes)
            .map(|c| {
                let hits = self.matrix[c][c];
                let predicted = self.column_sum(c);
                let support = self.row_sum(c);
                let precision = ratio(hits, predicted);
                let recall = ratio(hits, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    class: c,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Rows of counts, indexed `[actual][predicted]`.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Samples whose true class is `class`.
    fn row_sum(&self, class: usize) -> usize {
        self.matrix[class].iter().sum()
    }

    /// Samples predicted as `class`.
    fn column_sum(&self, class: usize) -> usize {
        self.matrix.iter().map(|row| row[class]).sum()
    }
}

/// `num / den`, or 0.0 when nothing was counted.
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Actual classes down the side, predicted classes across the top.
impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>12}", "actual\\pred")?;
        for c in 0..self.n_classes {
            write!(f, "{c:>8}")?;
        }
        writeln!(f)?;
        for (c, row) in self.matrix.iter().enumerate() {
            write!(f, "{c:>12}")?;
            for count in row {
                write!(f, "{count:>8}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
