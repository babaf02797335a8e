//! Text classification report: per-class scores plus averaged rows.

use std::fmt;

use crate::confusion::{ClassMetrics, ConfusionMatrix};

/// Precision/recall/F1 summary for every class plus accuracy and averages.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    /// One entry per class, in class-index order.
    pub classes: Vec<ClassMetrics>,
    /// Overall accuracy.
    pub accuracy: f64,
    /// Unweighted mean of per-class scores.
    pub macro_avg: AverageMetrics,
    /// Support-weighted mean of per-class scores.
    pub weighted_avg: AverageMetrics,
    /// Total number of samples.
    pub support: usize,
    class_names: Vec<String>,
}

/// Averaged precision, recall and F1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ClassificationReport {
    /// Build the report from a confusion matrix.
    ///
    /// `class_names` label the rows; missing names fall back to the class index.
    #[must_use]
    pub fn from_confusion(cm: &ConfusionMatrix, class_names: &[&str]) -> Self {
        let classes = cm.class_metrics();
        let support = cm.total();
        let n = classes.len().max(1) as f64;

        let macro_avg = AverageMetrics {
            precision: classes.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: classes.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: classes.iter().map(|m| m.f1).sum::<f64>() / n,
        };

        let weighted = |score: fn(&ClassMetrics) -> f64| -> f64 {
            if support == 0 {
                return 0.0;
            }
            classes
                .iter()
                .map(|m| score(m) * m.support as f64)
                .sum::<f64>()
                / support as f64
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
        };

        let class_names = (0..classes.len())
            .map(|c| {
                class_names
                    .get(c)
                    .map_or_else(|| c.to_string(), |s| (*s).to_string())
            })
            .collect();

        Self {
            accuracy: cm.accuracy(),
            classes,
            macro_avg,
            weighted_avg,
            support,
            class_names,
        }
    }

    /// Row labels used when rendering.
    #[must_use]
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .class_names
            .iter()
            .map(String::len)
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (name, m) in self.class_names.iter().zip(&self.classes) {
            writeln!(
                f,
                "{name:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        for (label, avg) in [("macro avg", self.macro_avg), ("weighted avg", self.weighted_avg)] {
            writeln!(
                f,
                "{label:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ClassificationReport {
        // TN=3, FP=1, FN=2, TP=4
        let truth = vec![0, 0, 0, 0, 1, 1, 1, 1, 1, 1];
        let pred = vec![0, 0, 0, 1, 0, 0, 1, 1, 1, 1];
        let cm = ConfusionMatrix::from_labels(&truth, &pred, 2).unwrap();
        ClassificationReport::from_confusion(&cm, &["no diabetes", "diabetes"])
    }

    #[test]
    fn macro_average_is_unweighted_mean() {
        let r = report();
        assert!((r.macro_avg.precision - 0.7).abs() < 1e-12);
        assert!((r.macro_avg.recall - (0.75 + 4.0 / 6.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn weighted_average_uses_support() {
        let r = report();
        let expected = (0.6 * 4.0 + 0.8 * 6.0) / 10.0;
        assert!((r.weighted_avg.precision - expected).abs() < 1e-12);
        // Weighted recall always equals accuracy.
        assert!((r.weighted_avg.recall - r.accuracy).abs() < 1e-12);
    }

    #[test]
    fn display_has_all_rows() {
        let text = report().to_string();
        for needle in ["precision", "no diabetes", "diabetes", "accuracy", "macro avg", "weighted avg"] {
            assert!(text.contains(needle), "missing {needle} in\n{text}");
        }
        assert!(text.contains("0.70"));
    }

    #[test]
    fn unnamed_classes_fall_back_to_index() {
        let cm = ConfusionMatrix::from_labels(&[0, 1], &[0, 1], 2).unwrap();
        let r = ClassificationReport::from_confusion(&cm, &[]);
        assert_eq!(r.class_names(), &["0".to_string(), "1".to_string()]);
    }
}
