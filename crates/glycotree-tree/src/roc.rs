//! Receiver operating characteristic curve and its area.

use crate::error::TreeError;

/// One operating point of a binary classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocPoint {
    /// Scores `>= threshold` are predicted positive.
    pub threshold: f64,
    /// False-positive rate at this threshold.
    pub fpr: f64,
    /// True-positive rate at this threshold.
    pub tpr: f64,
}

/// ROC curve over every distinct score, from (0, 0) to (1, 1).
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    points: Vec<RocPoint>,
    n_positive: usize,
    n_negative: usize,
}

impl RocCurve {
    /// Build the curve from binary labels (`positive_class` vs the rest) and scores.
    ///
    /// Thresholds are the distinct scores in descending order, preceded by
    /// `+inf` so the curve starts at the origin. Tied scores move both rates
    /// in one step, which makes the trapezoidal area count ties as half.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::EmptyDataset`] | No samples |
    /// | [`TreeError::LabelCountMismatch`] | `labels` and `scores` differ in length |
    /// | [`TreeError::UndefinedRocAuc`] | Only one class present |
    pub fn from_scores(
        labels: &[usize],
        scores: &[f64],
        positive_class: usize,
    ) -> Result<Self, TreeError> {
        if labels.is_empty() {
            return Err(TreeError::EmptyDataset);
        }
        if labels.len() != scores.len() {
            return Err(TreeError::LabelCountMismatch {
                n_features: scores.len(),
                n_labels: labels.len(),
            });
        }

        let n_positive = labels.iter().filter(|&&l| l == positive_class).count();
        let n_negative = labels.len() - n_positive;
        if n_positive == 0 || n_negative == 0 {
            return Err(TreeError::UndefinedRocAuc {
                n_positive,
                n_negative,
            });
        }

        let mut order: Vec<usize> = (0..labels.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut points = Vec::with_capacity(labels.len() + 1);
        points.push(RocPoint {
            threshold: f64::INFINITY,
            fpr: 0.0,
            tpr: 0.0,
        });

        let (mut tp, mut fp) = (0usize, 0usize);
        for (pos, &i) in order.iter().enumerate() {
            if labels[i] == positive_class {
                tp += 1;
            } else {
                fp += 1;
            }
            let last_of_tie = order
                .get(pos + 1)
                .is_none_or(|&next| scores[next] != scores[i]);
            if last_of_tie {
                points.push(RocPoint {
                    threshold: scores[i],
                    fpr: fp as f64 / n_negative as f64,
                    tpr: tp as f64 / n_positive as f64,
                });
            }
        }

        Ok(Self {
            points,
            n_positive,
            n_negative,
        })
    }

    /// Area under the curve by the trapezoidal rule.
    #[must_use]
    pub fn auc(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr) / 2.0)
            .sum()
    }

    /// Curve points in threshold-descending order.
    #[must_use]
    pub fn points(&self) -> &[RocPoint] {
        &self.points
    }

    /// Number of positive samples.
    #[must_use]
    pub fn n_positive(&self) -> usize {
        self.n_positive
    }

    /// Number of negative samples.
    #[must_use]
    pub fn n_negative(&self) -> usize {
        self.n_negative
    }
}

/// ROC-AUC of `scores` for `positive_class`.
///
/// # Errors
///
/// Same as [`RocCurve::from_scores`].
pub fn roc_auc(labels: &[usize], scores: &[f64], positive_class: usize) -> Result<f64, TreeError> {
    Ok(RocCurve::from_scores(labels, scores, positive_class)?.auc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_ranking_has_unit_area() {
        let auc = roc_auc(&[0, 0, 1, 1], &[0.1, 0.2, 0.8, 0.9], 1).unwrap();
        assert!((auc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn inverted_ranking_has_zero_area() {
        let auc = roc_auc(&[1, 1, 0, 0], &[0.1, 0.2, 0.8, 0.9], 1).unwrap();
        assert!(auc.abs() < 1e-12);
    }

    #[test]
    fn constant_scores_give_half() {
        let auc = roc_auc(&[0, 1, 0, 1, 1], &[0.5; 5], 1).unwrap();
        assert!((auc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn matches_pairwise_ranking_probability() {
        // Pairs (pos, neg): count pos > neg as 1, ties as 0.5.
        let labels = [0, 1, 0, 1, 1, 0, 0, 1];
        let scores = [0.1, 0.4, 0.35, 0.8, 0.35, 0.7, 0.2, 0.9];
        let mut wins = 0.0;
        let mut pairs = 0.0;
        for (i, &li) in labels.iter().enumerate() {
            for (j, &lj) in labels.iter().enumerate() {
                if li == 1 && lj == 0 {
                    pairs += 1.0;
                    if scores[i] > scores[j] {
                        wins += 1.0;
                    } else if scores[i] == scores[j] {
                        wins += 0.5;
                    }
                }
            }
        }
        let auc = roc_auc(&labels, &scores, 1).unwrap();
        assert!((auc - wins / pairs).abs() < 1e-12, "auc {auc} vs {}", wins / pairs);
    }

    #[test]
    fn curve_runs_from_origin_to_corner() {
        let curve = RocCurve::from_scores(&[0, 1, 1, 0], &[0.3, 0.6, 0.6, 0.1], 1).unwrap();
        let first = curve.points().first().unwrap();
        let last = curve.points().last().unwrap();
        assert_eq!((first.fpr, first.tpr), (0.0, 0.0));
        assert_eq!((last.fpr, last.tpr), (1.0, 1.0));
        // 0.6 (tied), 0.3, 0.1 plus the origin.
        assert_eq!(curve.points().len(), 4);
    }

    #[test]
    fn single_class_is_an_error() {
        let err = roc_auc(&[1, 1], &[0.2, 0.4], 1).unwrap_err();
        assert!(matches!(
            err,
            TreeError::UndefinedRocAuc {
                n_positive: 2,
                n_negative: 0
            }
        ));
    }
}
