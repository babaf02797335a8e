use rand::Rng;
use rand::seq::SliceRandom;

use crate::node::{FeatureIndex, Impurity};

/// Impurity measure a tree minimises when choosing thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitCriterion {
    /// `1 - Σ p²`
    Gini,
    /// `-Σ p·log2(p)`, in bits.
    Entropy,
}

impl SplitCriterion {
    /// Impurity of a node holding `class_weights`, whose sum is `total`.
    ///
    /// An empty node (non-positive `total`) is treated as pure.
    #[must_use]
    pub fn impurity(&self, class_weights: &[f64], total: f64) -> Impurity {
        if total <= 0.0 {
            return Impurity::new(0.0);
        }
        let shares = class_weights.iter().map(|&w| w / total);
        let value = match self {
            SplitCriterion::Gini => 1.0 - shares.map(|p| p * p).sum::<f64>(),
            SplitCriterion::Entropy => -shares
                .filter(|&p| p > 0.0)
                .map(|p| p * p.log2())
                .sum::<f64>(),
        };
        // Rounding can leave a pure node at -1e-17.
        Impurity::new(value.max(0.0))
    }

    /// Lower-case name used in reports and tree diagrams.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SplitCriterion::Gini => "gini",
            SplitCriterion::Entropy => "entropy",
        }
    }
}

/// Chosen threshold for a node and the rows on each side of it.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    /// Rows with `value <= threshold` go left.
    pub(crate) threshold: f64,
    /// `N_t·i(t) - N_l·i(l) - N_r·i(r)` in sample weight, never negative.
    pub(crate) impurity_decrease: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Per-node inputs shared by every candidate feature.
pub(crate) struct SplitContext<'a> {
    /// Column-major: `features[column][row]`.
    pub(crate) features: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) sample_weights: &'a [f64],
    pub(crate) n_classes: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) min_samples_leaf: usize,
}

/// Best cut found in one column: `(decrease, threshold)`.
type Cut = (f64, f64);

/// Search every column, in a seeded random order, for the cut with the
/// largest weighted impurity decrease.
///
/// Columns are compared with a strict `>`, so when two columns give the same
/// decrease the one visited first is kept and the shuffle is the only source
/// of randomness.
///
/// Returns `None` when every column is constant over `rows` or every
/// boundary would leave a child with fewer than `min_samples_leaf` rows.
pub(crate) fn find_best_split(
    ctx: &SplitContext<'_>,
    rows: &[usize],
    parent_weights: &[f64],
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    if rows.len() < 2 || rows.len() < 2 * ctx.min_samples_leaf || ctx.features.is_empty() {
        return None;
    }

    let mut columns: Vec<usize> = (0..ctx.features.len()).collect();
    columns.shuffle(rng);

    let mut best: Option<(usize, Cut)> = None;
    for col in columns {
        let Some(cut) = scan_column(ctx, col, rows, parent_weights) else {
            continue;
        };
        if best.is_none_or(|(_, (top, _))| cut.0 > top) {
            best = Some((col, cut));
        }
    }

    let (col, (decrease, threshold)) = best?;
    let values = &ctx.features[col];
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) =
        rows.iter().partition(|&&row| values[row] <= threshold);

    Some(SplitResult {
        feature: FeatureIndex::new(col),
        threshold,
        impurity_decrease: decrease.max(0.0),
        left_indices,
        right_indices,
    })
}

/// Sweep one column's sorted values, moving rows from the right child to the
/// left, and return the best admissible cut.
fn scan_column(
    ctx: &SplitContext<'_>,
    col: usize,
    rows: &[usize],
    parent_weights: &[f64],
) -> Option<Cut> {
    let values = &ctx.features[col];
    let mut order: Vec<(f64, usize)> = rows.iter().map(|&row| (values[row], row)).collect();
    order.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let n = order.len();
    if order[0].0 == order[n - 1].0 {
        return None;
    }

    let parent_total: f64 = parent_weights.iter().sum();
    let parent_cost = parent_total * ctx.criterion.impurity(parent_weights, parent_total).value();

    let mut left = vec![0.0f64; ctx.n_classes];
    let mut right = parent_weights.to_vec();
    let mut left_total = 0.0f64;
    let mut best: Option<Cut> = None;

    for (k, pair) in order.windows(2).enumerate() {
        let ((here, row), (next, _)) = (pair[0], pair[1]);
        let w = ctx.sample_weights[row];
        let class = ctx.labels[row];
        left[class] += w;
        right[class] -= w;
        left_total += w;

        let n_left = k + 1;
        if here == next || n_left < ctx.min_samples_leaf || n - n_left < ctx.min_samples_leaf {
            continue;
        }

        let right_total = parent_total - left_total;
        let decrease = parent_cost
            - left_total * ctx.criterion.impurity(&left, left_total).value()
            - right_total * ctx.criterion.impurity(&right, right_total).value();

        if best.is_none_or(|(top, _)| decrease > top) {
            let mid = (here + next) / 2.0;
            // Adjacent floats can have a midpoint equal to the upper value.
            let threshold = if mid == next { here } else { mid };
            best = Some((decrease, threshold));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{SplitContext, SplitCriterion, find_best_split};

    fn run(
        features: &[Vec<f64>],
        labels: &[usize],
        weights: &[f64],
        min_samples_leaf: usize,
    ) -> Option<super::SplitResult> {
        let ctx = SplitContext {
            features,
            labels,
            sample_weights: weights,
            n_classes: 2,
            criterion: SplitCriterion::Gini,
            min_samples_leaf,
        };
        let indices: Vec<usize> = (0..labels.len()).collect();
        let mut parent = vec![0.0; 2];
        for &i in &indices {
            parent[labels[i]] += weights[i];
        }
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        find_best_split(&ctx, &indices, &parent, &mut rng)
    }

    #[test]
    fn gini_pure() {
        let imp = SplitCriterion::Gini.impurity(&[10.0, 0.0], 10.0);
        assert!(imp.value().abs() < f64::EPSILON);
    }

    #[test]
    fn gini_binary_balanced() {
        let imp = SplitCriterion::Gini.impurity(&[5.0, 5.0], 10.0);
        assert!((imp.value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn gini_is_scale_invariant() {
        let a = SplitCriterion::Gini.impurity(&[3.0, 1.0], 4.0);
        let b = SplitCriterion::Gini.impurity(&[1.5, 0.5], 2.0);
        assert!((a.value() - b.value()).abs() < 1e-12);
    }

    #[test]
    fn entropy_binary_balanced_is_one_bit() {
        let imp = SplitCriterion::Entropy.impurity(&[5.0, 5.0], 10.0);
        assert!((imp.value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn separable_data_finds_correct_split() {
        let features = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let split = run(&features, &labels, &[1.0; 6], 1).expect("should find a split");
        assert_eq!(split.feature.index(), 0);
        assert!((split.threshold - 6.5).abs() < 1e-12);
        assert_eq!(split.left_indices, vec![0, 1, 2]);
        assert_eq!(split.right_indices, vec![3, 4, 5]);
        // Parent gini 0.5 over 6 samples, both children pure.
        assert!((split.impurity_decrease - 3.0).abs() < 1e-12);
    }

    #[test]
    fn weights_move_the_best_threshold() {
        // Unweighted, the cuts at 1.5 and 3.5 tie and the first one wins.
        // A heavy last row makes isolating it strictly better.
        let features = vec![vec![1.0, 2.0, 3.0, 4.0]];
        let labels = vec![0, 1, 1, 0];
        let unweighted = run(&features, &labels, &[1.0; 4], 1).unwrap();
        let weighted = run(&features, &labels, &[1.0, 1.0, 1.0, 10.0], 1).unwrap();
        assert_ne!(unweighted.threshold, weighted.threshold);
    }

    #[test]
    fn constant_feature_returns_none() {
        let features = vec![vec![5.0, 5.0, 5.0, 5.0]];
        let labels = vec![0, 0, 1, 1];
        assert!(run(&features, &labels, &[1.0; 4], 1).is_none());
    }

    #[test]
    fn min_samples_leaf_enforced() {
        let features = vec![vec![1.0, 10.0, 11.0]];
        let labels = vec![0, 1, 1];
        assert!(run(&features, &labels, &[1.0; 3], 2).is_none());
    }

    #[test]
    fn min_samples_leaf_shifts_boundary() {
        // The pure cut would leave one sample on the left.
        let features = vec![vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]];
        let labels = vec![0, 1, 1, 1, 1, 1];
        let split = run(&features, &labels, &[1.0; 6], 2).unwrap();
        assert!(split.left_indices.len() >= 2);
        assert!(split.right_indices.len() >= 2);
    }
}
