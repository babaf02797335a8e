use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, instrument};

use crate::{
    TreeError,
    class_weight::ClassWeight,
    node::{Node, NodeIndex, NodeStats},
    split::{SplitContext, SplitCriterion, find_best_split},
};

/// Hyperparameters of a weighted CART classifier.
///
/// Start from [`DecisionTreeConfig::new`] and override with the `with_*`
/// setters. The grid search overlays `max_depth` and `min_samples_leaf` on a
/// base config and leaves the rest alone.
///
/// # Defaults
///
/// | Field               | Value          |
/// |---------------------|----------------|
/// | `criterion`         | `Gini`         |
/// | `max_depth`         | `None`         |
/// | `min_samples_split` | 2              |
/// | `min_samples_leaf`  | 1              |
/// | `class_weight`      | `Uniform`      |
/// | `seed`              | 42             |
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTreeConfig {
    criterion: SplitCriterion,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    class_weight: ClassWeight,
    seed: u64,
}

impl DecisionTreeConfig {
    /// Unlimited depth, single-sample leaves, Gini, no class weighting.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            class_weight: ClassWeight::Uniform,
            seed: 42,
        }
    }

    /// Impurity measure used to rank candidate thresholds.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Depth cap. The root sits at depth 0, so `Some(3)` allows three levels
    /// of splits below it; `None` grows until leaves are pure or too small.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Nodes with fewer rows than this become leaves.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Smallest row count either child may keep. Counts rows, not weight.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set how samples are weighted by class.
    #[must_use]
    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    /// Set the random seed used to order candidate features at each node.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    #[must_use]
    pub fn class_weight(&self) -> ClassWeight {
        self.class_weight
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Check the hyperparameters without fitting.
    ///
    /// # Errors
    ///
    /// | Variant                             | When                      |
    /// |-------------------------------------|---------------------------|
    /// | [`TreeError::InvalidMaxDepth`]        | `max_depth` is `Some(0)`  |
    /// | [`TreeError::InvalidMinSamplesSplit`] | `min_samples_split` < 2   |
    /// | [`TreeError::InvalidMinSamplesLeaf`]  | `min_samples_leaf` < 1    |
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.max_depth == Some(0) {
            return Err(TreeError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(TreeError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(TreeError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }
        Ok(())
    }

    /// Grow a tree on row-major `features` and zero-based class `labels`.
    ///
    /// Sample weights come from the configured [`ClassWeight`] and are
    /// computed from `labels` alone, so a CV fold gets weights from its own
    /// class counts.
    ///
    /// # Errors
    ///
    /// | Variant                                 | When                                  |
    /// |-----------------------------------------|---------------------------------------|
    /// | [`TreeError::EmptyDataset`]             | `features` is empty                   |
    /// | [`TreeError::LabelCountMismatch`]       | `features.len() != labels.len()`      |
    /// | [`TreeError::ZeroFeatures`]             | rows have zero feature columns        |
    /// | [`TreeError::FeatureCountMismatch`]     | rows have inconsistent lengths        |
    /// | [`TreeError::NonFiniteValue`]           | any value is NaN or infinite          |
    /// | any error from [`Self::validate`]       | hyperparameters out of range          |
    #[instrument(skip_all, fields(rows = features.len(), max_depth = ?self.max_depth, min_samples_leaf = self.min_samples_leaf))]
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, TreeError> {
        let n_features = validate_matrix(features, labels)?;
        self.validate()?;

        let n_classes = labels.iter().copied().max().map_or(1, |top| top + 1);
        let sample_weights = self.class_weight.sample_weights(labels, n_classes);

        // The split scan walks one column at a time.
        let columns: Vec<Vec<f64>> = (0..n_features)
            .map(|col| features.iter().map(|row| row[col]).collect())
            .collect();

        let ctx = SplitContext {
            features: &columns,
            labels,
            sample_weights: &sample_weights,
            n_classes,
            criterion: self.criterion,
            min_samples_leaf: self.min_samples_leaf,
        };

        let mut grower = Grower {
            ctx: &ctx,
            config: self,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            arena: Vec::new(),
        };
        let all_rows: Vec<usize> = (0..features.len()).collect();
        grower.grow(&all_rows, 0);

        debug!(
            n_nodes = grower.arena.len(),
            n_classes,
            class_weight = ?self.class_weight,
            "tree grown"
        );

        Ok(DecisionTree {
            nodes: grower.arena,
            n_features,
            n_classes,
            criterion: self.criterion,
        })
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Check shape and finiteness of a training matrix; returns the feature count.
pub(crate) fn validate_matrix(features: &[Vec<f64>], labels: &[usize]) -> Result<usize, TreeError> {
    if features.is_empty() {
        return Err(TreeError::EmptyDataset);
    }
    if features.len() != labels.len() {
        return Err(TreeError::LabelCountMismatch {
            n_features: features.len(),
            n_labels: labels.len(),
        });
    }
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(TreeError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(TreeError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(TreeError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Recursive tree builder that appends nodes to an arena in pre-order.
struct Grower<'a> {
    ctx: &'a SplitContext<'a>,
    config: &'a DecisionTreeConfig,
    rng: ChaCha8Rng,
    arena: Vec<Node>,
}

impl Grower<'_> {
    /// Grow the subtree for `rows` at `depth` and return its root.
    fn grow(&mut self, rows: &[usize], depth: usize) -> NodeIndex {
        let stats = self.node_stats(rows);

        let at_depth_cap = self.config.max_depth.is_some_and(|cap| depth >= cap);
        let too_small = rows.len() < self.config.min_samples_split
            || rows.len() < 2 * self.config.min_samples_leaf;
        let pure = stats.impurity.value() <= f64::EPSILON;

        let split = if at_depth_cap || too_small || pure {
            None
        } else {
            find_best_split(self.ctx, rows, &stats.class_weights, &mut self.rng)
        };

        let slot = NodeIndex::new(self.arena.len());
        let Some(split) = split else {
            self.arena.push(Node::Leaf { stats });
            return slot;
        };

        // Placeholder keeps the parent ahead of its children in the arena.
        self.arena.push(Node::Leaf {
            stats: stats.clone(),
        });
        let left = self.grow(&split.left_indices, depth + 1);
        let right = self.grow(&split.right_indices, depth + 1);

        self.arena[slot.index()] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            stats,
            impurity_decrease: split.impurity_decrease,
        };
        slot
    }

    fn node_stats(&self, rows: &[usize]) -> NodeStats {
        let mut class_weights = vec![0.0f64; self.ctx.n_classes];
        for &row in rows {
            class_weights[self.ctx.labels[row]] += self.ctx.sample_weights[row];
        }
        let total: f64 = class_weights.iter().sum();
        NodeStats {
            impurity: self.config.criterion.impurity(&class_weights, total),
            class_weights,
            n_samples: rows.len(),
        }
    }
}

/// A fitted binary-split classification tree.
///
/// Nodes live in a pre-order arena with the root at index 0; children are
/// addressed by [`NodeIndex`].
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    n_classes: usize,
    criterion: SplitCriterion,
}

impl DecisionTree {
    /// Majority class (by weight) of the leaf `sample` falls into.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, TreeError> {
        self.check_width(sample)?;
        Ok(self.leaf_stats(sample).majority_class())
    }

    /// Return the weighted class distribution of the leaf the sample lands in.
    ///
    /// The returned `Vec` has length `n_classes` and sums to 1.0.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, TreeError> {
        self.check_width(sample)?;
        Ok(self.leaf_stats(sample).distribution())
    }

    /// [`Self::predict`] over many rows on the rayon pool.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, TreeError> {
        features
            .into_par_iter()
            .map(|row| self.predict(row))
            .collect()
    }

    /// Probability of `class` for each sample, in parallel.
    ///
    /// Classes the tree never saw during training score 0.0.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_class_proba_batch(
        &self,
        features: &[Vec<f64>],
        class: usize,
    ) -> Result<Vec<f64>, TreeError> {
        features
            .into_par_iter()
            .map(|sample| {
                self.predict_proba(sample)
                    .map(|p| p.get(class).copied().unwrap_or(0.0))
            })
            .collect()
    }

    /// Gini/entropy importance per feature column.
    ///
    /// Each split credits its weighted impurity decrease to its feature and
    /// the per-feature sums are scaled to total 1.0. A tree with no splits
    /// scores every feature 0.0.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut credit = vec![0.0f64; self.n_features];
        let splits = self.nodes.iter().filter_map(|node| match node {
            Node::Split {
                feature,
                impurity_decrease,
                ..
            } => Some((feature.index(), *impurity_decrease)),
            Node::Leaf { .. } => None,
        });
        for (col, gain) in splits {
            credit[col] += gain;
        }
        let total: f64 = credit.iter().sum();
        if total > 0.0 {
            for value in &mut credit {
                *value /= total;
            }
        }
        credit
    }

    /// Node stored at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` did not come from this tree.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.index()]
    }

    #[must_use]
    pub fn root(&self) -> NodeIndex {
        NodeIndex::new(0)
    }

    /// Width of the rows the tree was fitted on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    /// Splits plus leaves.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Length of the longest root-to-leaf path; a lone root leaf is depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth_below(self.root())
    }

    fn depth_below(&self, index: NodeIndex) -> usize {
        match self.node(index) {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => {
                1 + self.depth_below(*left).max(self.depth_below(*right))
            }
        }
    }

    fn check_width(&self, sample: &[f64]) -> Result<(), TreeError> {
        if sample.len() != self.n_features {
            return Err(TreeError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(())
    }

    /// Rows with `value <= threshold` descend left.
    fn leaf_stats(&self, sample: &[f64]) -> &NodeStats {
        let mut at = self.root();
        loop {
            match self.node(at) {
                Node::Leaf { stats } => return stats,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => at = if sample[feature.index()] <= *threshold { *left } else { *right },
            }
        }
    }
}
