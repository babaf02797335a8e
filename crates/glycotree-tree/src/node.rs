use std::fmt;

/// Column of the feature matrix a split tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position in the row, and in the feature-name list.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Slot of a node in its tree's arena. Only meaningful for the tree that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gini or entropy of a node, whichever the tree was grown with.
///
/// Displays with three decimals, as in the tree diagram.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Impurity(f64);

impl Impurity {
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Impurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Per-node class statistics shared by split and leaf nodes.
///
/// `class_weights[c]` is the summed sample weight of class `c` among the
/// training rows that reached the node. With balanced class weighting these
/// are not integer counts.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStats {
    /// Weighted class totals, indexed by class.
    pub class_weights: Vec<f64>,
    /// Impurity computed from `class_weights`.
    pub impurity: Impurity,
    /// Unweighted number of training rows that reached the node.
    pub n_samples: usize,
}

impl NodeStats {
    /// Total sample weight at the node.
    #[must_use]
    pub fn weighted_n_samples(&self) -> f64 {
        self.class_weights.iter().sum()
    }

    /// Class with the largest weighted total; ties go to the lower index.
    #[must_use]
    pub fn majority_class(&self) -> usize {
        let mut best = 0;
        for (class, &w) in self.class_weights.iter().enumerate() {
            if w > self.class_weights[best] {
                best = class;
            }
        }
        best
    }

    /// Normalized class distribution (sums to 1.0 unless the node is empty).
    #[must_use]
    pub fn distribution(&self) -> Vec<f64> {
        let total = self.weighted_n_samples();
        if total <= 0.0 {
            return vec![0.0; self.class_weights.len()];
        }
        self.class_weights.iter().map(|&w| w / total).collect()
    }

    /// Share of the majority class, in `[1 / n_classes, 1.0]`.
    #[must_use]
    pub fn purity(&self) -> f64 {
        self.distribution()
            .get(self.majority_class())
            .copied()
            .unwrap_or(0.0)
    }
}

/// Arena entry of a [`crate::DecisionTree`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Sends rows with `row[feature] <= threshold` to `left`, the rest to `right`.
    Split {
        feature: FeatureIndex,
        threshold: f64,
        left: NodeIndex,
        right: NodeIndex,
        /// Statistics of every row reaching the node, before the split.
        stats: NodeStats,
        /// Weighted impurity removed by the split; feeds feature importances.
        impurity_decrease: f64,
    },
    Leaf {
        stats: NodeStats,
    },
}

impl Node {
    #[must_use]
    pub fn stats(&self) -> &NodeStats {
        match self {
            Node::Split { stats, .. } | Node::Leaf { stats } => stats,
        }
    }

    #[must_use]
    pub fn impurity(&self) -> Impurity {
        self.stats().impurity
    }

    /// Unweighted training rows that reached the node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.stats().n_samples
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}
