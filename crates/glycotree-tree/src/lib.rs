//! Decision-tree classification: fit, tune, evaluate.
//!
//! Provides a CART decision tree with Gini/Entropy split criteria and
//! balanced class weighting, stratified holdout and k-fold splitting, a
//! cross-validated grid search scored by ROC-AUC, and the holdout metrics
//! (accuracy, ROC curve, confusion matrix, classification report, ranked
//! feature importances).

mod class_weight;
mod confusion;
mod cv;
mod error;
mod evaluate;
mod holdout;
mod importance;
mod node;
mod report;
mod roc;
mod search;
mod split;
mod tree;

pub use class_weight::{ClassWeight, balanced_class_weights};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use cv::{Fold, StratifiedKFold};
pub use error::TreeError;
pub use evaluate::{Evaluation, evaluate};
pub use holdout::{TrainTestSplit, stratified_train_test_split};
pub use importance::{RankedFeature, rank_importances};
pub use node::{FeatureIndex, Impurity, Node, NodeIndex, NodeStats};
pub use report::{AverageMetrics, ClassificationReport};
pub use roc::{RocCurve, RocPoint, roc_auc};
pub use search::{CandidateScore, GridSearch, GridSearchResult, POSITIVE_CLASS, ParamGrid, TreeParams};
pub use split::SplitCriterion;
pub use tree::{DecisionTree, DecisionTreeConfig};
