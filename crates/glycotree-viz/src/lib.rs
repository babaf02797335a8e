//! SVG charts for the glycotree pipeline: ROC curve, tree diagram and
//! feature-importance bars.

mod error;
mod importance;
mod roc;
mod style;
mod tree;

pub use error::VizError;
pub use importance::render_importances;
pub use roc::render_roc;
pub use tree::render_tree;

/// File name of the ROC chart inside the output directory.
pub const ROC_FILE: &str = "roc_curve.svg";
/// File name of the tree diagram inside the output directory.
pub const TREE_FILE: &str = "decision_tree.svg";
/// File name of the importance chart inside the output directory.
pub const IMPORTANCE_FILE: &str = "feature_importance.svg";
