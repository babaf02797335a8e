/// Errors from tree fitting, data splitting, model selection and scoring.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid min_samples_leaf value provided.
        min_samples_leaf: usize,
    },

    /// Returned when n_folds is less than 2.
    #[error("n_folds must be at least 2, got {n_folds}")]
    InvalidFoldCount {
        /// The invalid n_folds value provided.
        n_folds: usize,
    },

    /// Returned when the holdout fraction is not strictly between 0 and 1.
    #[error("test fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidTestFraction {
        /// The invalid fraction.
        fraction: f64,
    },

    /// Returned when a parameter grid has no candidates.
    #[error("parameter grid is empty: {axis} has no values")]
    EmptyParamGrid {
        /// Name of the axis with no values.
        axis: &'static str,
    },

    /// Returned when the dataset has zero samples.
    #[error("dataset has zero samples")]
    EmptyDataset,

    /// Returned when the dataset has zero feature columns.
    #[error("dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when features and labels have different lengths.
    #[error("got {n_features} feature rows but {n_labels} labels")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_features: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a class has fewer samples than a stratified split requires.
    #[error("class {class} has only {count} samples, need at least {required} for a stratified split")]
    TooFewSamplesInClass {
        /// The class label with insufficient samples.
        class: usize,
        /// The number of samples belonging to that class.
        count: usize,
        /// Minimum number of samples required.
        required: usize,
    },

    /// Returned when one side of a train/test split cannot hold every class.
    #[error("{side} set of {size} samples cannot hold all {n_classes} classes")]
    DegenerateSplit {
        /// Which side of the split is too small ("train" or "test").
        side: &'static str,
        /// Number of samples assigned to that side.
        size: usize,
        /// Number of distinct classes.
        n_classes: usize,
    },

    /// Returned when ROC analysis sees only one class among the true labels.
    #[error("ROC-AUC is undefined: {n_positive} positive and {n_negative} negative samples")]
    UndefinedRocAuc {
        /// Number of positive samples.
        n_positive: usize,
        /// Number of negative samples.
        n_negative: usize,
    },
}
