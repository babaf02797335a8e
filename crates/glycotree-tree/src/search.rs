//! Exhaustive grid search over tree hyperparameters, scored by stratified
//! k-fold cross-validated ROC-AUC.

use std::fmt;

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::cv::{Fold, StratifiedKFold};
use crate::error::TreeError;
use crate::holdout::TrainTestSplit;
use crate::roc::roc_auc;
use crate::tree::{DecisionTree, DecisionTreeConfig, validate_matrix};

/// Class index scored as positive during model selection.
pub const POSITIVE_CLASS: usize = 1;

/// One combination of the searched hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// Depth limit (`None` = unlimited).
    pub max_depth: Option<usize>,
    /// Minimum samples in each leaf.
    pub min_samples_leaf: usize,
}

impl TreeParams {
    /// Overlay these parameters on a base config.
    #[must_use]
    pub fn apply(&self, base: &DecisionTreeConfig) -> DecisionTreeConfig {
        base.clone()
            .with_max_depth(self.max_depth)
            .with_min_samples_leaf(self.min_samples_leaf)
    }
}

impl fmt::Display for TreeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_depth {
            Some(d) => write!(f, "max_depth={d}")?,
            None => write!(f, "max_depth=None")?,
        }
        write!(f, ", min_samples_leaf={}", self.min_samples_leaf)
    }
}

/// Cartesian product of candidate values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamGrid {
    max_depth: Vec<Option<usize>>,
    min_samples_leaf: Vec<usize>,
}

impl ParamGrid {
    /// Build a grid from per-axis candidate values.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::EmptyParamGrid`] if either axis has no values.
    pub fn new(
        max_depth: Vec<Option<usize>>,
        min_samples_leaf: Vec<usize>,
    ) -> Result<Self, TreeError> {
        if max_depth.is_empty() {
            return Err(TreeError::EmptyParamGrid { axis: "max_depth" });
        }
        if min_samples_leaf.is_empty() {
            return Err(TreeError::EmptyParamGrid {
                axis: "min_samples_leaf",
            });
        }
        Ok(Self {
            max_depth,
            min_samples_leaf,
        })
    }

    /// Every combination, `max_depth` varying slowest.
    #[must_use]
    pub fn candidates(&self) -> Vec<TreeParams> {
        self.max_depth
            .iter()
            .flat_map(|&max_depth| {
                self.min_samples_leaf
                    .iter()
                    .map(move |&min_samples_leaf| TreeParams {
                        max_depth,
                        min_samples_leaf,
                    })
            })
            .collect()
    }

    /// Number of combinations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.max_depth.len() * self.min_samples_leaf.len()
    }

    /// Always false: construction rejects empty axes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ParamGrid {
    /// `max_depth` in {3, 5, 10} by `min_samples_leaf` in {5, 10}.
    fn default() -> Self {
        Self {
            max_depth: vec![Some(3), Some(5), Some(10)],
            min_samples_leaf: vec![5, 10],
        }
    }
}

/// Cross-validated score of one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    /// The hyperparameters scored.
    pub params: TreeParams,
    /// ROC-AUC on each validation fold, in fold order.
    pub fold_scores: Vec<f64>,
    /// Mean of `fold_scores`.
    pub mean_score: f64,
    /// Population standard deviation of `fold_scores`.
    pub std_score: f64,
    /// 1-based rank by mean score; tied means share a rank.
    pub rank: usize,
}

/// Grid search configuration.
///
/// Construct via [`GridSearch::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `cv`      | 5 stratified folds, seed 42 |
///
/// Every fold fit uses the base config's criterion, class weighting and seed;
/// only the grid axes vary.
#[derive(Debug, Clone)]
pub struct GridSearch {
    base: DecisionTreeConfig,
    grid: ParamGrid,
    cv: StratifiedKFold,
}

/// Outcome of a grid search.
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    /// Every candidate in enumeration order.
    pub candidates: Vec<CandidateScore>,
    /// Index of the winner in `candidates`.
    pub best_index: usize,
    /// Winner refit on the full training data.
    pub best_estimator: DecisionTree,
}

impl GridSearchResult {
    /// Score of the winning candidate.
    #[must_use]
    pub fn best(&self) -> &CandidateScore {
        &self.candidates[self.best_index]
    }

    /// Hyperparameters of the winning candidate.
    #[must_use]
    pub fn best_params(&self) -> TreeParams {
        self.best().params
    }
}

impl GridSearch {
    /// Create a search over `grid` on top of `base`.
    #[must_use]
    pub fn new(base: DecisionTreeConfig, grid: ParamGrid) -> Self {
        let cv = StratifiedKFold::default().with_seed(base.seed());
        Self { base, grid, cv }
    }

    /// Replace the cross-validation splitter.
    #[must_use]
    pub fn with_cv(mut self, cv: StratifiedKFold) -> Self {
        self.cv = cv;
        self
    }

    /// Return the base tree config.
    #[must_use]
    pub fn base(&self) -> &DecisionTreeConfig {
        &self.base
    }

    /// Return the parameter grid.
    #[must_use]
    pub fn grid(&self) -> &ParamGrid {
        &self.grid
    }

    /// Return the cross-validation splitter.
    #[must_use]
    pub fn cv(&self) -> &StratifiedKFold {
        &self.cv
    }

    /// Score every candidate by k-fold ROC-AUC, pick the best, refit it.
    ///
    /// Fold fits run on the rayon pool; scores are collected back in
    /// enumeration order, so the winner (highest mean, earliest on ties) does
    /// not depend on scheduling.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | matrix errors from [`DecisionTreeConfig::fit`] | Bad shape or non-finite values |
    /// | [`TreeError::TooFewSamplesInClass`] | A class has fewer samples than folds |
    /// | [`TreeError::UndefinedRocAuc`] | A validation fold lacks a class |
    /// | any error from [`DecisionTreeConfig::validate`] | A candidate is out of range |
    #[instrument(skip_all, fields(
        n_candidates = self.grid.len(),
        n_folds = self.cv.n_folds(),
        n_samples = features.len(),
    ))]
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
    ) -> Result<GridSearchResult, TreeError> {
        validate_matrix(features, labels)?;
        let candidates = self.grid.candidates();
        for params in &candidates {
            params.apply(&self.base).validate()?;
        }

        let folds = self.cv.folds(labels)?;

        let n_folds = folds.len();
        let jobs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..n_folds).map(move |f| (c, f)))
            .collect();

        let scores: Vec<f64> = jobs
            .into_par_iter()
            .map(|(c, f)| self.score_fold(&candidates[c], &folds[f], features, labels))
            .collect::<Result<_, _>>()?;

        let mut results: Vec<CandidateScore> = candidates
            .iter()
            .zip(scores.chunks(n_folds))
            .map(|(&params, fold_scores)| {
                let (mean_score, std_score) = mean_std(fold_scores);
                CandidateScore {
                    params,
                    fold_scores: fold_scores.to_vec(),
                    mean_score,
                    std_score,
                    rank: 0,
                }
            })
            .collect();

        let means: Vec<f64> = results.iter().map(|r| r.mean_score).collect();
        for r in &mut results {
            r.rank = 1 + means.iter().filter(|&&m| m > r.mean_score).count();
        }

        let mut best_index = 0;
        for (i, r) in results.iter().enumerate() {
            debug!(params = %r.params, mean = r.mean_score, std = r.std_score, rank = r.rank, "candidate scored");
            if r.mean_score > results[best_index].mean_score {
                best_index = i;
            }
        }

        let best = &results[best_index];
        info!(params = %best.params, mean_auc = best.mean_score, "best candidate");

        let best_estimator = best.params.apply(&self.base).fit(features, labels)?;

        Ok(GridSearchResult {
            candidates: results,
            best_index,
            best_estimator,
        })
    }

    fn score_fold(
        &self,
        params: &TreeParams,
        fold: &Fold,
        features: &[Vec<f64>],
        labels: &[usize],
    ) -> Result<f64, TreeError> {
        let train_x = TrainTestSplit::select(features, &fold.train);
        let train_y = TrainTestSplit::select(labels, &fold.train);
        let val_x = TrainTestSplit::select(features, &fold.validation);
        let val_y = TrainTestSplit::select(labels, &fold.validation);

        let tree = params.apply(&self.base).fit(&train_x, &train_y)?;
        let scores = tree.predict_class_proba_batch(&val_x, POSITIVE_CLASS)?;
        roc_auc(&val_y, &scores, POSITIVE_CLASS)
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
