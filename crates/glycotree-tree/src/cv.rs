//! Stratified k-fold assignment.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::error::TreeError;

/// Stratified k-fold configuration.
///
/// Construct via [`StratifiedKFold::new`], then chain `with_seed` if desired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StratifiedKFold {
    n_folds: usize,
    seed: u64,
}

impl Default for StratifiedKFold {
    /// Five folds, seed 42.
    fn default() -> Self {
        Self {
            n_folds: 5,
            seed: 42,
        }
    }
}

/// Train/validation row indices for one fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Rows the fold trains on.
    pub train: Vec<usize>,
    /// Rows the fold is scored on.
    pub validation: Vec<usize>,
}

impl StratifiedKFold {
    /// Create a new k-fold config with the given number of folds.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidFoldCount`] if `n_folds` < 2.
    pub fn new(n_folds: usize) -> Result<Self, TreeError> {
        if n_folds < 2 {
            return Err(TreeError::InvalidFoldCount { n_folds });
        }
        Ok(Self { n_folds, seed: 42 })
    }

    /// Set the random seed for within-class shuffling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of folds.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Assign every sample to a fold.
    ///
    /// Groups samples by class, shuffles within each class, then deals them
    /// round-robin across folds. The dealing position carries over from one
    /// class to the next so fold sizes differ by at most one.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::EmptyDataset`] | Zero samples |
    /// | [`TreeError::TooFewSamplesInClass`] | A present class has fewer samples than folds |
    pub fn assignments(&self, labels: &[usize]) -> Result<Vec<usize>, TreeError> {
        if labels.is_empty() {
            return Err(TreeError::EmptyDataset);
        }

        let mut by_class: Vec<Vec<usize>> = Vec::new();
        for (row, &label) in labels.iter().enumerate() {
            if by_class.len() <= label {
                by_class.resize_with(label + 1, Vec::new);
            }
            by_class[label].push(row);
        }

        if let Some((class, members)) = by_class
            .iter()
            .enumerate()
            .find(|(_, members)| !members.is_empty() && members.len() < self.n_folds)
        {
            return Err(TreeError::TooFewSamplesInClass {
                class,
                count: members.len(),
                required: self.n_folds,
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut fold_of = vec![0; labels.len()];
        let mut dealt = 0;
        for members in &mut by_class {
            members.shuffle(&mut rng);
            for &row in members.iter() {
                fold_of[row] = dealt % self.n_folds;
                dealt += 1;
            }
        }
        Ok(fold_of)
    }

    /// Materialize the folds as index lists.
    ///
    /// # Errors
    ///
    /// Same as [`Self::assignments`].
    pub fn folds(&self, labels: &[usize]) -> Result<Vec<Fold>, TreeError> {
        let assignments = self.assignments(labels)?;
        Ok((0..self.n_folds)
            .map(|fold| {
                let (validation, train): (Vec<usize>, Vec<usize>) =
                    (0..labels.len()).partition(|&i| assignments[i] == fold);
                Fold { train, validation }
            })
            .collect())
    }
}
