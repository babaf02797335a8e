//! Stratified, seeded train/test partitioning.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::error::TreeError;

/// Row indices of a train/test partition, each list ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    /// Rows used for model selection and fitting.
    pub train: Vec<usize>,
    /// Rows held out for evaluation.
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Gather the rows of `items` selected by `indices`.
    #[must_use]
    pub fn select<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
        indices.iter().map(|&i| items[i].clone()).collect()
    }
}

/// Partition row indices into train and test sets, preserving class proportions.
///
/// The test side receives `ceil(n * test_fraction)` rows. Each class gets the
/// floor of its proportional share, and the leftover rows go to the classes
/// with the largest fractional remainders (lower class index on ties). Rows
/// are drawn from a per-class shuffle seeded by `seed`, so the same inputs
/// always give the same partition.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`TreeError::EmptyDataset`] | No labels |
/// | [`TreeError::InvalidTestFraction`] | `test_fraction` not in (0, 1) |
/// | [`TreeError::TooFewSamplesInClass`] | A present class has a single member |
/// | [`TreeError::DegenerateSplit`] | Either side is smaller than the number of classes |
#[instrument(skip(labels), fields(n_samples = labels.len()))]
pub fn stratified_train_test_split(
    labels: &[usize],
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit, TreeError> {
    if labels.is_empty() {
        return Err(TreeError::EmptyDataset);
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(TreeError::InvalidTestFraction {
            fraction: test_fraction,
        });
    }

    let n = labels.len();
    let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;

    let mut class_indices: Vec<Vec<usize>> = vec![vec![]; n_classes];
    for (i, &label) in labels.iter().enumerate() {
        class_indices[label].push(i);
    }

    for (class, indices) in class_indices.iter().enumerate() {
        if indices.len() == 1 {
            return Err(TreeError::TooFewSamplesInClass {
                class,
                count: 1,
                required: 2,
            });
        }
    }

    let n_present = class_indices.iter().filter(|c| !c.is_empty()).count();
    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    let n_train = n - n_test;
    if n_train < n_present {
        return Err(TreeError::DegenerateSplit {
            side: "train",
            size: n_train,
            n_classes: n_present,
        });
    }
    if n_test < n_present {
        return Err(TreeError::DegenerateSplit {
            side: "test",
            size: n_test,
            n_classes: n_present,
        });
    }

    let test_counts = allocate(&class_indices, n_test, n);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (indices, &n_class_test) in class_indices.iter_mut().zip(&test_counts) {
        indices.shuffle(&mut rng);
        test.extend_from_slice(&indices[..n_class_test]);
        train.extend_from_slice(&indices[n_class_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();

    debug!(
        n_train = train.len(),
        n_test = test.len(),
        ?test_counts,
        "stratified split"
    );

    Ok(TrainTestSplit { train, test })
}

/// Split `total` draws across classes in proportion to their sizes.
fn allocate(class_indices: &[Vec<usize>], total: usize, n: usize) -> Vec<usize> {
    let shares: Vec<f64> = class_indices
        .iter()
        .map(|c| total as f64 * c.len() as f64 / n as f64)
        .collect();
    let mut counts: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();

    let assigned: usize = counts.iter().sum();
    let mut by_remainder: Vec<usize> = (0..shares.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = shares[a] - shares[a].floor();
        let rb = shares[b] - shares[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &class in by_remainder.iter().take(total - assigned) {
        counts[class] += 1;
    }
    counts
}
