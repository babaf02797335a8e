//! Class-imbalance compensation via per-sample weights.

/// How training samples are weighted by class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassWeight {
    /// Every sample has weight 1.0.
    #[default]
    Uniform,
    /// Inverse-frequency weighting: `n_samples / (n_present_classes * count_c)`.
    Balanced,
}

impl ClassWeight {
    /// Compute one weight per sample for the given labels.
    ///
    /// `n_classes` sizes the per-class table; classes absent from `labels`
    /// do not count towards `n_present_classes`.
    #[must_use]
    pub fn sample_weights(&self, labels: &[usize], n_classes: usize) -> Vec<f64> {
        match self {
            ClassWeight::Uniform => vec![1.0; labels.len()],
            ClassWeight::Balanced => {
                let per_class = balanced_class_weights(labels, n_classes);
                labels.iter().map(|&l| per_class[l]).collect()
            }
        }
    }
}

/// Per-class balanced weights; absent classes get 0.0.
#[must_use]
pub fn balanced_class_weights(labels: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0usize; n_classes];
    for &l in labels {
        counts[l] += 1;
    }
    let n_present = counts.iter().filter(|&&c| c > 0).count();
    let n = labels.len() as f64;
    counts
        .iter()
        .map(|&c| {
            if c == 0 {
                0.0
            } else {
                n / (n_present as f64 * c as f64)
            }
        })
        .collect()
}
