//! Median imputation of sentinel zeros.

use tracing::{debug, info, instrument, warn};

use crate::domain::{Dataset, FEATURE_NAMES, SENTINEL_COLUMNS};

/// Per-column medians learned from a subset of rows.
///
/// Only the [`SENTINEL_COLUMNS`] are touched. A zero in one of them is treated
/// as a missing measurement and replaced with the median of that column's
/// non-zero values over the fitted rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MedianImputer {
    medians: [Option<f64>; SENTINEL_COLUMNS.len()],
}

impl MedianImputer {
    /// Learn medians from `rows` of `dataset`.
    ///
    /// A column whose fitted rows are all zero gets no median and is left
    /// untouched by [`Self::transform`].
    ///
    /// # Panics
    ///
    /// Panics if any index in `rows` is out of bounds.
    #[must_use]
    #[instrument(skip_all, fields(n_rows = rows.len()))]
    pub fn fit(dataset: &Dataset, rows: &[usize]) -> Self {
        let records = dataset.records();
        let mut medians = [None; SENTINEL_COLUMNS.len()];
        for (slot, &col) in medians.iter_mut().zip(&SENTINEL_COLUMNS) {
            let mut present: Vec<f64> = rows
                .iter()
                .map(|&r| records[r].features[col])
                .filter(|&v| v != 0.0)
                .collect();
            *slot = median(&mut present);
            match *slot {
                Some(m) => debug!(column = FEATURE_NAMES[col], median = m, "fitted median"),
                None => warn!(
                    column = FEATURE_NAMES[col],
                    "column has no non-zero values; zeros left in place"
                ),
            }
        }
        Self { medians }
    }

    /// Return a copy of `dataset` with sentinel zeros replaced.
    #[must_use]
    #[instrument(skip_all, fields(n_records = dataset.len()))]
    pub fn transform(&self, dataset: &Dataset) -> Dataset {
        let mut replaced = [0usize; SENTINEL_COLUMNS.len()];
        let records = dataset
            .records()
            .iter()
            .map(|record| {
                let mut record = record.clone();
                for ((&col, median), count) in
                    SENTINEL_COLUMNS.iter().zip(&self.medians).zip(&mut replaced)
                {
                    if let Some(m) = median
                        && record.features[col] == 0.0
                    {
                        record.features[col] = *m;
                        *count += 1;
                    }
                }
                record
            })
            .collect();

        for (&col, &count) in SENTINEL_COLUMNS.iter().zip(&replaced) {
            if count > 0 {
                info!(column = FEATURE_NAMES[col], replaced = count, "imputed zeros");
            }
        }

        Dataset::new(records)
    }

    /// Fitted medians by column name; `None` where the column had no non-zero values.
    pub fn medians(&self) -> impl Iterator<Item = (&'static str, Option<f64>)> + '_ {
        SENTINEL_COLUMNS
            .iter()
            .zip(&self.medians)
            .map(|(&col, &m)| (FEATURE_NAMES[col], m))
    }
}

/// Replace sentinel zeros with medians computed over the whole dataset.
#[must_use]
pub fn impute_zeros(dataset: &Dataset) -> Dataset {
    let rows: Vec<usize> = (0..dataset.len()).collect();
    MedianImputer::fit(dataset, &rows).transform(dataset)
}

/// Median of `values`; the mean of the two middle values for even lengths.
///
/// Reorders `values`. Returns `None` when empty.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}
