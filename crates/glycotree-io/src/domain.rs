//! Domain types for glycotree-io.

use std::fmt;

/// Column names of the Pima diabetes table, in file order.
pub const COLUMN_NAMES: [&str; 9] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
    "Outcome",
];

/// Number of measurement columns (everything but Outcome).
pub const N_FEATURES: usize = 8;

/// Measurement column names, in file order.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// Feature columns where a recorded zero means "not measured".
pub const SENTINEL_COLUMNS: [usize; 5] = [1, 2, 3, 4, 5];

/// Diagnosis label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// No diabetes (class 0).
    Negative,
    /// Diabetes (class 1).
    Positive,
}

impl Outcome {
    /// Report row labels, indexed by class.
    pub const CLASS_NAMES: [&'static str; 2] = ["no diabetes", "diabetes"];

    /// Zero-based class index.
    #[must_use]
    pub fn class_index(self) -> usize {
        match self {
            Self::Negative => 0,
            Self::Positive => 1,
        }
    }

    /// Parse the raw Outcome cell; accepts `0`/`1` and `0.0`/`1.0`.
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.parse::<f64>().ok()? {
            v if v == 0.0 => Some(Self::Negative),
            v if v == 1.0 => Some(Self::Positive),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::CLASS_NAMES[self.class_index()])
    }
}

/// One patient row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Measurements in [`FEATURE_NAMES`] order.
    pub features: [f64; N_FEATURES],
    /// Diagnosis.
    pub outcome: Outcome,
}

/// An ordered, non-empty table of records.
///
/// Produced by [`DatasetLoader`](crate::DatasetLoader); cleaning returns a
/// new dataset rather than mutating this one.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub(crate) fn new(records: Vec<Record>) -> Self {
        debug_assert!(!records.is_empty(), "dataset must not be empty");
        Self { records }
    }

    /// Build a dataset from in-memory records.
    ///
    /// Returns `None` when `records` is empty.
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Option<Self> {
        (!records.is_empty()).then(|| Self::new(records))
    }

    /// Return the records in file order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Return the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false: datasets are non-empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return the measurement column names as owned strings.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect()
    }

    /// Return the measurements as a row-major matrix.
    #[must_use]
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.records.iter().map(|r| r.features.to_vec()).collect()
    }

    /// Return the class index of every record.
    #[must_use]
    pub fn labels(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.outcome.class_index()).collect()
    }

    /// Return one measurement column.
    ///
    /// # Panics
    ///
    /// Panics if `feature >= N_FEATURES`.
    #[must_use]
    pub fn column(&self, feature: usize) -> Vec<f64> {
        self.records.iter().map(|r| r.features[feature]).collect()
    }

    /// Count records per outcome as `(negative, positive)`.
    #[must_use]
    pub fn class_counts(&self) -> (usize, usize) {
        let positive = self
            .records
            .iter()
            .filter(|r| r.outcome == Outcome::Positive)
            .count();
        (self.records.len() - positive, positive)
    }
}
