//! Data acquisition, cleaning and report output for the glycotree pipeline.

mod clean;
mod domain;
mod error;
mod loader;
mod writer;

pub use clean::{MedianImputer, impute_zeros, median};
pub use domain::{
    COLUMN_NAMES, Dataset, FEATURE_NAMES, N_FEATURES, Outcome, Record, SENTINEL_COLUMNS,
};
pub use error::IoError;
pub use loader::{DEFAULT_URL, DataSource, DatasetLoader, LoaderConfig, parse_csv};
pub use writer::{
    CandidateEntry, ClassEntry, FeatureEntry, ParamsEntry, REPORT_FILE, ReportWriter, RunReport,
    TreeShape,
};
