//! Fetches the diabetes CSV from a URL or a local file and validates every row.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{COLUMN_NAMES, Dataset, FEATURE_NAMES, N_FEATURES, Outcome, Record};

/// Canonical location of the headerless Pima Indians diabetes CSV.
pub const DEFAULT_URL: &str =
    "https://raw.githubusercontent.com/jbrownlee/Datasets/master/pima-indians-diabetes.data.csv";

/// Where the table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Fetch over HTTP(S).
    Remote(String),
    /// Read from disk.
    Local(PathBuf),
}

impl DataSource {
    /// Human-readable origin used in logs and errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Remote(url) => url.clone(),
            Self::Local(path) => path.display().to_string(),
        }
    }
}

impl Default for DataSource {
    fn default() -> Self {
        Self::Remote(DEFAULT_URL.to_string())
    }
}

/// HTTP settings for remote loads.
///
/// # Defaults
///
/// | Parameter    | Default                 |
/// |--------------|-------------------------|
/// | `timeout`    | 30 s                    |
/// | `user_agent` | `glycotree/<version>`   |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    timeout: Duration,
    user_agent: String,
}

impl LoaderConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("glycotree/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set the whole-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Return the user agent.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads the diabetes table.
///
/// Expected CSV format:
/// - Nine comma-separated fields per row, named positionally by [`COLUMN_NAMES`]
/// - No header; a leading row that spells out the column names is tolerated and skipped
/// - Eight finite numeric measurements, then Outcome as `0` or `1`
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::Fetch`] | Request could not be sent or body not read |
/// | [`IoError::HttpStatus`] | Server returned a non-2xx status |
/// | [`IoError::FileNotFound`] | Local file doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | Zero data rows |
/// | [`IoError::InconsistentRowLength`] | Row does not have nine fields |
/// | [`IoError::NonFiniteValue`] | Measurement is NaN, Inf, or unparseable |
/// | [`IoError::InvalidOutcome`] | Outcome is not 0 or 1 |
#[derive(Debug, Clone, Default)]
pub struct DatasetLoader {
    config: LoaderConfig,
}

impl DatasetLoader {
    /// Create a loader with the given HTTP settings.
    #[must_use]
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load and validate the table from `source`.
    #[instrument(skip_all, fields(origin = %source.describe()))]
    pub fn load(&self, source: &DataSource) -> Result<Dataset, IoError> {
        let dataset = match source {
            DataSource::Remote(url) => {
                let body = self.fetch(url)?;
                parse_csv(body.as_bytes(), url)?
            }
            DataSource::Local(path) => read_file(path)?,
        };

        let (negative, positive) = dataset.class_counts();
        info!(n_records = dataset.len(), negative, positive, "dataset loaded");
        Ok(dataset)
    }

    fn fetch(&self, url: &str) -> Result<String, IoError> {
        let fetch_err = |e| IoError::Fetch {
            url: url.to_string(),
            source: e,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent())
            .build()
            .map_err(fetch_err)?;

        debug!(timeout_secs = self.config.timeout.as_secs(), "sending request");
        let response = client.get(url).send().map_err(fetch_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(IoError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(fetch_err)?;
        debug!(n_bytes = body.len(), "response received");
        Ok(body)
    }
}

fn read_file(path: &Path) -> Result<Dataset, IoError> {
    let file = std::fs::File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_csv(file, &path.display().to_string())
}

/// Parse and validate headerless diabetes CSV from any reader.
///
/// `origin` names the source in errors.
///
/// # Errors
///
/// Every row-level variant listed on [`DatasetLoader`].
pub fn parse_csv<R: Read>(reader: R, origin: &str) -> Result<Dataset, IoError> {
    // Ragged rows must reach the length check below as InconsistentRowLength.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut row_index = 0usize;

    for result in rdr.records() {
        let record = result.map_err(|e| IoError::CsvParse {
            origin: origin.to_string(),
            line: e.position().map_or(0, csv::Position::line),
            source: e,
        })?;

        if row_index == 0 && is_header(&record) {
            debug!("skipping header row");
            continue;
        }

        if record.len() != COLUMN_NAMES.len() {
            return Err(IoError::InconsistentRowLength {
                origin: origin.to_string(),
                row_index,
                expected: COLUMN_NAMES.len(),
                got: record.len(),
            });
        }

        let mut features = [0.0f64; N_FEATURES];
        for (col_index, slot) in features.iter_mut().enumerate() {
            let raw = record.get(col_index).unwrap_or("");
            *slot = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| IoError::NonFiniteValue {
                    origin: origin.to_string(),
                    row_index,
                    column: FEATURE_NAMES[col_index],
                    raw: raw.to_string(),
                })?;
        }

        let raw_outcome = record.get(N_FEATURES).unwrap_or("");
        let outcome = Outcome::parse(raw_outcome).ok_or_else(|| IoError::InvalidOutcome {
            origin: origin.to_string(),
            row_index,
            raw: raw_outcome.to_string(),
        })?;

        records.push(Record { features, outcome });
        row_index += 1;
    }

    if records.is_empty() {
        return Err(IoError::EmptyDataset {
            origin: origin.to_string(),
        });
    }

    Ok(Dataset::new(records))
}

fn is_header(record: &csv::StringRecord) -> bool {
    record.len() == COLUMN_NAMES.len()
        && record
            .iter()
            .zip(COLUMN_NAMES)
            .all(|(field, name)| field.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use tempfile::NamedTempFile;

    const ROWS: &str = "6,148,72,35,0,33.6,0.627,50,1\n1,85,66,29,0,26.6,0.351,31,0\n8,183,64,0,0,23.3,0.672,32,1\n";

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn parse_valid_rows() {
        let ds = parse_csv(ROWS.as_bytes(), "inline").unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records()[0].features[1], 148.0);
        assert!((ds.records()[0].features[6] - 0.627).abs() < 1e-12);
        assert_eq!(ds.labels(), vec![1, 0, 1]);
    }

    #[test]
    fn header_row_is_skipped() {
        let csv = format!("{}\n{ROWS}", COLUMN_NAMES.join(","));
        let ds = parse_csv(csv.as_bytes(), "inline").unwrap();
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn float_outcome_accepted() {
        let ds = parse_csv("1,2,3,4,5,6,7,8,1.0\n".as_bytes(), "inline").unwrap();
        assert_eq!(ds.records()[0].outcome, Outcome::Positive);
    }

    #[test]
    fn read_local_file() {
        let f = write_csv(ROWS);
        let ds = DatasetLoader::default()
            .load(&DataSource::Local(f.path().to_path_buf()))
            .unwrap();
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn missing_file() {
        let err = DatasetLoader::default()
            .load(&DataSource::Local(PathBuf::from("/no/such/pima.csv")))
            .unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }

    #[test]
    fn empty_input() {
        let err = parse_csv("".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn short_row() {
        let err = parse_csv("1,2,3,4,5,6,7,8,1\n1,2,3\n".as_bytes(), "inline").unwrap_err();
        assert!(matches!(
            err,
            IoError::InconsistentRowLength {
                row_index: 1,
                expected: 9,
                got: 3,
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_measurement() {
        let err = parse_csv("1,abc,3,4,5,6,7,8,1\n".as_bytes(), "inline").unwrap_err();
        match err {
            IoError::NonFiniteValue { column, raw, .. } => {
                assert_eq!(column, "Glucose");
                assert_eq!(raw, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn infinite_measurement() {
        let err = parse_csv("1,2,3,4,5,inf,7,8,0\n".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { column: "BMI", .. }));
    }

    #[test]
    fn bad_outcome() {
        let err = parse_csv("1,2,3,4,5,6,7,8,2\n".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, IoError::InvalidOutcome { row_index: 0, .. }));
    }

    #[test]
    fn default_source_is_canonical_url() {
        assert_eq!(DataSource::default(), DataSource::Remote(DEFAULT_URL.to_string()));
    }

    #[test]
    fn loader_config_builder() {
        let cfg = LoaderConfig::new().with_timeout(Duration::from_secs(5));
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert!(cfg.user_agent().starts_with("glycotree/"));
    }

    /// Answer one request on a loopback port with `status` and `body`.
    /// The handle yields the raw request head.
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/pima.csv", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            String::from_utf8_lossy(&head).into_owned()
        });
        (url, handle)
    }

    fn loopback_loader() -> DatasetLoader {
        DatasetLoader::new(LoaderConfig::new().with_timeout(Duration::from_secs(10)))
    }

    #[test]
    fn remote_rows_are_parsed() {
        let body = "6,148,72,35,0,33.6,0.627,50,1\n1,85,66,29,0,26.6,0.351,31,0\n";
        let (url, server) = serve_once("200 OK", body);

        let ds = loopback_loader().load(&DataSource::Remote(url)).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.labels(), vec![1, 0]);

        let head = server.join().unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /pima.csv http/1.1"), "{head}");
        assert!(head.contains("user-agent: glycotree/"), "{head}");
    }

    #[test]
    fn non_success_status_is_an_error() {
        let (url, server) = serve_once("404 Not Found", "missing");

        let err = loopback_loader()
            .load(&DataSource::Remote(url.clone()))
            .unwrap_err();
        match err {
            IoError::HttpStatus { status, url: failed } => {
                assert_eq!(status, 404);
                assert_eq!(failed, url);
            }
            other => panic!("unexpected error: {other}"),
        }
        server.join().unwrap();
    }

    #[test]
    fn remote_body_goes_through_row_validation() {
        let (url, server) = serve_once("200 OK", "1,2,3,4,5,6,7,8,2\n");

        let err = loopback_loader().load(&DataSource::Remote(url)).unwrap_err();
        assert!(matches!(err, IoError::InvalidOutcome { row_index: 0, .. }));
        server.join().unwrap();
    }
}
