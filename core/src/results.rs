//! Ingestion of the tab-separated results file.
//!
//! Each line is `scenario<TAB>library<TAB>mode<TAB>value`. The file must
//! cover the report layout exactly: one record per triple, nothing missing,
//! nothing extra. Any deviation is reported before rendering starts.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::matrix::BenchmarkMode;
use crate::report::ReportLayout;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultKey {
    pub scenario: String,
    pub library: String,
    pub mode: String,
}

impl ResultKey {
    pub fn new(scenario: impl Into<String>, library: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            library: library.into(),
            mode: mode.into(),
        }
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.scenario, self.library, self.mode)
    }
}

/// A measurement, keeping the text as written for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub raw: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultsError {
    /// The line is not valid tab-separated text.
    Malformed { line: usize, message: String },
    FieldCount { line: usize, found: usize },
    InvalidValue { line: usize, value: String },
    UnknownMode { line: usize, mode: String },
    Duplicate { line: usize, key: ResultKey },
    Unexpected { line: usize, key: ResultKey },
    Missing { expected: usize, found: usize, key: ResultKey },
}

impl fmt::Display for ResultsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultsError::Malformed { line, message } => write!(f, "line {}: {}", line, message),
            ResultsError::FieldCount { line, found } => {
                write!(f, "line {}: expected 4 tab-separated fields, found {}", line, found)
            }
            ResultsError::InvalidValue { line, value } => {
                write!(f, "line {}: `{}` is not a numeric measurement", line, value)
            }
            ResultsError::UnknownMode { line, mode } => {
                write!(f, "line {}: `{}` is not a reported benchmark mode", line, mode)
            }
            ResultsError::Duplicate { line, key } => write!(f, "line {}: duplicate record for {}", line, key),
            ResultsError::Unexpected { line, key } => {
                write!(f, "line {}: {} is not part of the report layout", line, key)
            }
            ResultsError::Missing { expected, found, key } => write!(
                f,
                "results cover {} of {} expected records; first missing is {}",
                found, expected, key
            ),
        }
    }
}

impl std::error::Error for ResultsError {}

/// Measurements keyed by (scenario, library, mode), built once per ingest.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: FxHashMap<ResultKey, Measurement>,
}

impl ResultSet {
    /// Fields may be quoted and are trimmed; blank lines are skipped.
    pub fn parse(text: &str, layout: &ReportLayout) -> Result<Self, ResultsError> {
        let expected = layout.keys();
        let mut records = FxHashMap::default();

        // Flexible so short or long rows reach the field-count check below.
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        for (idx, row) in reader.records().enumerate() {
            let row = row.map_err(|err| ResultsError::Malformed {
                line: err.position().map_or(idx + 1, |pos| pos.line() as usize),
                message: err.to_string(),
            })?;
            let line = row.position().map_or(idx + 1, |pos| pos.line() as usize);

            if row.len() != 4 {
                return Err(ResultsError::FieldCount { line, found: row.len() });
            }
            let (scenario, library, mode, value) = (&row[0], &row[1], &row[2], &row[3]);
            let parsed: f64 = value.parse().map_err(|_| ResultsError::InvalidValue {
                line,
                value: value.to_string(),
            })?;
            if !parsed.is_finite() {
                return Err(ResultsError::InvalidValue {
                    line,
                    value: value.to_string(),
                });
            }
            if BenchmarkMode::from_report_id(mode).is_none() {
                return Err(ResultsError::UnknownMode {
                    line,
                    mode: mode.to_string(),
                });
            }

            let key = ResultKey::new(scenario, library, mode);
            if !expected.contains(&key) {
                return Err(ResultsError::Unexpected { line, key });
            }
            if records.contains_key(&key) {
                return Err(ResultsError::Duplicate { line, key });
            }
            records.insert(
                key,
                Measurement {
                    raw: value.to_string(),
                    value: parsed,
                },
            );
        }

        if let Some(missing) = expected.iter().find(|key| !records.contains_key(*key)) {
            return Err(ResultsError::Missing {
                expected: expected.len(),
                found: records.len(),
                key: missing.clone(),
            });
        }

        tracing::debug!(records = records.len(), "results ingested");
        Ok(Self { records })
    }

    pub fn get(&self, key: &ResultKey) -> Option<&Measurement> {
        self.records.get(key)
    }
}
