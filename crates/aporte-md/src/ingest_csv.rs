//! CSV ingestion for daily price / corporate-action history.
//!
//! Offline counterpart of the Yahoo provider: one file per ticker, as
//! exported by most charting tools.
//!
//! ## CSV column contract (case-insensitive, order-independent)
//!
//! | Column                                   | Example      | Notes                        |
//! |------------------------------------------|--------------|------------------------------|
//! | `date`                                   | `2024-01-02` | ISO date; a time part is cut |
//! | `close`                                  | `36.15`      | empty / `nan` → absent       |
//! | `dividends` / `dividend`                 | `0.12`       | optional column              |
//! | `stock splits` / `stock_splits` / `split`| `2`          | optional column, `0` = none  |
//!
//! Fields may be quoted. Blank lines and `#` comment lines are ignored; a
//! short row is read as far as it goes. Rows with an unparseable date are
//! skipped. Unparseable numbers are treated as absent (the normalizer
//! decides what that means).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::provider::{FetchDailyRequest, HistoricalProvider, ProviderError, RawDay};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced by CSV parsing in this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvIngestError {
    /// An I/O failure reading the file.
    Io(String),
    /// The header row is missing a required column.
    MissingHeader(String),
    /// The reader could not decode a record.
    Malformed(String),
}

impl fmt::Display for CsvIngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvIngestError::Io(msg) => write!(f, "csv io error: {msg}"),
            CsvIngestError::MissingHeader(col) => {
                write!(f, "csv missing required header column: '{col}'")
            }
            CsvIngestError::Malformed(msg) => write!(f, "csv malformed record: {msg}"),
        }
    }
}

impl std::error::Error for CsvIngestError {}

impl From<CsvIngestError> for ProviderError {
    fn from(e: CsvIngestError) -> Self {
        match e {
            CsvIngestError::Io(msg) => ProviderError::Transport(msg),
            CsvIngestError::MissingHeader(_) | CsvIngestError::Malformed(_) => {
                ProviderError::Decode(e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a CSV file at `path` into raw daily records.
pub fn parse_csv_file(path: &Path) -> Result<Vec<RawDay>, CsvIngestError> {
    let buf = std::fs::read_to_string(path)
        .map_err(|e| CsvIngestError::Io(format!("read '{}': {e}", path.display())))?;
    parse_csv_str(&buf)
}

/// Parse CSV from a string slice.
///
/// An input with no header line yields an empty `Vec`.
pub fn parse_csv_str(src: &str) -> Result<Vec<RawDay>, CsvIngestError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_reader(src.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| CsvIngestError::Malformed(format!("header: {e}")))?
        .clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    let cols = Columns::from_header(&headers)?;

    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec.map_err(|e| CsvIngestError::Malformed(e.to_string()))?;
        let field = |i: Option<usize>| i.and_then(|i| rec.get(i));

        let Some(date) = field(Some(cols.date)).and_then(parse_date) else {
            continue;
        };

        out.push(RawDay {
            date,
            close: field(Some(cols.close)).and_then(parse_number),
            dividend: field(cols.dividend).and_then(parse_number),
            split: field(cols.split).and_then(parse_number),
        });
    }

    Ok(out)
}

struct Columns {
    date: usize,
    close: usize,
    dividend: Option<usize>,
    split: Option<usize>,
}

impl Columns {
    fn from_header(headers: &StringRecord) -> Result<Self, CsvIngestError> {
        let mut idx: HashMap<String, usize> = HashMap::new();
        for (i, col) in headers.iter().enumerate() {
            let name = col.trim_start_matches('\u{feff}').to_ascii_lowercase();
            idx.entry(name).or_insert(i);
        }
        let find = |names: &[&str]| names.iter().find_map(|n| idx.get(*n).copied());

        Ok(Self {
            date: find(&["date", "datetime"])
                .ok_or_else(|| CsvIngestError::MissingHeader("date".to_string()))?,
            close: find(&["close"])
                .ok_or_else(|| CsvIngestError::MissingHeader("close".to_string()))?,
            dividend: find(&["dividends", "dividend"]),
            split: find(&["stock splits", "stock_splits", "split"]),
        })
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    // Accept "2024-01-02", "2024-01-02 00:00:00-03:00", "2024-01-02T00:00:00Z".
    let day_part = s.get(..10)?;
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d").ok()
}

fn parse_number(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Directory provider
// ---------------------------------------------------------------------------

/// Reads `<dir>/<SYMBOL>.csv` for each requested symbol.
#[derive(Debug, Clone)]
pub struct CsvDirectoryProvider {
    dir: PathBuf,
}

impl CsvDirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

#[async_trait::async_trait]
impl HistoricalProvider for CsvDirectoryProvider {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn fetch_daily(&self, req: &FetchDailyRequest) -> Result<Vec<RawDay>, ProviderError> {
        let path = self.path_for(&req.symbol);
        if !path.is_file() {
            return Err(ProviderError::NotFound(req.symbol.clone()));
        }

        let rows = parse_csv_file(&path)?;
        debug!(symbol = %req.symbol, path = %path.display(), rows = rows.len(), "csv loaded");

        Ok(rows
            .into_iter()
            .filter(|r| r.date >= req.start && r.date <= req.end)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
