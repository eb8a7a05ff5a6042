//! Typed extraction from the merged config JSON.
//!
//! Every key has a default except `tickers`. A present-but-unusable value is
//! a [`SettingsError`]; nothing is fetched until settings validate.
//!
//! Enumerated choices (`mode`, `dividends`) stay strings here; the command
//! that consumes them resolves them into its own types and reports a
//! [`SettingsError::Malformed`] for unknown values. Unset keys with
//! command-specific defaults stay `None`.

use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

pub const DEFAULT_START_DATE: &str = "2000-01-01";
/// Income and inflation look back this many calendar years, current included.
pub const DEFAULT_LOOKBACK_YEARS: i32 = 10;
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The key is present but its value cannot be used.
    Malformed {
        key: String,
        value: String,
        reason: String,
    },
    /// A required key is absent or empty.
    Missing { key: String },
}

impl SettingsError {
    pub fn malformed(key: &str, value: impl fmt::Display, reason: impl Into<String>) -> Self {
        SettingsError::Malformed {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Malformed { key, value, reason } => {
                write!(f, "invalid value for '{key}': {value} ({reason})")
            }
            SettingsError::Missing { key } => write!(f, "missing required setting '{key}'"),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Where daily history comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Yahoo { base_url: Option<String> },
    Csv { dir: PathBuf },
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Yahoo { .. } => "yahoo",
            DataSource::Csv { .. } => "csv",
        }
    }

    /// Reads `/data/source`, `/data/csv_dir` and `/data/base_url`.
    pub fn from_config_json(config: &Value) -> Result<Self, SettingsError> {
        let source = opt_str(config, "/data/source", "data.source")?.unwrap_or("yahoo");
        match source.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(DataSource::Yahoo {
                base_url: opt_str(config, "/data/base_url", "data.base_url")?
                    .map(str::to_string),
            }),
            "csv" => {
                let dir = opt_str(config, "/data/csv_dir", "data.csv_dir")?.ok_or(
                    SettingsError::Missing {
                        key: "data.csv_dir".to_string(),
                    },
                )?;
                Ok(DataSource::Csv {
                    dir: PathBuf::from(dir),
                })
            }
            _ => Err(SettingsError::malformed(
                "data.source",
                source,
                "expected yahoo or csv",
            )),
        }
    }
}

/// Validated inputs for the `backtest` command.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSettings {
    pub tickers: Vec<String>,
    /// `None` means the command default.
    pub mode: Option<String>,
    /// `None` means the mode's default amount.
    pub contribution_amount: Option<f64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dividends: Option<String>,
    pub source: DataSource,
}

impl BacktestSettings {
    /// `today` is the default end date.
    pub fn from_config_json(config: &Value, today: NaiveDate) -> Result<Self, SettingsError> {
        let tickers = tickers(config)?;

        let contribution_amount = match config.pointer("/contribution_amount") {
            None | Some(Value::Null) => None,
            Some(v) => Some(amount(v)?),
        };
        let (start_date, end_date) = date_range(config, today)?;

        Ok(Self {
            tickers,
            mode: opt_str(config, "/mode", "mode")?.map(str::to_string),
            contribution_amount,
            start_date,
            end_date,
            dividends: opt_str(config, "/dividends", "dividends")?.map(str::to_string),
            source: DataSource::from_config_json(config)?,
        })
    }
}

/// Validated inputs for the `income` command.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeSettings {
    pub tickers: Vec<String>,
    /// `None` means the converter's default pair.
    pub fx_symbol: Option<String>,
    pub start_year: i32,
    pub end_year: i32,
    pub source: DataSource,
}

impl IncomeSettings {
    /// Years default to the last ten calendar years up to `today`.
    pub fn from_config_json(config: &Value, today: NaiveDate) -> Result<Self, SettingsError> {
        let (start_year, end_year) = year_range(config, "income", today)?;
        Ok(Self {
            tickers: tickers(config)?,
            fx_symbol: opt_str(config, "/income/fx_symbol", "income.fx_symbol")?
                .map(str::to_string),
            start_year,
            end_year,
            source: DataSource::from_config_json(config)?,
        })
    }
}

/// Validated inputs for the `inflation` command.
#[derive(Debug, Clone, PartialEq)]
pub struct InflationSettings {
    pub start_year: i32,
    pub end_year: i32,
    /// `None` means the provider's default series.
    pub series: Option<u32>,
    pub base_url: Option<String>,
}

impl InflationSettings {
    /// Years default to the last ten calendar years up to `today`.
    pub fn from_config_json(config: &Value, today: NaiveDate) -> Result<Self, SettingsError> {
        let (start_year, end_year) = year_range(config, "inflation", today)?;
        let series = match config.pointer("/inflation/series") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                v.as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        SettingsError::malformed(
                            "inflation.series",
                            v,
                            "expected a positive series number",
                        )
                    })?,
            ),
        };
        Ok(Self {
            start_year,
            end_year,
            series,
            base_url: opt_str(config, "/inflation/base_url", "inflation.base_url")?
                .map(str::to_string),
        })
    }
}

/// Validated inputs for the `dividends` command.
#[derive(Debug, Clone, PartialEq)]
pub struct DividendSettings {
    pub tickers: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `None` means the command default.
    pub last: Option<usize>,
    pub source: DataSource,
}

impl DividendSettings {
    pub fn from_config_json(config: &Value, today: NaiveDate) -> Result<Self, SettingsError> {
        let tickers = tickers(config)?;
        let (start_date, end_date) = date_range(config, today)?;
        let last = match config.pointer("/dividend_history/last") {
            None | Some(Value::Null) => None,
            Some(v) => {
                let parsed = match v {
                    Value::Number(n) => n.as_u64(),
                    Value::String(s) => s.trim().parse::<u64>().ok(),
                    _ => None,
                };
                Some(
                    parsed
                        .and_then(|n| usize::try_from(n).ok())
                        .filter(|n| *n > 0)
                        .ok_or_else(|| {
                            SettingsError::malformed(
                                "dividend_history.last",
                                v,
                                "expected a positive count",
                            )
                        })?,
                )
            }
        };
        Ok(Self {
            tickers,
            start_date,
            end_date,
            last,
            source: DataSource::from_config_json(config)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Field readers
// ---------------------------------------------------------------------------

/// `tickers` is either one whitespace-separated string or a list of strings.
fn tickers(config: &Value) -> Result<Vec<String>, SettingsError> {
    let out: Vec<String> = match config.pointer("/tickers") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => s.split_whitespace().map(str::to_string).collect(),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => out.extend(s.split_whitespace().map(str::to_string)),
                    other => {
                        return Err(SettingsError::malformed(
                            "tickers",
                            other,
                            "list entries must be strings",
                        ))
                    }
                }
            }
            out
        }
        Some(other) => {
            return Err(SettingsError::malformed(
                "tickers",
                other,
                "expected a string or a list of strings",
            ))
        }
    };
    if out.is_empty() {
        return Err(SettingsError::Missing {
            key: "tickers".to_string(),
        });
    }
    Ok(out)
}

/// Accepts a YAML number or a numeric string (flags arrive as strings).
fn amount(v: &Value) -> Result<f64, SettingsError> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(x) if x.is_finite() && x >= 0.0 => Ok(x),
        Some(_) => Err(SettingsError::malformed(
            "contribution_amount",
            v,
            "must be a finite, non-negative number",
        )),
        None => Err(SettingsError::malformed(
            "contribution_amount",
            v,
            "not a number",
        )),
    }
}

/// `start_date` defaults to 2000-01-01, `end_date` to `today`.
fn date_range(config: &Value, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), SettingsError> {
    let start_date = match opt_str(config, "/start_date", "start_date")? {
        Some(s) => date("start_date", s)?,
        None => date("start_date", DEFAULT_START_DATE)?,
    };
    let end_date = match opt_str(config, "/end_date", "end_date")? {
        Some(s) => date("end_date", s)?,
        None => today,
    };
    if end_date < start_date {
        return Err(SettingsError::malformed(
            "end_date",
            end_date,
            format!("before start_date {start_date}"),
        ));
    }
    Ok((start_date, end_date))
}

/// Reads `/<section>/start_year` and `/<section>/end_year`.
fn year_range(
    config: &Value,
    section: &str,
    today: NaiveDate,
) -> Result<(i32, i32), SettingsError> {
    let end_key = format!("{section}.end_year");
    let start_key = format!("{section}.start_year");
    let end_year = opt_year(config, &format!("/{section}/end_year"), &end_key)?
        .unwrap_or_else(|| today.year());
    let start_year = opt_year(config, &format!("/{section}/start_year"), &start_key)?
        .unwrap_or(end_year - (DEFAULT_LOOKBACK_YEARS - 1));
    if end_year < start_year {
        return Err(SettingsError::malformed(
            &end_key,
            end_year,
            format!("before {start_key} {start_year}"),
        ));
    }
    Ok((start_year, end_year))
}

fn date(key: &str, s: &str) -> Result<NaiveDate, SettingsError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| SettingsError::malformed(key, s, format!("expected YYYY-MM-DD: {e}")))
}

fn opt_str<'a>(
    config: &'a Value,
    pointer: &str,
    key: &str,
) -> Result<Option<&'a str>, SettingsError> {
    match config.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(SettingsError::malformed(key, other, "expected a string")),
    }
}

fn opt_year(config: &Value, pointer: &str, key: &str) -> Result<Option<i32>, SettingsError> {
    let v = match config.pointer(pointer) {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };
    let parsed = match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .filter(|y| (1900..=9999).contains(y))
        .map(|y| Some(y as i32))
        .ok_or_else(|| SettingsError::malformed(key, v, "expected a four-digit year"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn defaults_fill_everything_but_tickers() {
        let s = BacktestSettings::from_config_json(&json!({"tickers": "WEGE3 AAPL"}), today())
            .unwrap();
        assert_eq!(s.tickers, vec!["WEGE3", "AAPL"]);
        assert_eq!(s.mode, None);
        assert_eq!(s.contribution_amount, None);
        assert_eq!(s.start_date, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(s.end_date, today());
        assert_eq!(s.dividends, None);
        assert_eq!(s.source, DataSource::Yahoo { base_url: None });
    }

    #[test]
    fn choices_are_passed_through_verbatim() {
        let s = BacktestSettings::from_config_json(
            &json!({"tickers": ["AAPL"], "mode": "lump_sum", "dividends": "ignore"}),
            today(),
        )
        .unwrap();
        assert_eq!(s.mode.as_deref(), Some("lump_sum"));
        assert_eq!(s.dividends.as_deref(), Some("ignore"));
    }

    #[test]
    fn numeric_string_amount_is_accepted() {
        let s = BacktestSettings::from_config_json(
            &json!({"tickers": "A", "contribution_amount": " 250.5 "}),
            today(),
        )
        .unwrap();
        assert_eq!(s.contribution_amount, Some(250.5));
    }

    #[test]
    fn garbage_amount_is_malformed() {
        let err = BacktestSettings::from_config_json(
            &json!({"tickers": "A", "contribution_amount": "abc"}),
            today(),
        )
        .unwrap_err();
        match err {
            SettingsError::Malformed { key, .. } => assert_eq!(key, "contribution_amount"),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn negative_amount_is_malformed() {
        let err = BacktestSettings::from_config_json(
            &json!({"tickers": "A", "contribution_amount": -5}),
            today(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn bad_date_and_inverted_range_are_malformed() {
        let bad = BacktestSettings::from_config_json(
            &json!({"tickers": "A", "start_date": "01/02/2020"}),
            today(),
        );
        assert!(
            matches!(bad, Err(SettingsError::Malformed { ref key, .. }) if key == "start_date")
        );

        let inverted = BacktestSettings::from_config_json(
            &json!({"tickers": "A", "start_date": "2020-01-01", "end_date": "2019-01-01"}),
            today(),
        );
        assert!(
            matches!(inverted, Err(SettingsError::Malformed { ref key, .. }) if key == "end_date")
        );
    }

    #[test]
    fn non_string_choices_and_unknown_source_are_malformed() {
        for cfg in [
            json!({"tickers": "A", "mode": 3}),
            json!({"tickers": "A", "dividends": true}),
            json!({"tickers": "A", "data": {"source": "bloomberg"}}),
        ] {
            let err = BacktestSettings::from_config_json(&cfg, today()).unwrap_err();
            assert!(matches!(err, SettingsError::Malformed { .. }), "{cfg}");
        }
    }

    #[test]
    fn missing_tickers_is_reported() {
        let err = BacktestSettings::from_config_json(&json!({"tickers": "   "}), today())
            .unwrap_err();
        assert_eq!(
            err,
            SettingsError::Missing {
                key: "tickers".to_string()
            }
        );
    }

    #[test]
    fn csv_source_requires_dir() {
        let err = DataSource::from_config_json(&json!({"data": {"source": "csv"}})).unwrap_err();
        assert_eq!(err.to_string(), "missing required setting 'data.csv_dir'");

        let ok = DataSource::from_config_json(&json!({"data": {"source": "CSV", "csv_dir": "d"}}))
            .unwrap();
        assert_eq!(
            ok,
            DataSource::Csv {
                dir: PathBuf::from("d")
            }
        );
    }

    #[test]
    fn income_defaults_to_last_ten_years() {
        let s = IncomeSettings::from_config_json(&json!({"tickers": "WEGE3"}), today()).unwrap();
        assert_eq!(s.fx_symbol, None);
        assert_eq!((s.start_year, s.end_year), (2015, 2024));
        assert_eq!(s.end_year - s.start_year + 1, DEFAULT_LOOKBACK_YEARS);
    }

    #[test]
    fn inflation_reads_its_own_section() {
        let s = InflationSettings::from_config_json(
            &json!({"inflation": {"start_year": "2000", "end_year": 2024, "series": 433}}),
            today(),
        )
        .unwrap();
        assert_eq!((s.start_year, s.end_year), (2000, 2024));
        assert_eq!(s.series, Some(433));

        let defaults = InflationSettings::from_config_json(&json!({}), today()).unwrap();
        assert_eq!((defaults.start_year, defaults.end_year), (2015, 2024));
        assert_eq!(defaults.series, None);

        let inverted = InflationSettings::from_config_json(
            &json!({"inflation": {"start_year": 2024, "end_year": 2020}}),
            today(),
        )
        .unwrap_err();
        assert!(inverted.to_string().contains("inflation.end_year"));

        let bad_series =
            InflationSettings::from_config_json(&json!({"inflation": {"series": -1}}), today());
        assert!(matches!(bad_series, Err(SettingsError::Malformed { .. })));
    }

    #[test]
    fn dividend_history_count_must_be_positive() {
        let ok = DividendSettings::from_config_json(
            &json!({"tickers": "ITUB4", "dividend_history": {"last": "12"}}),
            today(),
        )
        .unwrap();
        assert_eq!(ok.last, Some(12));

        for last in [json!(0), json!("many"), json!(-3)] {
            let err = DividendSettings::from_config_json(
                &json!({"tickers": "ITUB4", "dividend_history": {"last": last}}),
                today(),
            )
            .unwrap_err();
            assert!(err.to_string().contains("dividend_history.last"), "{err}");
        }
    }
}
