//! Fixtures shared by scenario tests across the workspace.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use aporte_md::{MonthlyRate, RawDay};
use chrono::NaiveDate;

mod static_provider;

pub use static_provider::{StaticFundamentals, StaticInflation, StaticProvider};

/// Parse `YYYY-MM-DD`. Panics on bad input; fixtures only.
pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .unwrap_or_else(|e| panic!("bad fixture date '{s}': {e}"))
}

/// One month of inflation, dated the 1st.
pub fn monthly_rate(year: i32, month: u32, pct: f64) -> MonthlyRate {
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| panic!("bad fixture month {year}-{month}"));
    MonthlyRate { date, pct }
}

/// A priced day with no corporate action.
pub fn raw(date: &str, close: f64) -> RawDay {
    RawDay::new(d(date), Some(close))
}

/// One row dated the 2nd of consecutive months starting at `(year, month)`,
/// one per close.
pub fn monthly_closes(year: i32, month: u32, closes: &[f64]) -> Vec<RawDay> {
    let mut out = Vec::with_capacity(closes.len());
    let (mut y, mut m) = (year, month);
    for &close in closes {
        let date = NaiveDate::from_ymd_opt(y, m, 2)
            .unwrap_or_else(|| panic!("bad fixture month {y}-{m}"));
        out.push(RawDay::new(date, Some(close)));
        if m == 12 {
            y += 1;
            m = 1;
        } else {
            m += 1;
        }
    }
    out
}

/// Render rows in the CSV-directory provider's format.
pub fn to_csv(rows: &[RawDay]) -> Result<String> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(["Date", "Close", "Dividends", "Stock Splits"])
        .context("write csv header")?;
    for r in rows {
        let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        w.write_record([
            r.date.to_string(),
            cell(r.close),
            cell(r.dividend),
            cell(r.split),
        ])
        .with_context(|| format!("write csv row {}", r.date))?;
    }
    let bytes = w.into_inner().context("flush csv writer")?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

/// Write `<dir>/<symbol>.csv` and return its path.
pub fn write_price_csv(dir: &Path, symbol: &str, rows: &[RawDay]) -> Result<PathBuf> {
    let path = dir.join(format!("{symbol}.csv"));
    fs::write(&path, to_csv(rows)?)
        .with_context(|| format!("write fixture: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_closes_roll_over_year_end() {
        let rows = monthly_closes(2023, 11, &[1.0, 2.0, 3.0]);
        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d("2023-11-02"), d("2023-12-02"), d("2024-01-02")]);
    }

    #[test]
    fn csv_fixture_is_readable_by_the_csv_provider() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![
            raw("2024-01-02", 10.0).with_dividend(0.5),
            raw("2024-01-03", 5.0).with_split(2.0),
        ];
        let path = write_price_csv(dir.path(), "AAA", &rows).unwrap();

        let parsed = aporte_md::ingest_csv::parse_csv_file(&path).unwrap();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn csv_fixture_leaves_missing_values_empty() {
        let out = to_csv(&[RawDay::new(d("2024-01-02"), None)]).unwrap();
        assert_eq!(out, "Date,Close,Dividends,Stock Splits\n2024-01-02,,,\n");
    }
}
