//! Data-quality report for raw daily records.
//!
//! Accepts a slice of [`RawDay`] and produces a [`QualityReport`] covering:
//! - total record count
//! - records without a usable close
//! - duplicate dates
//! - non-positive closes (corrupt upstream data the simulator will skip)
//! - split and dividend event counts
//! - earliest / latest date overall
//!
//! The report is informational: nothing here rejects data. Normalization is
//! `normalizer.rs`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::provider::RawDay;

/// A date that appears more than once in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateDate {
    pub date: NaiveDate,
    /// Always >= 2.
    pub count: usize,
}

/// Summary statistics produced by [`build_quality_report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    pub total_records: usize,
    /// Absent, NaN or infinite close.
    pub missing_close: usize,
    /// Finite close that is `<= 0`.
    pub non_positive_close: usize,
    pub split_events: usize,
    pub dividend_events: usize,
    pub earliest_date: Option<NaiveDate>,
    pub latest_date: Option<NaiveDate>,
    /// Sorted by date.
    pub duplicates: Vec<DuplicateDate>,
}

impl QualityReport {
    /// `true` when the simulator will not have to skip or discard anything.
    pub fn is_clean(&self) -> bool {
        self.missing_close == 0 && self.non_positive_close == 0 && self.duplicates.is_empty()
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date_or_none = |d: Option<NaiveDate>| {
            d.map(|v| v.to_string())
                .unwrap_or_else(|| "none".to_string())
        };
        write!(
            f,
            "records={} missing_close={} non_positive_close={} splits={} dividends={} \
             duplicates={} earliest={} latest={}",
            self.total_records,
            self.missing_close,
            self.non_positive_close,
            self.split_events,
            self.dividend_events,
            self.duplicates.len(),
            date_or_none(self.earliest_date),
            date_or_none(self.latest_date),
        )
    }
}

/// Build a [`QualityReport`] from raw records.
///
/// Deterministic regardless of input order.
pub fn build_quality_report(records: &[RawDay]) -> QualityReport {
    let mut date_counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut missing_close = 0;
    let mut non_positive_close = 0;
    let mut split_events = 0;
    let mut dividend_events = 0;

    for r in records {
        *date_counts.entry(r.date).or_insert(0) += 1;

        match r.close {
            Some(c) if c.is_finite() => {
                if c <= 0.0 {
                    non_positive_close += 1;
                }
            }
            _ => missing_close += 1,
        }
        if matches!(r.split, Some(s) if s.is_finite() && s > 0.0 && s != 1.0) {
            split_events += 1;
        }
        if matches!(r.dividend, Some(v) if v.is_finite() && v > 0.0) {
            dividend_events += 1;
        }
    }

    let earliest_date = date_counts.keys().next().copied();
    let latest_date = date_counts.keys().next_back().copied();

    let duplicates = date_counts
        .into_iter()
        .filter(|(_, count)| *count >= 2)
        .map(|(date, count)| DuplicateDate { date, count })
        .collect();

    QualityReport {
        total_records: records.len(),
        missing_close,
        non_positive_close,
        split_events,
        dividend_events,
        earliest_date,
        latest_date,
        duplicates,
    }
}
