//! Canonical daily-series normalization.
//!
//! Converts raw provider records ([`RawDay`]) into a [`CleanSeries`]: a
//! non-empty, date-ascending sequence of [`TradingDay`] values with defaulted
//! corporate-action fields, plus the first-trading-day-of-month schedule.
//!
//! It does **not**:
//! - fetch data (no providers)
//! - simulate anything (see `aporte-backtest`)
//! - perform data-quality reporting (that is `quality.rs`)

use std::collections::HashSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::provider::RawDay;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A trading day with a usable close price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradingDay {
    pub date: NaiveDate,
    /// Always finite. Non-positive only when upstream data is corrupt.
    pub close: f64,
    /// Cash dividend per share; `0.0` when none was paid.
    pub dividend_per_share: f64,
    /// New shares per old share; `1.0` when no split happened.
    pub split_ratio: f64,
}

impl TradingDay {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            dividend_per_share: 0.0,
            split_ratio: 1.0,
        }
    }

    pub fn has_split(&self) -> bool {
        self.split_ratio != 1.0
    }

    pub fn has_dividend(&self) -> bool {
        self.dividend_per_share > 0.0
    }

    /// `true` when the close can safely be divided into.
    pub fn is_priced(&self) -> bool {
        self.close > 0.0
    }
}

/// First trading day of every calendar month present in a series.
///
/// Backed by a hash set: membership is tested once per simulated day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthlySchedule {
    dates: HashSet<NaiveDate>,
}

impl MonthlySchedule {
    /// Build from an ascending slice of days.
    fn from_sorted(days: &[TradingDay]) -> Self {
        let mut seen: HashSet<(i32, u32)> = HashSet::new();
        let mut dates = HashSet::new();
        for day in days {
            if seen.insert((day.date.year(), day.date.month())) {
                dates.insert(day.date);
            }
        }
        Self { dates }
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.dates.contains(date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Schedule dates in ascending order.
    pub fn sorted_dates(&self) -> Vec<NaiveDate> {
        let mut v: Vec<NaiveDate> = self.dates.iter().copied().collect();
        v.sort_unstable();
        v
    }
}

/// Cleaned, non-empty, date-ascending trading-day series for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanSeries {
    days: Vec<TradingDay>,
    schedule: MonthlySchedule,
}

impl CleanSeries {
    /// Build a series from already-clean days.
    ///
    /// Sorts by date, keeps the first record of any duplicated date and
    /// derives the monthly schedule. Fails on an empty input.
    pub fn from_days(mut days: Vec<TradingDay>) -> Result<Self, NormalizerError> {
        if days.is_empty() {
            return Err(NormalizerError::EmptySeries);
        }
        days.sort_by_key(|d| d.date);
        days.dedup_by_key(|d| d.date);

        let schedule = MonthlySchedule::from_sorted(&days);
        Ok(Self { days, schedule })
    }

    pub fn days(&self) -> &[TradingDay] {
        &self.days
    }

    pub fn schedule(&self) -> &MonthlySchedule {
        &self.schedule
    }

    pub fn first(&self) -> &TradingDay {
        &self.days[0]
    }

    pub fn last(&self) -> &TradingDay {
        &self.days[self.days.len() - 1]
    }

    /// Earliest date with a usable close.
    pub fn first_valid_date(&self) -> NaiveDate {
        self.first().date
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Always `false`; present for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizerError {
    /// No record in range carried a usable close price.
    EmptyData { start: NaiveDate, end: NaiveDate },
    /// [`CleanSeries::from_days`] was given no days.
    EmptySeries,
}

impl fmt::Display for NormalizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizerError::EmptyData { start, end } => {
                write!(f, "no usable price data between {start} and {end}")
            }
            NormalizerError::EmptySeries => write!(f, "series contains no trading days"),
        }
    }
}

impl std::error::Error for NormalizerError {}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize raw records for one ticker over `[start, end]`.
///
/// Records without a finite close, and records dated outside the range, are
/// dropped. Missing dividends default to `0`, missing / zero / negative split
/// ratios default to `1` (no-op multiplier).
///
/// A dropped in-range record does not lose its corporate actions: its
/// dividend and split roll forward onto the next kept day. Actions after the
/// last kept day are discarded.
pub fn normalize(
    raw: &[RawDay],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<CleanSeries, NormalizerError> {
    let mut in_range: Vec<&RawDay> = raw
        .iter()
        .filter(|r| r.date >= start && r.date <= end)
        .collect();
    // Stable: the first record of a duplicated date stays first.
    in_range.sort_by_key(|r| r.date);

    let mut days: Vec<TradingDay> = Vec::with_capacity(in_range.len());
    let mut pending = PendingActions::default();
    for r in in_range {
        match to_trading_day(r) {
            Some(mut day) => {
                pending.apply_to(&mut day);
                pending = PendingActions::default();
                days.push(day);
            }
            None => pending.absorb(r),
        }
    }
    if pending.is_some() {
        debug!(
            dividend = pending.dividend,
            split = pending.split,
            "corporate action after last priced day dropped"
        );
    }

    if days.is_empty() {
        return Err(NormalizerError::EmptyData { start, end });
    }
    CleanSeries::from_days(days)
}

/// Corporate actions collected from records that had no usable close.
#[derive(Debug, Clone, Copy)]
struct PendingActions {
    dividend: f64,
    split: f64,
}

impl Default for PendingActions {
    fn default() -> Self {
        Self {
            dividend: 0.0,
            split: 1.0,
        }
    }
}

impl PendingActions {
    fn absorb(&mut self, raw: &RawDay) {
        self.dividend += dividend_or_zero(raw.dividend);
        self.split *= split_or_one(raw.split);
    }

    fn apply_to(&self, day: &mut TradingDay) {
        day.dividend_per_share += self.dividend;
        day.split_ratio *= self.split;
    }

    fn is_some(&self) -> bool {
        self.dividend > 0.0 || self.split != 1.0
    }
}

/// `None` when the record has no usable close.
pub fn to_trading_day(raw: &RawDay) -> Option<TradingDay> {
    let close = raw.close.filter(|c| c.is_finite())?;
    Some(TradingDay {
        date: raw.date,
        close,
        dividend_per_share: dividend_or_zero(raw.dividend),
        split_ratio: split_or_one(raw.split),
    })
}

fn dividend_or_zero(v: Option<f64>) -> f64 {
    match v {
        Some(x) if x.is_finite() && x > 0.0 => x,
        _ => 0.0,
    }
}

fn split_or_one(v: Option<f64>) -> f64 {
    match v {
        Some(r) if r.is_finite() && r > 0.0 => r,
        _ => 1.0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
