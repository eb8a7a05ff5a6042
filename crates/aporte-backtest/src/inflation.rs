//! Annual inflation from a monthly percent-change series.
//!
//! Each year reports both the plain sum of its monthly prints (the figure
//! Brazilian press usually quotes for a quick look) and the compounded
//! change, which is what actually deflates money.

use std::collections::BTreeMap;
use std::fmt;

use aporte_md::{InflationProvider, MonthlyRate, ProviderError};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualInflation {
    pub year: i32,
    /// Monthly prints seen; `12` for a complete year.
    pub months: u32,
    pub summed_pct: f64,
    pub compounded_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InflationError {
    NoData { start_year: i32, end_year: i32 },
    Upstream { source: ProviderError },
}

impl fmt::Display for InflationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InflationError::NoData {
                start_year,
                end_year,
            } => write!(f, "no inflation data between {start_year} and {end_year}"),
            InflationError::Upstream { source } => {
                write!(f, "inflation provider failed: {source}")
            }
        }
    }
}

impl std::error::Error for InflationError {}

/// Group monthly rates by calendar year, ascending.
pub fn annual_inflation(rates: &[MonthlyRate]) -> Vec<AnnualInflation> {
    let mut acc: BTreeMap<i32, AnnualInflation> = BTreeMap::new();
    for r in rates {
        let year = r.date.year();
        let slot = acc.entry(year).or_insert(AnnualInflation {
            year,
            months: 0,
            summed_pct: 0.0,
            compounded_pct: 0.0,
        });
        slot.months += 1;
        slot.summed_pct += r.pct;
        slot.compounded_pct =
            ((1.0 + slot.compounded_pct / 100.0) * (1.0 + r.pct / 100.0) - 1.0) * 100.0;
    }
    acc.into_values().collect()
}

/// Compounded change over all given years, in percent.
pub fn cumulative_pct(years: &[AnnualInflation]) -> f64 {
    let factor = years
        .iter()
        .fold(1.0, |acc, y| acc * (1.0 + y.compounded_pct / 100.0));
    (factor - 1.0) * 100.0
}

/// Fetch `[start_year, end_year]` and aggregate per year.
pub async fn fetch_annual_inflation(
    provider: &dyn InflationProvider,
    start_year: i32,
    end_year: i32,
) -> Result<Vec<AnnualInflation>, InflationError> {
    let start = NaiveDate::from_ymd_opt(start_year, 1, 1).unwrap_or(NaiveDate::MIN);
    let end = NaiveDate::from_ymd_opt(end_year, 12, 31).unwrap_or(NaiveDate::MAX);

    let rates: Vec<MonthlyRate> = provider
        .fetch_monthly(start, end)
        .await
        .map_err(|source| InflationError::Upstream { source })?
        .into_iter()
        .filter(|r| r.date >= start && r.date <= end)
        .collect();

    let years = annual_inflation(&rates);
    if years.is_empty() {
        return Err(InflationError::NoData {
            start_year,
            end_year,
        });
    }
    info!(
        provider = provider.name(),
        years = years.len(),
        months = rates.len(),
        "inflation aggregated"
    );
    Ok(years)
}
