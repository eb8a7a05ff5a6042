//! Annual net income converted at the annual mean FX rate.
//!
//! The FX series is quoted as "local currency per unit of target currency"
//! (e.g. `USDBRL=X` = BRL per USD), so `converted = income / rate`.

use std::collections::BTreeMap;
use std::fmt;

use aporte_md::{
    normalize_ticker, AnnualFigure, FetchDailyRequest, FundamentalsProvider, HistoricalProvider,
    ProviderError, RawDay,
};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

/// BRL per USD on Yahoo.
pub const DEFAULT_FX_SYMBOL: &str = "USDBRL=X";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedIncome {
    pub year: i32,
    pub local_value: f64,
    pub fx_rate: f64,
    pub converted_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IncomeError {
    NoIncomeData { ticker: String },
    NoFxData { symbol: String },
    Upstream { symbol: String, source: ProviderError },
}

impl fmt::Display for IncomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncomeError::NoIncomeData { ticker } => {
                write!(f, "no annual net income reported for {ticker}")
            }
            IncomeError::NoFxData { symbol } => {
                write!(f, "no exchange-rate data for {symbol}")
            }
            IncomeError::Upstream { symbol, source } => {
                write!(f, "data provider failed for {symbol}: {source}")
            }
        }
    }
}

impl std::error::Error for IncomeError {}

/// Mean of the finite, positive closes per calendar year.
pub fn annual_mean_rates(fx: &[RawDay]) -> BTreeMap<i32, f64> {
    let mut acc: BTreeMap<i32, (f64, u32)> = BTreeMap::new();
    for day in fx {
        let Some(close) = day.close.filter(|c| c.is_finite() && *c > 0.0) else {
            continue;
        };
        let slot = acc.entry(day.date.year()).or_insert((0.0, 0));
        slot.0 += close;
        slot.1 += 1;
    }
    acc.into_iter()
        .map(|(year, (sum, n))| (year, sum / f64::from(n)))
        .collect()
}

/// Years without a rate are dropped.
pub fn convert_annual_income(
    income: &[AnnualFigure],
    rates: &BTreeMap<i32, f64>,
) -> Vec<ConvertedIncome> {
    let mut out: Vec<ConvertedIncome> = income
        .iter()
        .filter_map(|fig| {
            let rate = *rates.get(&fig.year)?;
            Some(ConvertedIncome {
                year: fig.year,
                local_value: fig.value,
                fx_rate: rate,
                converted_value: fig.value / rate,
            })
        })
        .collect();
    out.sort_by_key(|c| c.year);
    out
}

/// Fetches income and FX history, then converts.
#[derive(Debug, Clone)]
pub struct IncomeConverter {
    fx_symbol: String,
    start_year: i32,
    end_year: i32,
}

impl IncomeConverter {
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self {
            fx_symbol: DEFAULT_FX_SYMBOL.to_string(),
            start_year,
            end_year,
        }
    }

    pub fn with_fx_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.fx_symbol = symbol.into();
        self
    }

    pub fn fx_symbol(&self) -> &str {
        &self.fx_symbol
    }

    pub async fn convert(
        &self,
        fundamentals: &dyn FundamentalsProvider,
        prices: &dyn HistoricalProvider,
        ticker: &str,
    ) -> Result<Vec<ConvertedIncome>, IncomeError> {
        let symbol = normalize_ticker(ticker);
        let income = fundamentals
            .fetch_annual_net_income(&symbol, self.start_year, self.end_year)
            .await
            .map_err(|source| IncomeError::Upstream {
                symbol: symbol.clone(),
                source,
            })?;

        let (Some(min_year), Some(max_year)) = (
            income.iter().map(|f| f.year).min(),
            income.iter().map(|f| f.year).max(),
        ) else {
            return Err(IncomeError::NoIncomeData { ticker: symbol });
        };
        debug!(ticker = %symbol, years = income.len(), min_year, max_year, "income fetched");

        let req = FetchDailyRequest {
            symbol: self.fx_symbol.clone(),
            start: year_start(min_year),
            end: year_end(max_year),
        };
        let fx = prices
            .fetch_daily(&req)
            .await
            .map_err(|source| IncomeError::Upstream {
                symbol: self.fx_symbol.clone(),
                source,
            })?;

        let rates = annual_mean_rates(&fx);
        if rates.is_empty() {
            return Err(IncomeError::NoFxData {
                symbol: self.fx_symbol.clone(),
            });
        }

        let converted = convert_annual_income(&income, &rates);
        info!(
            ticker = %symbol,
            fx = %self.fx_symbol,
            converted = converted.len(),
            dropped = income.len() - converted.len(),
            "income converted"
        );
        Ok(converted)
    }
}

fn year_start(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn year_end(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn mean_rate_per_year_skips_bad_closes() {
        let fx = vec![
            RawDay::new(d("2022-03-01"), Some(5.0)),
            RawDay::new(d("2022-09-01"), Some(5.5)),
            RawDay::new(d("2022-10-01"), None),
            RawDay::new(d("2023-01-02"), Some(0.0)),
            RawDay::new(d("2023-06-01"), Some(4.8)),
        ];
        let rates = annual_mean_rates(&fx);
        assert_eq!(rates.len(), 2);
        assert!((rates[&2022] - 5.25).abs() < 1e-12);
        assert!((rates[&2023] - 4.8).abs() < 1e-12);
    }

    #[test]
    fn income_divided_by_rate() {
        let rates = BTreeMap::from([(2022, 5.0)]);
        let out = convert_annual_income(&[AnnualFigure { year: 2022, value: 10.0e9 }], &rates);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].converted_value, 2.0e9);
        assert_eq!(out[0].fx_rate, 5.0);
    }

    #[test]
    fn years_without_rate_are_dropped() {
        let rates = BTreeMap::from([(2021, 5.4)]);
        let out = convert_annual_income(
            &[
                AnnualFigure { year: 2022, value: 1.0 },
                AnnualFigure { year: 2021, value: 5.4 },
            ],
            &rates,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].year, 2021);
        assert!((out[0].converted_value - 1.0).abs() < 1e-12);
    }
}
