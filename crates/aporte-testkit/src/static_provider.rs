//! Deterministic in-memory providers.
//!
//! Canned responses keyed by symbol; every request is recorded so tests can
//! assert on what was asked. No network I/O.

use std::collections::HashMap;
use std::sync::Mutex;

use aporte_md::{
    AnnualFigure, FetchDailyRequest, FundamentalsProvider, HistoricalProvider, InflationProvider,
    MonthlyRate, ProviderError, RawDay,
};
use chrono::NaiveDate;
use async_trait::async_trait;

/// Serves fixed daily histories. Unknown symbols answer `NotFound`.
#[derive(Debug, Default)]
pub struct StaticProvider {
    series: HashMap<String, Result<Vec<RawDay>, ProviderError>>,
    requests: Mutex<Vec<FetchDailyRequest>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows are returned filtered to the requested range, like a real feed.
    pub fn with_series(mut self, symbol: &str, rows: Vec<RawDay>) -> Self {
        self.series.insert(symbol.to_string(), Ok(rows));
        self
    }

    pub fn with_error(mut self, symbol: &str, err: ProviderError) -> Self {
        self.series.insert(symbol.to_string(), Err(err));
        self
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<FetchDailyRequest> {
        match self.requests.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn requested_symbols(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.symbol).collect()
    }
}

#[async_trait]
impl HistoricalProvider for StaticProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_daily(&self, req: &FetchDailyRequest) -> Result<Vec<RawDay>, ProviderError> {
        match self.requests.lock() {
            Ok(mut g) => g.push(req.clone()),
            Err(poisoned) => poisoned.into_inner().push(req.clone()),
        }
        match self.series.get(&req.symbol) {
            Some(Ok(rows)) => Ok(rows
                .iter()
                .filter(|r| r.date >= req.start && r.date <= req.end)
                .cloned()
                .collect()),
            Some(Err(e)) => Err(e.clone()),
            None => Err(ProviderError::NotFound(req.symbol.clone())),
        }
    }
}

/// Serves fixed annual net income. Unknown symbols answer an empty list.
#[derive(Debug, Default)]
pub struct StaticFundamentals {
    income: HashMap<String, Result<Vec<AnnualFigure>, ProviderError>>,
}

impl StaticFundamentals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_income(mut self, symbol: &str, figures: Vec<AnnualFigure>) -> Self {
        self.income.insert(symbol.to_string(), Ok(figures));
        self
    }

    pub fn with_error(mut self, symbol: &str, err: ProviderError) -> Self {
        self.income.insert(symbol.to_string(), Err(err));
        self
    }
}

#[async_trait]
impl FundamentalsProvider for StaticFundamentals {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_annual_net_income(
        &self,
        symbol: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<AnnualFigure>, ProviderError> {
        match self.income.get(symbol) {
            Some(Ok(figs)) => Ok(figs
                .iter()
                .filter(|f| f.year >= start_year && f.year <= end_year)
                .cloned()
                .collect()),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(Vec::new()),
        }
    }
}

/// Serves one fixed monthly inflation series, or one error.
#[derive(Debug)]
pub struct StaticInflation {
    rates: Result<Vec<MonthlyRate>, ProviderError>,
}

impl StaticInflation {
    pub fn new(rates: Vec<MonthlyRate>) -> Self {
        Self { rates: Ok(rates) }
    }

    pub fn failing(err: ProviderError) -> Self {
        Self { rates: Err(err) }
    }
}

#[async_trait]
impl InflationProvider for StaticInflation {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_monthly(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MonthlyRate>, ProviderError> {
        match &self.rates {
            Ok(rates) => Ok(rates
                .iter()
                .filter(|r| r.date >= start && r.date <= end)
                .cloned()
                .collect()),
            Err(e) => Err(e.clone()),
        }
    }
}
