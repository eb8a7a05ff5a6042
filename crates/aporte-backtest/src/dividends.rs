//! Dividend history: every cash payment in range, summed over the last N.

use aporte_md::{normalize_ticker, FetchDailyRequest, HistoricalProvider, RawDay};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::types::TickerError;

/// Four years of quarterly payers.
pub const DEFAULT_LAST_PAYMENTS: usize = 48;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DividendPayment {
    pub date: NaiveDate,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DividendSummary {
    pub ticker: String,
    /// Payments found in range, before taking the last N.
    pub available: usize,
    /// The last N payments, ascending by date.
    pub payments: Vec<DividendPayment>,
    pub total: f64,
}

/// Finite, positive dividends in date order.
pub fn dividend_payments(rows: &[RawDay]) -> Vec<DividendPayment> {
    let mut out: Vec<DividendPayment> = rows
        .iter()
        .filter_map(|r| {
            let amount = r.dividend.filter(|a| a.is_finite() && *a > 0.0)?;
            Some(DividendPayment {
                date: r.date,
                amount,
            })
        })
        .collect();
    out.sort_by_key(|p| p.date);
    out
}

pub fn summarize_last(ticker: &str, payments: &[DividendPayment], n: usize) -> DividendSummary {
    let tail = &payments[payments.len().saturating_sub(n)..];
    DividendSummary {
        ticker: ticker.to_string(),
        available: payments.len(),
        payments: tail.to_vec(),
        total: tail.iter().map(|p| p.amount).sum(),
    }
}

/// Fetches a ticker's history and summarizes its dividends.
#[derive(Debug, Clone)]
pub struct DividendHistory {
    start: NaiveDate,
    end: NaiveDate,
    last: usize,
}

impl DividendHistory {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            last: DEFAULT_LAST_PAYMENTS,
        }
    }

    pub fn with_last(mut self, n: usize) -> Self {
        self.last = n;
        self
    }

    pub fn last(&self) -> usize {
        self.last
    }

    /// A ticker with rows but no payments is a summary with nothing in it;
    /// a ticker with no rows at all is [`TickerError::EmptyData`].
    pub async fn fetch(
        &self,
        provider: &dyn HistoricalProvider,
        ticker: &str,
    ) -> Result<DividendSummary, TickerError> {
        let symbol = normalize_ticker(ticker);
        let req = FetchDailyRequest {
            symbol: symbol.clone(),
            start: self.start,
            end: self.end,
        };
        let rows = provider
            .fetch_daily(&req)
            .await
            .map_err(|source| TickerError::Upstream {
                ticker: symbol.clone(),
                source,
            })?;
        if rows.is_empty() {
            return Err(TickerError::EmptyData {
                ticker: symbol,
                start: self.start,
                end: self.end,
            });
        }

        let in_range: Vec<RawDay> = rows
            .into_iter()
            .filter(|r| r.date >= self.start && r.date <= self.end)
            .collect();
        let summary = summarize_last(&symbol, &dividend_payments(&in_range), self.last);
        info!(
            ticker = %symbol,
            available = summary.available,
            counted = summary.payments.len(),
            total = summary.total,
            "dividends summarized"
        );
        Ok(summary)
    }
}
