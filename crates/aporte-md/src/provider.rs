//! Provider boundary for daily price / corporate-action ingestion.
//!
//! This module defines **only** the raw record types and the provider traits.
//! Concrete providers live in `yahoo.rs`, `ingest_csv.rs` and `bcb.rs`;
//! cleaning lives in `normalizer.rs`.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// One calendar day for one ticker exactly as delivered by a provider.
///
/// Every numeric field is optional: providers routinely return `null`
/// closes (halted days, leading padding) and omit dividend / split columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDay {
    pub date: NaiveDate,
    /// Unadjusted closing price.
    pub close: Option<f64>,
    /// Cash dividend per share paid on this date.
    pub dividend: Option<f64>,
    /// Split ratio (new shares per old share). `0` / absent means no split.
    pub split: Option<f64>,
}

impl RawDay {
    pub fn new(date: NaiveDate, close: Option<f64>) -> Self {
        Self {
            date,
            close,
            dividend: None,
            split: None,
        }
    }

    pub fn with_dividend(mut self, amount: f64) -> Self {
        self.dividend = Some(amount);
        self
    }

    pub fn with_split(mut self, ratio: f64) -> Self {
        self.split = Some(ratio);
        self
    }
}

/// A yearly fundamental value (e.g. net income) in the reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualFigure {
    pub year: i32,
    pub value: f64,
}

/// One monthly consumer-price change, in percent (`0.42` means 0.42%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRate {
    /// First day of the reference month.
    pub date: NaiveDate,
    pub pct: f64,
}

// ---------------------------------------------------------------------------
// Fetch request
// ---------------------------------------------------------------------------

/// Parameters for a daily-history fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchDailyRequest {
    /// Provider symbol, already suffixed (e.g. `"WEGE3.SA"`).
    pub symbol: String,
    /// Inclusive start date.
    pub start: NaiveDate,
    /// Inclusive end date.
    pub end: NaiveDate,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that a provider implementation may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network or transport failure.
    Transport(String),
    /// The upstream API returned an application-level error
    /// (invalid symbol, rate limit, ...).
    Api { code: Option<String>, message: String },
    /// A response payload could not be decoded.
    Decode(String),
    /// The provider has no data source for this symbol at all.
    NotFound(String),
    /// The provider could not be constructed or is misconfigured.
    Config(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Transport(msg) => write!(f, "transport error: {msg}"),
            ProviderError::Api {
                code: Some(c),
                message,
            } => write!(f, "provider api error code={c}: {message}"),
            ProviderError::Api {
                code: None,
                message,
            } => write!(f, "provider api error: {message}"),
            ProviderError::Decode(msg) => write!(f, "decode error: {msg}"),
            ProviderError::NotFound(sym) => write!(f, "no data source for symbol '{sym}'"),
            ProviderError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

// ---------------------------------------------------------------------------
// Provider traits
// ---------------------------------------------------------------------------

/// Upstream daily price-history contract.
///
/// Implementations must be object-safe so callers can hold a
/// `&dyn HistoricalProvider` without knowing the concrete type.
#[async_trait::async_trait]
pub trait HistoricalProvider: Send + Sync {
    /// Human-readable name identifying this provider (e.g. `"yahoo"`).
    fn name(&self) -> &'static str;

    /// Fetch daily records for `req.symbol` within `[req.start, req.end]`.
    ///
    /// An empty `Vec` is a valid answer (no trading in range). Ordering is
    /// whatever the upstream returns; the normalizer sorts.
    async fn fetch_daily(&self, req: &FetchDailyRequest) -> Result<Vec<RawDay>, ProviderError>;
}

/// Upstream fundamentals contract (annual statements).
#[async_trait::async_trait]
pub trait FundamentalsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Annual net income for `symbol`, one entry per fiscal year, any order.
    async fn fetch_annual_net_income(
        &self,
        symbol: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<AnnualFigure>, ProviderError>;
}

/// Upstream monthly inflation series.
#[async_trait::async_trait]
pub trait InflationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Monthly rates with reference dates in `[start, end]`, any order.
    async fn fetch_monthly(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MonthlyRate>, ProviderError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProvider {
        days: Vec<RawDay>,
    }

    #[async_trait::async_trait]
    impl HistoricalProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn fetch_daily(
            &self,
            _req: &FetchDailyRequest,
        ) -> Result<Vec<RawDay>, ProviderError> {
            Ok(self.days.clone())
        }
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn mock_provider_returns_configured_days() {
        let days = vec![
            RawDay::new(d("2024-01-02"), Some(10.0)),
            RawDay::new(d("2024-01-03"), None).with_dividend(0.5),
        ];
        let provider: Box<dyn HistoricalProvider> = Box::new(MockProvider { days });

        let req = FetchDailyRequest {
            symbol: "AAPL".to_string(),
            start: d("2024-01-01"),
            end: d("2024-01-31"),
        };

        let result = provider.fetch_daily(&req).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[1].close, None);
        assert_eq!(result[1].dividend, Some(0.5));
    }

    #[test]
    fn raw_day_builders_set_optional_fields() {
        let day = RawDay::new(d("2024-03-01"), Some(5.0))
            .with_dividend(0.1)
            .with_split(2.0);
        assert_eq!(day.dividend, Some(0.1));
        assert_eq!(day.split, Some(2.0));
    }

    #[test]
    fn provider_error_display_api_with_code() {
        let err = ProviderError::Api {
            code: Some("Not Found".to_string()),
            message: "No data found, symbol may be delisted".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "provider api error code=Not Found: No data found, symbol may be delisted"
        );
    }

    #[test]
    fn provider_error_display_api_no_code() {
        let err = ProviderError::Api {
            code: None,
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "provider api error: rate limited");
    }

    #[test]
    fn provider_error_display_not_found() {
        let err = ProviderError::NotFound("XYZ".to_string());
        assert_eq!(err.to_string(), "no data source for symbol 'XYZ'");
    }
}
