use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::corporate_actions::DividendPolicy;
use crate::engine::BacktestError;
use aporte_md::ProviderError;

/// How capital enters the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionMode {
    /// Fixed amount on the first trading day of every month.
    Recurring,
    /// One purchase on the first tradable day on/after the start date.
    LumpSum,
}

impl ContributionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionMode::Recurring => "recurring",
            ContributionMode::LumpSum => "lump_sum",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "recurring" | "monthly" | "dca" => Some(ContributionMode::Recurring),
            "lump_sum" | "lumpsum" | "oneshot" | "one_shot" => Some(ContributionMode::LumpSum),
            _ => None,
        }
    }

    /// Contribution size used when none is configured.
    pub fn default_amount(&self) -> f64 {
        match self {
            ContributionMode::Recurring => 1_000.0,
            ContributionMode::LumpSum => 10_000.0,
        }
    }
}

impl fmt::Display for ContributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simulator configuration for a single ticker run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub mode: ContributionMode,
    /// Per-contribution (recurring) or one-time (lump sum) amount.
    /// Non-positive or non-finite means "contribute nothing".
    pub amount: f64,
    /// Requested purchase date for lump sum. `None` = first day of the series.
    pub start: Option<NaiveDate>,
    pub dividend_policy: DividendPolicy,
}

impl SimulationConfig {
    pub fn new(mode: ContributionMode, amount: f64) -> Self {
        Self {
            mode,
            amount,
            start: None,
            dividend_policy: DividendPolicy::Reinvest,
        }
    }

    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_dividend_policy(mut self, policy: DividendPolicy) -> Self {
        self.dividend_policy = policy;
        self
    }
}

/// Running balances for one simulator run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationState {
    pub shares_held: f64,
    /// Monotonically non-decreasing.
    pub capital_contributed: f64,
    pub contributions: u32,
    /// Cash value of all reinvested dividends.
    pub dividends_reinvested: f64,
    pub splits_applied: u32,
}

/// Numeric outcome of a successful simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    pub final_portfolio_value: f64,
    pub total_contributed: f64,
    pub first_valid_date: NaiveDate,
    pub last_date: NaiveDate,
    pub last_close: f64,
    pub shares_held: f64,
    pub contributions: u32,
    pub dividends_reinvested: f64,
    pub splits_applied: u32,
}

impl Performance {
    /// Total return over contributed capital, in percent.
    /// `None` when nothing was contributed.
    pub fn total_return_pct(&self) -> Option<f64> {
        if self.total_contributed > 0.0 {
            Some((self.final_portfolio_value / self.total_contributed - 1.0) * 100.0)
        } else {
            None
        }
    }
}

/// Why a ticker produced no numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerError {
    /// The provider answered, but nothing in range had a usable close.
    EmptyData {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// The provider itself failed (network, rate limit, unknown symbol).
    Upstream {
        ticker: String,
        source: ProviderError,
    },
    /// Data was present but the simulation could not run.
    Simulation {
        ticker: String,
        reason: BacktestError,
    },
}

impl fmt::Display for TickerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickerError::EmptyData { ticker, start, end } => {
                write!(f, "no price data for {ticker} between {start} and {end}")
            }
            TickerError::Upstream { ticker, source } => {
                write!(f, "data provider failed for {ticker}: {source}")
            }
            TickerError::Simulation { ticker, reason } => {
                write!(f, "simulation failed for {ticker}: {reason}")
            }
        }
    }
}

impl std::error::Error for TickerError {}

impl TickerError {
    pub fn kind(&self) -> &'static str {
        match self {
            TickerError::EmptyData { .. } => "empty_data",
            TickerError::Upstream { .. } => "upstream",
            TickerError::Simulation { .. } => "simulation",
        }
    }
}

/// Per-ticker result. An error result carries no numeric data.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    /// Provider symbol (after the exchange-suffix heuristic).
    pub ticker: String,
    pub outcome: Result<Performance, TickerError>,
}

impl BacktestResult {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn first_valid_date(&self) -> Option<NaiveDate> {
        self.outcome.as_ref().ok().map(|p| p.first_valid_date)
    }
}

#[derive(Serialize)]
struct ResultRow<'a> {
    ticker: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    performance: Option<&'a Performance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_return_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Serialize for BacktestResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let row = match &self.outcome {
            Ok(p) => ResultRow {
                ticker: &self.ticker,
                performance: Some(p),
                total_return_pct: p.total_return_pct(),
                error_kind: None,
                error: None,
            },
            Err(e) => ResultRow {
                ticker: &self.ticker,
                performance: None,
                total_return_pct: None,
                error_kind: Some(e.kind()),
                error: Some(e.to_string()),
            },
        };
        row.serialize(serializer)
    }
}

/// Portfolio-level totals across successfully processed tickers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub total_final_value: f64,
    pub total_contributed: f64,
    pub succeeded: usize,
    pub failed: usize,
}

impl PortfolioSummary {
    pub fn record(&mut self, result: &BacktestResult) {
        match &result.outcome {
            Ok(p) => {
                self.total_final_value += p.final_portfolio_value;
                self.total_contributed += p.total_contributed;
                self.succeeded += 1;
            }
            Err(_) => self.failed += 1,
        }
    }

    pub fn total_return_pct(&self) -> Option<f64> {
        if self.total_contributed > 0.0 {
            Some((self.total_final_value / self.total_contributed - 1.0) * 100.0)
        } else {
            None
        }
    }
}

/// Everything a batch run produced, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub results: Vec<BacktestResult>,
    pub summary: PortfolioSummary,
}
