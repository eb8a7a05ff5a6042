//! Multi-ticker driver.
//!
//! Fetch, quality-check, normalize and simulate each ticker in order. A
//! failing ticker is recorded on its own [`BacktestResult`] and the loop
//! moves on; nothing here aborts the batch.

use aporte_md::{
    build_quality_report, normalize, normalize_ticker, FetchDailyRequest, HistoricalProvider,
    NormalizerError,
};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::corporate_actions::DividendPolicy;
use crate::engine::ContributionSimulator;
use crate::types::{
    BacktestResult, BatchReport, ContributionMode, Performance, PortfolioSummary, SimulationConfig,
    TickerError,
};

/// Everything a batch needs besides the provider and the ticker list.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub mode: ContributionMode,
    pub amount: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub dividend_policy: DividendPolicy,
}

impl RunSettings {
    /// Mode default amount, reinvested dividends.
    pub fn new(mode: ContributionMode, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            mode,
            amount: mode.default_amount(),
            start,
            end,
            dividend_policy: DividendPolicy::Reinvest,
        }
    }

    fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig::new(self.mode, self.amount)
            .with_start(self.start)
            .with_dividend_policy(self.dividend_policy)
    }
}

#[derive(Debug, Clone)]
pub struct BatchRunner {
    settings: RunSettings,
}

impl BatchRunner {
    pub fn new(settings: RunSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Run every ticker sequentially. Results keep the input order.
    pub async fn run(&self, provider: &dyn HistoricalProvider, tickers: &[String]) -> BatchReport {
        info!(
            provider = provider.name(),
            tickers = tickers.len(),
            mode = %self.settings.mode,
            amount = self.settings.amount,
            start = %self.settings.start,
            end = %self.settings.end,
            "backtest batch starting"
        );

        let mut results = Vec::with_capacity(tickers.len());
        let mut summary = PortfolioSummary::default();
        for ticker in tickers {
            let result = self.run_ticker(provider, ticker).await;
            summary.record(&result);
            results.push(result);
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            total_final_value = summary.total_final_value,
            total_contributed = summary.total_contributed,
            "backtest batch finished"
        );
        BatchReport { results, summary }
    }

    /// Process one ticker. `ticker` is user input; the exchange-suffix
    /// heuristic is applied before fetching.
    pub async fn run_ticker(
        &self,
        provider: &dyn HistoricalProvider,
        ticker: &str,
    ) -> BacktestResult {
        let symbol = normalize_ticker(ticker);
        let outcome = self.evaluate(provider, &symbol).await;
        match &outcome {
            Ok(p) => info!(
                ticker = %symbol,
                final_value = p.final_portfolio_value,
                contributed = p.total_contributed,
                first_valid_date = %p.first_valid_date,
                "ticker done"
            ),
            Err(e) => warn!(ticker = %symbol, kind = e.kind(), error = %e, "ticker failed"),
        }
        BacktestResult {
            ticker: symbol,
            outcome,
        }
    }

    async fn evaluate(
        &self,
        provider: &dyn HistoricalProvider,
        symbol: &str,
    ) -> Result<Performance, TickerError> {
        let s = &self.settings;
        let req = FetchDailyRequest {
            symbol: symbol.to_string(),
            start: s.start,
            end: s.end,
        };

        let raw = provider
            .fetch_daily(&req)
            .await
            .map_err(|source| TickerError::Upstream {
                ticker: symbol.to_string(),
                source,
            })?;

        let quality = build_quality_report(&raw);
        debug!(ticker = %symbol, %quality, "data quality");
        if quality.non_positive_close > 0 {
            warn!(
                ticker = %symbol,
                days = quality.non_positive_close,
                "non-positive closes present; those days are skipped for buying"
            );
        }

        let series = normalize(&raw, s.start, s.end).map_err(|e| match e {
            NormalizerError::EmptyData { start, end } => TickerError::EmptyData {
                ticker: symbol.to_string(),
                start,
                end,
            },
            NormalizerError::EmptySeries => TickerError::EmptyData {
                ticker: symbol.to_string(),
                start: s.start,
                end: s.end,
            },
        })?;

        ContributionSimulator::new(s.simulation_config())
            .run(&series)
            .map_err(|reason| TickerError::Simulation {
                ticker: symbol.to_string(),
                reason,
            })
    }
}
