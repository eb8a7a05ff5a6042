use std::fmt;

use aporte_md::{CleanSeries, TradingDay};
use chrono::NaiveDate;

use crate::corporate_actions::{apply_split, reinvest_dividend};
use crate::types::{ContributionMode, Performance, SimulationConfig, SimulationState};

/// Errors that prevent a simulation from producing a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BacktestError {
    /// Lump sum: no day on or after `start` had a positive close.
    NoPurchaseDay { start: NaiveDate },
}

impl fmt::Display for BacktestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BacktestError::NoPurchaseDay { start } => {
                write!(f, "no tradable day with a positive close on or after {start}")
            }
        }
    }
}

impl std::error::Error for BacktestError {}

/// Replays a clean series day by day under one contribution strategy.
///
/// Per day, in this order:
/// 1. split: `shares *= ratio` (applies even on a non-positive close)
/// 2. dividend reinvestment at the close, per [`crate::DividendPolicy`]
/// 3. contribution at the close, when the day calls for one
///
/// Final value is `shares * last close`.
#[derive(Debug, Clone)]
pub struct ContributionSimulator {
    config: SimulationConfig,
}

impl ContributionSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn run(&self, series: &CleanSeries) -> Result<Performance, BacktestError> {
        let state = match self.config.mode {
            ContributionMode::Recurring => self.run_recurring(series),
            ContributionMode::LumpSum => self.run_lump_sum(series)?,
        };

        let last = series.last();
        Ok(Performance {
            final_portfolio_value: state.shares_held * last.close,
            total_contributed: state.capital_contributed,
            first_valid_date: series.first_valid_date(),
            last_date: last.date,
            last_close: last.close,
            shares_held: state.shares_held,
            contributions: state.contributions,
            dividends_reinvested: state.dividends_reinvested,
            splits_applied: state.splits_applied,
        })
    }

    fn run_recurring(&self, series: &CleanSeries) -> SimulationState {
        let mut state = SimulationState::default();
        let schedule = series.schedule();
        for day in series.days() {
            self.step(&mut state, day, schedule.contains(&day.date));
        }
        state
    }

    fn run_lump_sum(&self, series: &CleanSeries) -> Result<SimulationState, BacktestError> {
        let start = self.config.start.unwrap_or(series.first().date);
        let days = series.days();
        let purchase_idx = days
            .iter()
            .position(|d| d.date >= start && d.is_priced())
            .ok_or(BacktestError::NoPurchaseDay { start })?;

        let mut state = SimulationState::default();
        for (i, day) in days.iter().enumerate().skip(purchase_idx) {
            self.step(&mut state, day, i == purchase_idx);
        }
        Ok(state)
    }

    fn step(&self, state: &mut SimulationState, day: &TradingDay, contribute: bool) {
        apply_split(state, day);
        reinvest_dividend(state, day, self.config.dividend_policy);
        if contribute {
            self.contribute(state, day);
        }
    }

    fn contribute(&self, state: &mut SimulationState, day: &TradingDay) {
        let amount = self.config.amount;
        if !day.is_priced() || !amount.is_finite() || amount <= 0.0 {
            return;
        }
        state.shares_held += amount / day.close;
        state.capital_contributed += amount;
        state.contributions += 1;
    }
}

/// Run `mode` over `series` with default dividend handling (reinvest) and,
/// for lump sum, a purchase on the first priced day of the series.
pub fn simulate(
    series: &CleanSeries,
    mode: ContributionMode,
    amount: f64,
) -> Result<Performance, BacktestError> {
    ContributionSimulator::new(SimulationConfig::new(mode, amount)).run(series)
}
