//! Corporate-action steps applied to the running share balance.
//!
//! Per trading day the order is fixed: split, then dividend, then any
//! contribution. Contributions live in `engine.rs`; this module owns the two
//! corporate-action steps and the dividend policy.
//!
//! # Dividend policy
//!
//! - [`DividendPolicy::Reinvest`]: each cash dividend buys more shares at
//!   that day's close. Use with unadjusted closes (the Yahoo chart default).
//! - [`DividendPolicy::Ignore`]: dividends are not applied. Use when the
//!   provider already delivers total-return adjusted closes; reinvesting on
//!   top of those would count every dividend twice.
//!
//! Splits are always applied: the share count must track the price scale the
//! final valuation uses.

use aporte_md::TradingDay;
use serde::Serialize;

use crate::types::SimulationState;

/// What to do with cash dividends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DividendPolicy {
    #[default]
    Reinvest,
    Ignore,
}

impl DividendPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DividendPolicy::Reinvest => "reinvest",
            DividendPolicy::Ignore => "ignore",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reinvest" | "drip" => Some(DividendPolicy::Reinvest),
            "ignore" | "none" | "adjusted" => Some(DividendPolicy::Ignore),
            _ => None,
        }
    }
}

/// Multiply the balance by the day's split ratio.
///
/// Does not touch the price, so it runs even on a day with a corrupt
/// (non-positive) close. Returns `true` when a split was applied.
pub fn apply_split(state: &mut SimulationState, day: &TradingDay) -> bool {
    if !day.has_split() {
        return false;
    }
    state.shares_held *= day.split_ratio;
    state.splits_applied += 1;
    true
}

/// Convert the day's cash dividend into additional shares at the close.
///
/// Requires a positive dividend, a positive balance and a positive close.
/// Returns `true` when shares were added.
pub fn reinvest_dividend(
    state: &mut SimulationState,
    day: &TradingDay,
    policy: DividendPolicy,
) -> bool {
    if policy == DividendPolicy::Ignore
        || !day.has_dividend()
        || state.shares_held <= 0.0
        || !day.is_priced()
    {
        return false;
    }
    let cash = day.dividend_per_share * state.shares_held;
    state.shares_held += cash / day.close;
    state.dividends_reinvested += cash;
    true
}
