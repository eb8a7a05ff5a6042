//! Yahoo Finance-backed providers (chart + fundamentals-timeseries APIs).
//!
//! The chart endpoint returns unadjusted daily closes with dividend and
//! split events attached as a side map; [`decode_chart`] folds those events
//! back onto the price rows. Decoding is pure so it can be tested without a
//! network.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, NaiveDate};
use serde::Deserialize;
use tracing::debug;

use crate::provider::{
    AnnualFigure, FetchDailyRequest, FundamentalsProvider, HistoricalProvider, ProviderError,
    RawDay,
};

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

// Yahoo rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) aporte/0.1";

/// Daily history and annual fundamentals from Yahoo Finance.
#[derive(Debug, Clone)]
pub struct YahooProvider {
    http: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::new_with_base_url(DEFAULT_BASE_URL.to_string())
    }

    pub fn new_with_base_url(base_url: String) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Config(format!("http client build failed: {e}")))?;
        Ok(Self { http, base_url })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            symbol
        )
    }

    fn timeseries_url(&self, symbol: &str) -> String {
        format!(
            "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{}",
            self.base_url.trim_end_matches('/'),
            symbol
        )
    }

    async fn get_text(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<(u16, String), ProviderError> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("yahoo request failed: {e}")))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::Transport(format!("yahoo body read failed: {e}")))?;
        Ok((status, body))
    }
}

#[async_trait::async_trait]
impl HistoricalProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_daily(&self, req: &FetchDailyRequest) -> Result<Vec<RawDay>, ProviderError> {
        // period2 is exclusive upstream; the request end date is inclusive.
        let period1 = day_start_epoch(req.start);
        let period2 = day_start_epoch(req.end) + 86_400;

        let (status, body) = self
            .get_text(
                self.chart_url(&req.symbol),
                &[
                    ("period1", period1.to_string()),
                    ("period2", period2.to_string()),
                    ("interval", "1d".to_string()),
                    ("events", "div|split".to_string()),
                    ("includePrePost", "false".to_string()),
                ],
            )
            .await?;

        let days = decode_chart(&body).map_err(|e| match e {
            // A non-JSON error page carries no API message; report the status.
            ProviderError::Decode(msg) if !(200..300).contains(&status) => ProviderError::Api {
                code: Some(status.to_string()),
                message: msg,
            },
            other => other,
        })?;

        debug!(symbol = %req.symbol, status, rows = days.len(), "yahoo chart fetched");
        Ok(days)
    }
}

#[async_trait::async_trait]
impl FundamentalsProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_annual_net_income(
        &self,
        symbol: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<AnnualFigure>, ProviderError> {
        let start = NaiveDate::from_ymd_opt(start_year, 1, 1)
            .ok_or_else(|| ProviderError::Config(format!("invalid start year {start_year}")))?;
        let end = NaiveDate::from_ymd_opt(end_year, 12, 31)
            .ok_or_else(|| ProviderError::Config(format!("invalid end year {end_year}")))?;

        let (status, body) = self
            .get_text(
                self.timeseries_url(symbol),
                &[
                    ("type", "annualNetIncome".to_string()),
                    ("period1", day_start_epoch(start).to_string()),
                    ("period2", (day_start_epoch(end) + 86_400).to_string()),
                ],
            )
            .await?;

        if !(200..300).contains(&status) {
            return Err(ProviderError::Api {
                code: Some(status.to_string()),
                message: format!("fundamentals request failed for {symbol}"),
            });
        }

        let figures = decode_annual_net_income(&body)?;
        debug!(symbol, years = figures.len(), "yahoo fundamentals fetched");
        Ok(figures)
    }
}

// ---------------------------------------------------------------------------
// Chart decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    events: ChartEvents,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, DividendEvent>,
    #[serde(default)]
    splits: HashMap<String, SplitEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct SplitEvent {
    date: i64,
    numerator: f64,
    denominator: f64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Decode a `/v8/finance/chart` response body into raw daily records.
///
/// Rows are dated in exchange-local time (`meta.gmtoffset`). Events attach to
/// the first row on or after their date that has a finite close, so a row the
/// normalizer will drop never carries one. Events after the last priced row
/// are dropped.
pub fn decode_chart(body: &str) -> Result<Vec<RawDay>, ProviderError> {
    let env: ChartEnvelope = serde_json::from_str(body)
        .map_err(|e| ProviderError::Decode(format!("chart json decode failed: {e}")))?;

    if let Some(err) = env.chart.error {
        return Err(ProviderError::Api {
            code: err.code,
            message: err.description.unwrap_or_else(|| "unknown".to_string()),
        });
    }

    let Some(result) = env.chart.result.and_then(|v| v.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let offset = result.meta.gmtoffset;
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let mut days: Vec<RawDay> = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let date = local_date(*ts, offset)?;
        days.push(RawDay::new(date, closes.get(i).copied().flatten()));
    }

    // date -> first priced row index on that date
    let mut index: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for (i, day) in days.iter().enumerate() {
        if day.close.is_some_and(f64::is_finite) {
            index.entry(day.date).or_insert(i);
        }
    }
    let row_on_or_after =
        |date: NaiveDate| index.range(date..).next().map(|(_, i)| *i);

    let mut dividends: Vec<&DividendEvent> = result.events.dividends.values().collect();
    dividends.sort_by_key(|e| e.date);
    for ev in dividends {
        let date = local_date(ev.date, offset)?;
        match row_on_or_after(date) {
            Some(i) => {
                let day = &mut days[i];
                day.dividend = Some(day.dividend.unwrap_or(0.0) + ev.amount);
            }
            None => debug!(%date, amount = ev.amount, "dividend after last priced row dropped"),
        }
    }

    let mut splits: Vec<&SplitEvent> = result.events.splits.values().collect();
    splits.sort_by_key(|e| e.date);
    for ev in splits {
        if ev.denominator <= 0.0 || ev.numerator <= 0.0 {
            continue;
        }
        let date = local_date(ev.date, offset)?;
        let ratio = ev.numerator / ev.denominator;
        match row_on_or_after(date) {
            Some(i) => {
                let day = &mut days[i];
                day.split = Some(day.split.unwrap_or(1.0) * ratio);
            }
            None => debug!(%date, ratio, "split after last priced row dropped"),
        }
    }

    Ok(days)
}

// ---------------------------------------------------------------------------
// Fundamentals decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TimeseriesEnvelope {
    timeseries: TimeseriesBody,
}

#[derive(Debug, Deserialize)]
struct TimeseriesBody {
    #[serde(default)]
    result: Option<Vec<TimeseriesResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    #[serde(rename = "annualNetIncome", default)]
    annual_net_income: Vec<Option<FundamentalPoint>>,
}

#[derive(Debug, Deserialize)]
struct FundamentalPoint {
    #[serde(rename = "asOfDate")]
    as_of_date: String,
    #[serde(rename = "reportedValue")]
    reported_value: ReportedValue,
}

#[derive(Debug, Deserialize)]
struct ReportedValue {
    raw: f64,
}

/// Decode a fundamentals-timeseries body into yearly net income, ascending
/// by year. Null points are skipped.
pub fn decode_annual_net_income(body: &str) -> Result<Vec<AnnualFigure>, ProviderError> {
    let env: TimeseriesEnvelope = serde_json::from_str(body)
        .map_err(|e| ProviderError::Decode(format!("timeseries json decode failed: {e}")))?;

    if let Some(err) = env.timeseries.error {
        return Err(ProviderError::Api {
            code: err.code,
            message: err.description.unwrap_or_else(|| "unknown".to_string()),
        });
    }

    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for point in env
        .timeseries
        .result
        .into_iter()
        .flatten()
        .flat_map(|r| r.annual_net_income)
        .flatten()
    {
        let date = NaiveDate::parse_from_str(&point.as_of_date, "%Y-%m-%d").map_err(|e| {
            ProviderError::Decode(format!("bad asOfDate '{}': {e}", point.as_of_date))
        })?;
        by_year.insert(date.year(), point.reported_value.raw);
    }

    Ok(by_year
        .into_iter()
        .map(|(year, value)| AnnualFigure { year, value })
        .collect())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn day_start_epoch(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

fn local_date(ts: i64, gmtoffset: i64) -> Result<NaiveDate, ProviderError> {
    DateTime::from_timestamp(ts + gmtoffset, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| ProviderError::Decode(format!("timestamp out of range: {ts}")))
}

// -----------------
// Tests (no network)
// -----------------
