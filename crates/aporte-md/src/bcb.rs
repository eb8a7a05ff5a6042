//! Banco Central do Brasil SGS time-series provider.
//!
//! Series 433 is the monthly IPCA (consumer price index) change in percent.
//! SGS answers with a bare JSON array of `{"data": "dd/mm/yyyy", "valor": "0.42"}`
//! objects; both fields are strings.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use crate::provider::{InflationProvider, MonthlyRate, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://api.bcb.gov.br";

/// Monthly IPCA, percent.
pub const IPCA_SERIES: u32 = 433;

const SGS_DATE_FORMAT: &str = "%d/%m/%Y";

/// Monthly inflation from one SGS series.
#[derive(Debug, Clone)]
pub struct BcbProvider {
    http: reqwest::Client,
    base_url: String,
    series: u32,
}

impl BcbProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::new_with_base_url(DEFAULT_BASE_URL.to_string())
    }

    pub fn new_with_base_url(base_url: String) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            base_url,
            series: IPCA_SERIES,
        })
    }

    pub fn with_series(mut self, series: u32) -> Self {
        self.series = series;
        self
    }

    pub fn series(&self) -> u32 {
        self.series
    }

    fn series_url(&self) -> String {
        format!(
            "{}/dados/serie/bcdata.sgs.{}/dados",
            self.base_url.trim_end_matches('/'),
            self.series
        )
    }
}

#[async_trait::async_trait]
impl InflationProvider for BcbProvider {
    fn name(&self) -> &'static str {
        "bcb"
    }

    async fn fetch_monthly(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MonthlyRate>, ProviderError> {
        let resp = self
            .http
            .get(self.series_url())
            .query(&[
                ("formato", "json".to_string()),
                ("dataInicial", start.format(SGS_DATE_FORMAT).to_string()),
                ("dataFinal", end.format(SGS_DATE_FORMAT).to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Transport(format!("bcb request failed: {e}")))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::Transport(format!("bcb body read failed: {e}")))?;

        if !(200..300).contains(&status) {
            return Err(ProviderError::Api {
                code: Some(status.to_string()),
                message: format!("sgs series {} request failed", self.series),
            });
        }

        let rates = decode_sgs(&body)?;
        debug!(series = self.series, status, rows = rates.len(), "bcb series fetched");
        Ok(rates)
    }
}

#[derive(Debug, Deserialize)]
struct SgsPoint {
    data: String,
    valor: String,
}

/// Decode an SGS `formato=json` body.
///
/// Points with an unparseable date or value are skipped.
pub fn decode_sgs(body: &str) -> Result<Vec<MonthlyRate>, ProviderError> {
    let points: Vec<SgsPoint> = serde_json::from_str(body)
        .map_err(|e| ProviderError::Decode(format!("sgs json decode failed: {e}")))?;

    Ok(points
        .into_iter()
        .filter_map(|p| {
            let date = NaiveDate::parse_from_str(p.data.trim(), SGS_DATE_FORMAT).ok()?;
            let pct = p.valor.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
            Some(MonthlyRate { date, pct })
        })
        .collect())
}
