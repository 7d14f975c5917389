//! HTTP provider for the Yahoo Finance v8 chart endpoint.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use tickerlens_core::{Bar, CompanyInfo, DataError, DataProvider, LookbackPeriod, PriceSeries};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; tickerlens)";
/// Decimal places kept from the endpoint's float prices.
const PRICE_DP: u32 = 4;

/// Fetches daily bars and headline quote data over HTTP.
pub struct YahooDataProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooDataProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| DataError::ApiError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_chart(&self, symbol: &str, range: &str) -> Result<ChartResult, DataError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        tracing::debug!(%symbol, %range, "Fetching chart");

        let response = self
            .client
            .get(&url)
            .query(&[("range", range), ("interval", "1d"), ("includePrePost", "false")])
            .send()
            .await
            .map_err(|e| DataError::ApiError(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body: ChartResponse = response
            .json()
            .await
            .map_err(|e| DataError::ParseError(format!("Invalid chart response ({}): {}", status, e)))?;

        first_result(symbol, body)
    }
}

#[async_trait]
impl DataProvider for YahooDataProvider {
    async fn load_history(
        &self,
        symbol: &str,
        period: LookbackPeriod,
    ) -> Result<PriceSeries, DataError> {
        let chart = self.fetch_chart(symbol, period.as_str()).await?;
        chart_to_series(symbol, &chart)
    }

    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo, DataError> {
        let chart = self.fetch_chart(symbol, "5d").await?;
        Ok(meta_to_info(&chart.meta))
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ChartMeta {
    currency: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Quote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

fn first_result(symbol: &str, body: ChartResponse) -> Result<ChartResult, DataError> {
    if let Some(err) = body.chart.error {
        return Err(if err.code == "Not Found" {
            DataError::NotFound(format!("{}: {}", symbol, err.description))
        } else {
            DataError::ApiError(format!("{}: {}", err.code, err.description))
        });
    }
    body.chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DataError::NotFound(format!("No chart data for {}", symbol)))
}

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::try_from(value).ok().map(|d| d.round_dp(PRICE_DP))
}

fn chart_to_series(symbol: &str, chart: &ChartResult) -> Result<PriceSeries, DataError> {
    let Some(quote) = chart.indicators.quote.first() else {
        return Ok(PriceSeries::empty(symbol));
    };
    let offset = chart.meta.gmtoffset.unwrap_or(0);
    let at = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten().and_then(to_decimal);

    let mut bars: Vec<Bar> = Vec::with_capacity(chart.timestamp.len());
    for (i, ts) in chart.timestamp.iter().enumerate() {
        let Some(date) = exchange_date(*ts, offset) else {
            continue;
        };
        let (Some(open), Some(high), Some(low), Some(close)) = (
            at(&quote.open, i),
            at(&quote.high, i),
            at(&quote.low, i),
            at(&quote.close, i),
        ) else {
            continue;
        };
        let bar = Bar {
            date,
            open,
            high,
            low,
            close,
            volume: at(&quote.volume, i).unwrap_or(Decimal::ZERO),
        };
        // An in-progress session can repeat the last date; keep the newest.
        match bars.last_mut() {
            Some(last) if last.date == date => *last = bar,
            _ => bars.push(bar),
        }
    }

    Ok(PriceSeries::new(symbol, bars)?)
}

fn exchange_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}

fn meta_to_info(meta: &ChartMeta) -> CompanyInfo {
    CompanyInfo {
        name: meta.long_name.clone().or_else(|| meta.short_name.clone()),
        currency: meta.currency.clone(),
        current_price: meta.regular_market_price.and_then(to_decimal),
        ..Default::default()
    }
}
