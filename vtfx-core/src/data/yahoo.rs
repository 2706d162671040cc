//! Yahoo Finance data provider.
//!
//! Fetches daily closes from Yahoo's v8 chart API and fund metadata from the
//! v10 quoteSummary API. Requests are blocking, bounded by a timeout, and
//! never retried.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; those surface as `DataError::ResponseFormatChanged`.

use super::period::Period;
use super::provider::{DataError, DataProvider, PricePoint, PriceSeries, ProviderProfile};
use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;
use std::time::Duration;

const CHART_BASE: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const SUMMARY_BASE: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Yahoo Finance v10 quoteSummary API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<SummaryModules>>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryModules {
    #[serde(default)]
    price: PriceModule,
    #[serde(default)]
    summary_detail: SummaryDetailModule,
    #[serde(default)]
    default_key_statistics: KeyStatisticsModule,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetailModule {
    #[serde(default)]
    total_assets: RawValue,
    #[serde(default)]
    expense_ratio: RawValue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatisticsModule {
    #[serde(default)]
    annual_report_expense_ratio: RawValue,
    #[serde(default)]
    total_assets: RawValue,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`, or `{}` when absent.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl YahooProvider {
    pub fn new(timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    fn chart_url(symbol: &str, period: Period) -> String {
        format!("{CHART_BASE}/{symbol}?range={period}&interval=1d&includeAdjustedClose=true")
    }

    fn summary_url(symbol: &str) -> String {
        format!("{SUMMARY_BASE}/{symbol}?modules=price,summaryDetail,defaultKeyStatistics")
    }

    /// Issue a GET and map transport failures and HTTP status codes to `DataError`.
    fn get(&self, symbol: &str, url: &str) -> Result<reqwest::blocking::Response, DataError> {
        debug!("GET {url}");
        let resp = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                DataError::NetworkUnreachable(format!("request for {symbol} timed out: {e}"))
            } else {
                DataError::NetworkUnreachable(e.to_string())
            }
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited { retry_after_secs });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(DataError::AuthenticationRequired(
                "Yahoo Finance requires authentication".into(),
            ));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        Err(DataError::Other(format!("HTTP {status} for {symbol}")))
    }

    /// Parse the chart API response into a daily close series.
    fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<PriceSeries, DataError> {
        let result = resp.chart.result.ok_or_else(|| api_error(symbol, resp.chart.error))?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // A valid symbol with no trading days in range comes back without timestamps.
        let timestamps = data.timestamp.unwrap_or_default();

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let offset = data.meta.gmtoffset;
        let mut points = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            // Dividend/split-adjusted close where present, raw close otherwise.
            let adj_close = adj_closes
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten())
                .filter(|v| v.is_finite());
            let Some(close) = adj_close.or_else(|| quote.close.get(i).copied().flatten()) else {
                continue;
            };
            if !close.is_finite() {
                continue;
            }

            points.push(PricePoint::new(exchange_date(ts, offset)?, close));
        }

        if points.is_empty() {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
            });
        }

        Ok(PriceSeries::new(points))
    }

    /// Parse the quoteSummary response into a profile.
    fn parse_summary(symbol: &str, resp: SummaryResponse) -> Result<ProviderProfile, DataError> {
        let modules = resp
            .quote_summary
            .result
            .ok_or_else(|| api_error(symbol, resp.quote_summary.error))?
            .into_iter()
            .next()
            .unwrap_or_default();

        let expense_ratio = modules
            .default_key_statistics
            .annual_report_expense_ratio
            .raw
            .or(modules.summary_detail.expense_ratio.raw);

        let total_assets = modules
            .summary_detail
            .total_assets
            .raw
            .or(modules.default_key_statistics.total_assets.raw)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as u64);

        Ok(ProviderProfile {
            long_name: modules.price.long_name.filter(|n| !n.trim().is_empty()),
            expense_ratio,
            total_assets,
        })
    }
}

/// Map an API-level error body to `DataError`.
fn api_error(symbol: &str, err: Option<ApiError>) -> DataError {
    match err {
        Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Some(err) if err.code == "Unauthorized" => {
            DataError::AuthenticationRequired(format!("{}: {}", err.code, err.description))
        }
        Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
        None => DataError::ResponseFormatChanged("empty result with no error".into()),
    }
}

/// Calendar date of a bar in the exchange's own timezone.
fn exchange_date(ts: i64, gmtoffset: i64) -> Result<NaiveDate, DataError> {
    chrono::DateTime::from_timestamp(ts + gmtoffset, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_history(&self, symbol: &str, period: Period) -> Result<PriceSeries, DataError> {
        let url = Self::chart_url(symbol, period);
        let resp = self.get(symbol, &url)?;
        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse chart for {symbol}: {e}"))
        })?;
        Self::parse_chart(symbol, chart)
    }

    fn fetch_profile(&self, symbol: &str) -> Result<ProviderProfile, DataError> {
        let url = Self::summary_url(symbol);
        let resp = self.get(symbol, &url)?;
        let summary: SummaryResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse summary for {symbol}: {e}"))
        })?;
        Self::parse_summary(symbol, summary)
    }
}
