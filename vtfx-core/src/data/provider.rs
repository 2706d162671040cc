//! Data provider trait, series types and structured error types.
//!
//! The DataProvider trait abstracts over the upstream market-data API so the
//! pipeline can be driven by Yahoo Finance in production and by in-memory
//! mocks in tests.

use super::period::Period;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily observation: a closing price or a closing exchange rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Daily series with strictly increasing dates.
///
/// Construction sorts by date and collapses duplicate dates, keeping the
/// later observation. Used both for ETF closes and for currency-pair rates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        // Stable sort keeps arrival order within a date, so the last one wins below.
        points.sort_by_key(|p| p.date);
        let mut canonical: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match canonical.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => canonical.push(point),
            }
        }
        Self { points: canonical }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, value)| PricePoint::new(date, value))
                .collect(),
        )
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Most recent value at or before `date`, if any.
    pub fn value_at_or_before(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.points.partition_point(|p| p.date <= date);
        if idx == 0 {
            None
        } else {
            Some(self.points[idx - 1].value)
        }
    }
}

/// Descriptive fields a provider may know about a fund. Any may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub long_name: Option<String>,
    pub expense_ratio: Option<f64>,
    pub total_assets: Option<u64>,
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no price history for '{symbol}'")]
    Empty { symbol: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for upstream market-data providers.
///
/// Implementations make one request per call. They do not retry and do not
/// cache; the pipeline decides how each failure is handled.
pub trait DataProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the daily closing series for a symbol over a lookback period.
    fn fetch_history(&self, symbol: &str, period: Period) -> Result<PriceSeries, DataError>;

    /// Fetch descriptive metadata for a symbol.
    fn fetch_profile(&self, symbol: &str) -> Result<ProviderProfile, DataError>;
}
