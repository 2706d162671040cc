//! Summary document: latest price, 1-day change and 52-week range per currency.

use crate::config::{ConfigError, CurrencyConfig};
use crate::convert::{convert, RateMap};
use crate::data::{EtfMetadata, PriceSeries};
use chrono::{DateTime, Utc};
use log::warn;
use serde::ser::{Serialize, Serializer};

/// Trailing window approximating one calendar year of daily closes.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Per-currency statistics.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PriceStats {
    pub price: f64,
    pub currency: String,
    pub change_1d: f64,
    pub change_1d_pct: f64,
    pub high_52w: f64,
    pub low_52w: f64,
}

/// Code-keyed entries that serialize as a JSON object in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyMap<T>(pub Vec<(String, T)>);

impl<T> CurrencyMap<T> {
    pub fn get(&self, code: &str) -> Option<&T> {
        self.0.iter().find(|(c, _)| c == code).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Serialize> Serialize for CurrencyMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(c, v)| (c, v)))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SummaryDocument {
    pub last_updated: DateTime<Utc>,
    pub etf_info: EtfMetadata,
    pub latest_prices: CurrencyMap<PriceStats>,
    pub exchange_rates: CurrencyMap<f64>,
}

/// Statistics for one converted series. NaN fields for an empty series.
pub fn price_stats(currency: &str, series: &PriceSeries) -> PriceStats {
    let values = series.values();
    let latest = values.last().copied().unwrap_or(f64::NAN);
    let previous = if values.len() > 1 {
        values[values.len() - 2]
    } else {
        latest
    };

    let change_1d_pct = if previous == 0.0 {
        warn!("{currency}: previous close is zero; reporting 0% 1-day change");
        0.0
    } else {
        (latest / previous - 1.0) * 100.0
    };

    let window = &values[values.len().saturating_sub(TRADING_DAYS_PER_YEAR)..];
    // f64::max/min skip a NaN operand, so missing conversions do not poison the range.
    let high_52w = window.iter().copied().fold(f64::NAN, f64::max);
    let low_52w = window.iter().copied().fold(f64::NAN, f64::min);

    PriceStats {
        price: latest,
        currency: currency.to_string(),
        change_1d: latest - previous,
        change_1d_pct,
        high_52w,
        low_52w,
    }
}

/// Build the summary document. Base currency first, then foreign currencies in order.
pub fn build_summary(
    prices: &PriceSeries,
    metadata: &EtfMetadata,
    rates: &RateMap,
    currencies: &CurrencyConfig,
    generated_at: DateTime<Utc>,
) -> Result<SummaryDocument, ConfigError> {
    let mut latest_prices = Vec::with_capacity(currencies.foreign.len() + 1);
    for code in currencies.all() {
        let stats = if code == currencies.base {
            price_stats(code, prices)
        } else {
            let rate = rates
                .get(code)
                .ok_or_else(|| ConfigError::Invalid(format!("no exchange rate for '{code}'")))?;
            price_stats(code, &convert(prices, rate))
        };
        latest_prices.push((code.to_string(), stats));
    }

    Ok(SummaryDocument {
        last_updated: generated_at,
        etf_info: metadata.clone(),
        latest_prices: CurrencyMap(latest_prices),
        exchange_rates: CurrencyMap(rates.latest()),
    })
}
