//! Historical exchange rates with an all-or-nothing scalar fallback.
//!
//! Either every foreign currency gets its fetched daily series, or every
//! foreign currency gets its configured constant. Mixing fetched series with
//! constants would make the converted prices inconsistent with each other.

use super::period::Period;
use super::provider::{DataError, DataProvider};
use crate::config::CurrencyConfig;
use crate::convert::{Rate, RateMap};
use log::{info, warn};
use std::collections::BTreeMap;

pub struct ForexSource<'a> {
    provider: &'a dyn DataProvider,
    currencies: &'a CurrencyConfig,
    fallback_rates: &'a BTreeMap<String, f64>,
}

impl<'a> ForexSource<'a> {
    pub fn new(
        provider: &'a dyn DataProvider,
        currencies: &'a CurrencyConfig,
        fallback_rates: &'a BTreeMap<String, f64>,
    ) -> Self {
        Self {
            provider,
            currencies,
            fallback_rates,
        }
    }

    /// Rates for every configured currency: foreign codes in order, then the base at 1.0.
    ///
    /// Never fails; any fetch error switches the whole map to the fallback table.
    pub fn fetch(&self, period: Period) -> RateMap {
        match self.fetch_series(period) {
            Ok(rates) => {
                info!("Fetched forex data for {} currencies", rates.len());
                rates
            }
            Err(e) => {
                warn!("Error fetching historical forex rates: {e}; using fallback rates");
                self.fallback()
            }
        }
    }

    fn fetch_series(&self, period: Period) -> Result<RateMap, DataError> {
        let mut rates = RateMap::new();
        for code in &self.currencies.foreign {
            let symbol = self.currencies.pair_symbol(code);
            let series = self.provider.fetch_history(&symbol, period)?;
            if series.is_empty() {
                return Err(DataError::Empty { symbol });
            }
            rates.insert(code.clone(), Rate::Series(series));
        }
        rates.insert(self.currencies.base.clone(), Rate::Scalar(1.0));
        Ok(rates)
    }

    /// The constant rate table for every currency.
    pub fn fallback(&self) -> RateMap {
        let mut rates = RateMap::new();
        for code in &self.currencies.foreign {
            // Validated configs always carry a rate; NaN keeps an unvalidated gap visible.
            let rate = self.fallback_rates.get(code).copied().unwrap_or(f64::NAN);
            rates.insert(code.clone(), Rate::Scalar(rate));
        }
        rates.insert(self.currencies.base.clone(), Rate::Scalar(1.0));
        rates
    }
}
