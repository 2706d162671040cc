//! Currency conversion.
//!
//! A price series is converted by dividing each close by the exchange rate in
//! effect on that date. Rate series are aligned to the price dates with
//! forward-fill: each date takes the most recent rate at or before it, and
//! dates before the first known rate stay NaN. Chart and summary both go
//! through [`convert`], so the two outputs cannot disagree.

use crate::data::{PricePoint, PriceSeries};
use chrono::NaiveDate;

/// Base-currency units per one unit of a currency.
#[derive(Debug, Clone, PartialEq)]
pub enum Rate {
    /// Constant rate (the base currency itself, or the fallback table).
    Scalar(f64),
    /// Daily closing rates.
    Series(PriceSeries),
}

impl Rate {
    /// Latest known rate: the series tail, or the scalar. NaN for an empty series.
    pub fn latest(&self) -> f64 {
        match self {
            Rate::Scalar(rate) => *rate,
            Rate::Series(series) => series.last().map_or(f64::NAN, |p| p.value),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Rate::Scalar(_))
    }
}

/// Ordered currency → rate mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateMap {
    entries: Vec<(String, Rate)>,
}

impl RateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a new code goes to the end.
    pub fn insert(&mut self, code: impl Into<String>, rate: Rate) {
        let code = code.into();
        match self.entries.iter_mut().find(|(c, _)| *c == code) {
            Some(entry) => entry.1 = rate,
            None => self.entries.push((code, rate)),
        }
    }

    pub fn get(&self, code: &str) -> Option<&Rate> {
        self.entries.iter().find(|(c, _)| c == code).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rate)> {
        self.entries.iter().map(|(c, r)| (c.as_str(), r))
    }

    pub fn codes(&self) -> Vec<&str> {
        self.entries.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every rate is a constant.
    pub fn is_fallback(&self) -> bool {
        self.entries.iter().all(|(_, r)| r.is_scalar())
    }

    /// Latest rate per currency, in map order.
    pub fn latest(&self) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .map(|(c, r)| (c.clone(), r.latest()))
            .collect()
    }
}

/// Rates aligned to `dates` with forward-fill.
///
/// Both inputs are ascending, so a single merge pass suffices.
pub fn align_forward_fill(dates: &[NaiveDate], rates: &PriceSeries) -> Vec<f64> {
    let points = rates.points();
    let mut idx = 0;
    let mut current = f64::NAN;

    dates
        .iter()
        .map(|date| {
            while idx < points.len() && points[idx].date <= *date {
                current = points[idx].value;
                idx += 1;
            }
            current
        })
        .collect()
}

/// Convert a base-currency price series into another currency.
pub fn convert(prices: &PriceSeries, rate: &Rate) -> PriceSeries {
    let converted = match rate {
        Rate::Scalar(r) => prices
            .points()
            .iter()
            .map(|p| PricePoint::new(p.date, p.value / r))
            .collect(),
        Rate::Series(series) => {
            let aligned = align_forward_fill(&prices.dates(), series);
            prices
                .points()
                .iter()
                .zip(aligned)
                .map(|(p, r)| PricePoint::new(p.date, p.value / r))
                .collect()
        }
    };

    PriceSeries::new(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(pairs: &[(&str, f64)]) -> PriceSeries {
        PriceSeries::from_pairs(pairs.iter().map(|(s, v)| (d(s), *v)))
    }

    #[test]
    fn scalar_divides_every_point() {
        let prices = series(&[("2024-01-02", 100.0), ("2024-01-03", 110.0)]);
        let out = convert(&prices, &Rate::Scalar(1.25));

        assert_eq!(out.dates(), prices.dates());
        assert_eq!(out.values(), vec![80.0, 88.0]);
    }

    #[test]
    fn unit_scalar_leaves_series_unchanged() {
        let prices = series(&[("2024-01-02", 100.0), ("2024-01-03", 110.0)]);
        assert_eq!(convert(&prices, &Rate::Scalar(1.0)), prices);
    }

    #[test]
    fn series_rate_matches_on_shared_dates() {
        let prices = series(&[("2024-01-02", 100.0), ("2024-01-03", 110.0)]);
        let rates = series(&[("2024-01-02", 1.25), ("2024-01-03", 2.0)]);

        let out = convert(&prices, &Rate::Series(rates));
        assert_eq!(out.values(), vec![80.0, 55.0]);
    }

    #[test]
    fn gap_in_rates_carries_last_known_rate_forward() {
        let prices = series(&[
            ("2024-01-02", 100.0),
            ("2024-01-03", 100.0),
            ("2024-01-04", 100.0),
            ("2024-01-05", 100.0),
        ]);
        // No rate for 01-03 or 01-04: forward-fill 2.0, not interpolate toward 4.0.
        let rates = series(&[("2024-01-02", 2.0), ("2024-01-05", 4.0)]);

        let out = convert(&prices, &Rate::Series(rates));
        assert_eq!(out.values(), vec![50.0, 50.0, 50.0, 25.0]);
    }

    #[test]
    fn dates_before_first_rate_are_nan() {
        let prices = series(&[("2024-01-01", 100.0), ("2024-01-02", 100.0)]);
        let rates = series(&[("2024-01-02", 2.0)]);

        let out = convert(&prices, &Rate::Series(rates));
        assert!(out.values()[0].is_nan());
        assert_eq!(out.values()[1], 50.0);
    }

    #[test]
    fn rate_dates_between_prices_are_picked_up() {
        // Rate observed on a weekend still applies to the next trading day.
        let prices = series(&[("2024-01-05", 100.0), ("2024-01-08", 100.0)]);
        let rates = series(&[("2024-01-05", 1.0), ("2024-01-07", 2.0)]);

        let aligned = align_forward_fill(&prices.dates(), &rates);
        assert_eq!(aligned, vec![1.0, 2.0]);
    }

    #[test]
    fn empty_rate_series_yields_all_nan() {
        let prices = series(&[("2024-01-02", 100.0)]);
        let out = convert(&prices, &Rate::Series(PriceSeries::default()));
        assert!(out.values()[0].is_nan());
        assert!(Rate::Series(PriceSeries::default()).latest().is_nan());
    }

    #[test]
    fn rate_latest_reads_tail_or_scalar() {
        assert_eq!(Rate::Scalar(0.85).latest(), 0.85);
        let rates = series(&[("2024-01-02", 1.08), ("2024-01-03", 1.09)]);
        assert_eq!(Rate::Series(rates).latest(), 1.09);
    }

    #[test]
    fn rate_map_keeps_insertion_order_and_replaces_in_place() {
        let mut map = RateMap::new();
        map.insert("EUR", Rate::Scalar(0.85));
        map.insert("GBP", Rate::Scalar(1.25));
        map.insert("USD", Rate::Scalar(1.0));
        map.insert("EUR", Rate::Scalar(0.9));

        assert_eq!(map.codes(), vec!["EUR", "GBP", "USD"]);
        assert_eq!(map.get("EUR"), Some(&Rate::Scalar(0.9)));
        assert!(map.is_fallback());
        assert!(map.get("CHF").is_none());
    }
}
