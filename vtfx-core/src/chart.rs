//! Chart document: one line dataset per currency over a shared date axis.
//!
//! The JSON layout is what Chart.js expects for a line chart (`labels` plus
//! `datasets`), so the front end can hand it over without reshaping.

use crate::config::{ConfigError, CurrencyConfig};
use crate::convert::{convert, RateMap};
use crate::data::PriceSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Line and fill colour for one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colors {
    pub line: String,
    pub background: String,
}

impl Colors {
    fn new(line: &str, background: &str) -> Self {
        Self {
            line: line.into(),
            background: background.into(),
        }
    }
}

/// Presentation attributes shared by every dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    pub border_width: u32,
    pub tension: f64,
    pub point_hit_radius: u32,
    pub palette: BTreeMap<String, Colors>,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            border_width: 3,
            tension: 0.4,
            point_hit_radius: 10,
            palette: BTreeMap::from([
                ("USD".to_string(), Colors::new("#0066CC", "rgba(0, 102, 204, 0.1)")),
                ("EUR".to_string(), Colors::new("#FF6B35", "rgba(255, 107, 53, 0.1)")),
                ("GBP".to_string(), Colors::new("#00A878", "rgba(0, 168, 120, 0.1)")),
                ("CHF".to_string(), Colors::new("#C73E1D", "rgba(199, 62, 29, 0.1)")),
            ]),
        }
    }
}

impl ChartStyle {
    pub fn colors(&self, code: &str) -> Result<&Colors, ConfigError> {
        self.palette
            .get(code)
            .ok_or_else(|| ConfigError::MissingPalette(code.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    /// NaN (no rate known yet) serializes as `null`.
    pub data: Vec<f64>,
    pub border_color: String,
    pub background_color: String,
    pub border_width: u32,
    pub tension: f64,
    pub point_radius: u32,
    pub point_hover_radius: u32,
    pub point_background_color: String,
    pub point_border_color: String,
    pub point_border_width: u32,
    pub point_hit_radius: u32,
    pub fill: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDocument {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartDocument {
    pub fn dataset(&self, code: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.label == code)
    }
}

/// Build the chart document, base currency first, then foreign currencies in order.
pub fn build_chart(
    prices: &PriceSeries,
    rates: &RateMap,
    currencies: &CurrencyConfig,
    style: &ChartStyle,
) -> Result<ChartDocument, ConfigError> {
    let labels = prices
        .dates()
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    let mut datasets = Vec::with_capacity(currencies.foreign.len() + 1);
    for code in currencies.all() {
        let colors = style.colors(code)?;
        let is_base = code == currencies.base;

        let data = if is_base {
            prices.values()
        } else {
            let rate = rates
                .get(code)
                .ok_or_else(|| ConfigError::Invalid(format!("no exchange rate for '{code}'")))?;
            convert(prices, rate).values()
        };

        datasets.push(Dataset {
            label: code.to_string(),
            data,
            border_color: colors.line.clone(),
            background_color: colors.background.clone(),
            border_width: style.border_width,
            tension: style.tension,
            point_radius: 0,
            point_hover_radius: 0,
            point_background_color: colors.line.clone(),
            point_border_color: "#fff".into(),
            point_border_width: 0,
            point_hit_radius: style.point_hit_radius,
            fill: is_base,
        });
    }

    Ok(ChartDocument { labels, datasets })
}
