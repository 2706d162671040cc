//! Pipeline configuration.
//!
//! Every field has a serde default, so an empty TOML document (or no file at
//! all) reproduces the stock VT / USD-EUR-GBP-CHF run. Loading always
//! validates; a `PipelineConfig` obtained through `from_toml` or `from_file`
//! satisfies the four-currency invariant the builders rely on.

use crate::chart::ChartStyle;
use crate::data::Period;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Number of non-base currencies every run converts into.
pub const FOREIGN_CURRENCY_COUNT: usize = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("expected exactly {expected} foreign currencies, got {got}")]
    ForeignCount { expected: usize, got: usize },

    #[error("currency '{0}' is listed more than once")]
    DuplicateCurrency(String),

    #[error("no chart colors configured for currency '{0}'")]
    MissingPalette(String),

    #[error("no fallback rate configured for currency '{0}'")]
    MissingFallbackRate(String),

    #[error("fallback rate for '{code}' must be positive and finite, got {rate}")]
    InvalidFallbackRate { code: String, rate: f64 },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Base currency plus the foreign currencies, in output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    pub base: String,
    pub foreign: Vec<String>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            base: "USD".into(),
            foreign: vec!["EUR".into(), "GBP".into(), "CHF".into()],
        }
    }
}

impl CurrencyConfig {
    /// All currency codes, base first.
    pub fn all(&self) -> Vec<&str> {
        std::iter::once(self.base.as_str())
            .chain(self.foreign.iter().map(String::as_str))
            .collect()
    }

    /// Provider symbol for a foreign currency quoted in the base, e.g. `EURUSD=X`.
    pub fn pair_symbol(&self, code: &str) -> String {
        format!("{code}{}=X", self.base)
    }
}

/// Values reported when the provider omits a metadata field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataDefaults {
    pub name: String,
    pub expense_ratio: f64,
    pub total_assets: u64,
}

impl Default for MetadataDefaults {
    fn default() -> Self {
        Self {
            name: "Vanguard Total World Stock ETF".into(),
            expense_ratio: 0.0007,
            total_assets: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub symbol: String,
    pub period: Period,
    pub output_dir: PathBuf,
    pub chart_file: String,
    pub summary_file: String,
    pub request_timeout_secs: u64,
    pub currencies: CurrencyConfig,
    /// Approximate base-per-foreign rates used when any forex fetch fails.
    pub fallback_rates: BTreeMap<String, f64>,
    pub metadata_defaults: MetadataDefaults,
    pub chart: ChartStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            symbol: "VT".into(),
            period: Period::FiveYears,
            output_dir: PathBuf::from("data"),
            chart_file: "chartData.json".into(),
            summary_file: "summary.json".into(),
            request_timeout_secs: 30,
            currencies: CurrencyConfig::default(),
            fallback_rates: default_fallback_rates(),
            metadata_defaults: MetadataDefaults::default(),
            chart: ChartStyle::default(),
        }
    }
}

fn default_fallback_rates() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("EUR".to_string(), 0.85),
        ("GBP".to_string(), 1.25),
        ("CHF".to_string(), 1.10),
    ])
}

impl PipelineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if self.chart_file.trim().is_empty() || self.summary_file.trim().is_empty() {
            return Err(ConfigError::Invalid("output file names must not be empty".into()));
        }
        if self.chart_file == self.summary_file {
            return Err(ConfigError::Invalid(
                "chart_file and summary_file must differ".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }

        let foreign = &self.currencies.foreign;
        if foreign.len() != FOREIGN_CURRENCY_COUNT {
            return Err(ConfigError::ForeignCount {
                expected: FOREIGN_CURRENCY_COUNT,
                got: foreign.len(),
            });
        }

        let mut seen = BTreeSet::new();
        for code in self.currencies.all() {
            if code.trim().is_empty() {
                return Err(ConfigError::Invalid("currency codes must not be empty".into()));
            }
            if !seen.insert(code) {
                return Err(ConfigError::DuplicateCurrency(code.to_string()));
            }
            self.chart.colors(code)?;
        }

        for code in foreign {
            let rate = *self
                .fallback_rates
                .get(code)
                .ok_or_else(|| ConfigError::MissingFallbackRate(code.clone()))?;
            if !(rate.is_finite() && rate > 0.0) {
                return Err(ConfigError::InvalidFallbackRate {
                    code: code.clone(),
                    rate,
                });
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn chart_path(&self) -> PathBuf {
        self.output_dir.join(&self.chart_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(&self.summary_file)
    }
}
