//! ETF history and metadata.

use super::period::Period;
use super::provider::{DataError, DataProvider, PriceSeries, ProviderProfile};
use crate::config::MetadataDefaults;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Descriptive fund metadata as written to the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtfMetadata {
    pub symbol: String,
    pub name: String,
    pub expense_ratio: f64,
    pub total_assets: u64,
}

impl EtfMetadata {
    /// Fill gaps in a provider profile from the configured defaults.
    pub fn from_profile(symbol: &str, profile: ProviderProfile, defaults: &MetadataDefaults) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: profile.long_name.unwrap_or_else(|| defaults.name.clone()),
            expense_ratio: profile.expense_ratio.unwrap_or(defaults.expense_ratio),
            total_assets: profile.total_assets.unwrap_or(defaults.total_assets),
        }
    }
}

/// Fetches the ETF's daily closes and metadata.
pub struct MarketSource<'a> {
    provider: &'a dyn DataProvider,
    defaults: &'a MetadataDefaults,
}

impl<'a> MarketSource<'a> {
    pub fn new(provider: &'a dyn DataProvider, defaults: &'a MetadataDefaults) -> Self {
        Self { provider, defaults }
    }

    /// History failures propagate. A failed metadata lookup degrades to the
    /// configured defaults.
    pub fn fetch(&self, symbol: &str, period: Period) -> Result<(PriceSeries, EtfMetadata), DataError> {
        let history = self.provider.fetch_history(symbol, period)?;
        if history.is_empty() {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
            });
        }
        info!(
            "Fetched {} daily closes for {symbol} from {}",
            history.len(),
            self.provider.name()
        );

        let profile = match self.provider.fetch_profile(symbol) {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Metadata lookup for {symbol} failed ({e}); using defaults");
                ProviderProfile::default()
            }
        };

        Ok((history, EtfMetadata::from_profile(symbol, profile, self.defaults)))
    }
}
