//! Market data: provider seam, Yahoo implementation, ETF and forex sources.

pub mod forex;
pub mod market;
pub mod period;
pub mod provider;
pub mod yahoo;

pub use forex::ForexSource;
pub use market::{EtfMetadata, MarketSource};
pub use period::Period;
pub use provider::{DataError, DataProvider, PricePoint, PriceSeries, ProviderProfile};
pub use yahoo::YahooProvider;
