//! VTFX Core — ETF price history converted into several currencies.
//!
//! This crate contains the whole refresh pipeline:
//! - Data provider seam and the Yahoo Finance implementation
//! - ETF history/metadata and forex sources (with the scalar fallback)
//! - Forward-fill currency conversion
//! - Chart.js-ready chart document and the summary document
//! - TOML configuration and the orchestrator that writes both JSON files

pub mod chart;
pub mod config;
pub mod convert;
pub mod data;
pub mod pipeline;
pub mod summary;

pub use chart::{build_chart, ChartDocument, ChartStyle, Colors, Dataset};
pub use config::{ConfigError, CurrencyConfig, MetadataDefaults, PipelineConfig};
pub use convert::{align_forward_fill, convert, Rate, RateMap};
pub use pipeline::{run, NoProgress, PipelineError, PipelineProgress, RunReport, Stage, StdoutProgress};
pub use summary::{build_summary, price_stats, PriceStats, SummaryDocument};
