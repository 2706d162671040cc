//! Orchestrator: fetch → convert → write chart and summary JSON.
//!
//! No transactionality. A failure after the chart is written leaves the chart
//! on disk; callers re-run the whole pipeline. Two concurrent runs against the
//! same output directory may interleave their writes.

use crate::chart::{build_chart, ChartDocument};
use crate::config::{ConfigError, PipelineConfig};
use crate::data::{DataError, DataProvider, ForexSource, MarketSource};
use crate::summary::{build_summary, SummaryDocument};
use chrono::Utc;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchEtf,
    FetchForex,
    BuildChart,
    BuildSummary,
}

/// Progress callback for the pipeline's stages.
pub trait PipelineProgress {
    /// Called when a stage starts.
    fn on_stage(&self, stage: Stage, config: &PipelineConfig);

    /// Called after an output file has been written.
    fn on_written(&self, path: &Path);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl PipelineProgress for StdoutProgress {
    fn on_stage(&self, stage: Stage, config: &PipelineConfig) {
        match stage {
            Stage::FetchEtf => println!("Fetching {} data...", config.symbol),
            Stage::FetchForex => println!("Fetching historical exchange rates..."),
            Stage::BuildChart => println!("Creating chart data..."),
            Stage::BuildSummary => println!("Creating summary data..."),
        }
    }

    fn on_written(&self, path: &Path) {
        println!("  wrote {}", path.display());
    }
}

/// Reporter that stays silent; for tests and embedding.
pub struct NoProgress;

impl PipelineProgress for NoProgress {
    fn on_stage(&self, _stage: Stage, _config: &PipelineConfig) {}
    fn on_written(&self, _path: &Path) {}
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub chart_path: PathBuf,
    pub summary_path: PathBuf,
    /// True when the forex fetch failed and constant rates were used.
    pub used_fallback_rates: bool,
    pub chart: ChartDocument,
    pub summary: SummaryDocument,
}

impl RunReport {
    /// Latest close in the base currency.
    pub fn latest_base_price(&self) -> Option<f64> {
        self.summary
            .latest_prices
            .iter()
            .next()
            .map(|(_, stats)| stats.price)
    }

    /// Human-readable recap of the latest prices.
    pub fn recap(&self) -> String {
        let mut lines = vec!["Data fetch complete!".to_string()];
        if let Some((base, stats)) = self.summary.latest_prices.iter().next() {
            lines.push(format!(
                "Latest {} price: ${:.2} {base}",
                self.summary.etf_info.symbol, stats.price
            ));
        }
        for (code, stats) in self.summary.latest_prices.iter() {
            lines.push(format!("  {code}: {:.2}", stats.price));
        }
        lines.join("\n")
    }
}

/// Run the full pipeline against `provider`.
///
/// `config` is expected to be validated; it is re-checked here so that a
/// hand-built config cannot violate the four-currency invariant.
pub fn run(
    config: &PipelineConfig,
    provider: &dyn DataProvider,
    progress: &dyn PipelineProgress,
) -> Result<RunReport, PipelineError> {
    config.validate()?;

    std::fs::create_dir_all(&config.output_dir).map_err(|source| PipelineError::Io {
        path: config.output_dir.clone(),
        source,
    })?;

    progress.on_stage(Stage::FetchEtf, config);
    let (prices, metadata) = MarketSource::new(provider, &config.metadata_defaults)
        .fetch(&config.symbol, config.period)?;

    progress.on_stage(Stage::FetchForex, config);
    let rates = ForexSource::new(provider, &config.currencies, &config.fallback_rates)
        .fetch(config.period);

    progress.on_stage(Stage::BuildChart, config);
    let chart = build_chart(&prices, &rates, &config.currencies, &config.chart)?;
    let chart_path = config.chart_path();
    write_json(&chart_path, &chart, "chart data", false)?;
    progress.on_written(&chart_path);

    progress.on_stage(Stage::BuildSummary, config);
    let summary = build_summary(&prices, &metadata, &rates, &config.currencies, Utc::now())?;
    let summary_path = config.summary_path();
    write_json(&summary_path, &summary, "summary", true)?;
    progress.on_written(&summary_path);

    info!(
        "Wrote {} labels x {} datasets to {} and summary to {}",
        chart.labels.len(),
        chart.datasets.len(),
        chart_path.display(),
        summary_path.display()
    );

    Ok(RunReport {
        chart_path,
        summary_path,
        used_fallback_rates: rates.is_fallback(),
        chart,
        summary,
    })
}

/// Serialize to compact or 2-space-indented JSON and write to `path`.
fn write_json<T: Serialize>(
    path: &Path,
    value: &T,
    what: &'static str,
    pretty: bool,
) -> Result<(), PipelineError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|source| PipelineError::Serialize { what, source })?;

    std::fs::write(path, json).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}
