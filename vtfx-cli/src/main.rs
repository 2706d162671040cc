//! VTFX CLI — refresh the chart and summary JSON for a global-equity ETF.
//!
//! With no arguments, fetches five years of VT closes plus EUR/GBP/CHF
//! rates and writes `data/chartData.json` and `data/summary.json`.
//! Flags override the (optional) TOML config file.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use vtfx_core::data::{Period, YahooProvider};
use vtfx_core::{run, PipelineConfig, StdoutProgress};

#[derive(Parser)]
#[command(
    name = "vtfx",
    about = "VTFX — ETF price history converted into USD, EUR, GBP and CHF"
)]
struct Cli {
    /// Path to a TOML config file. Defaults apply for anything it omits.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory. Defaults to ./data.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Lookback period: 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max. Defaults to 5y.
    #[arg(long)]
    period: Option<Period>,

    /// ETF symbol. Defaults to VT.
    #[arg(long)]
    symbol: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli)?;
    info!(
        "Refreshing {} ({}) into {}",
        config.symbol,
        config.period,
        config.output_dir.display()
    );

    let provider = YahooProvider::new(config.request_timeout())
        .context("failed to initialise market data provider")?;

    let report = run(&config, &provider, &StdoutProgress)
        .with_context(|| format!("refresh of {} failed", config.symbol))?;

    if report.used_fallback_rates {
        println!("Note: forex history unavailable, approximate fixed rates were used");
    }
    println!("{}", report.recap());

    Ok(())
}

fn load_config(cli: Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(period) = cli.period {
        config.period = period;
    }
    if let Some(symbol) = cli.symbol {
        config.symbol = symbol;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}
