//! End-to-end pipeline runs against an in-memory provider.

use chrono::NaiveDate;
use std::collections::HashMap;
use vtfx_core::data::{DataError, DataProvider, Period, PriceSeries, ProviderProfile};
use vtfx_core::{run, NoProgress, PipelineConfig, PipelineError};

/// Serves fixed histories per symbol; unknown symbols fail like a network error.
struct MockProvider {
    histories: HashMap<String, PriceSeries>,
    profile: Option<ProviderProfile>,
}

impl DataProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn fetch_history(&self, symbol: &str, _period: Period) -> Result<PriceSeries, DataError> {
        self.histories
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::NetworkUnreachable(format!("no route to {symbol}")))
    }

    fn fetch_profile(&self, _symbol: &str) -> Result<ProviderProfile, DataError> {
        self.profile
            .clone()
            .ok_or_else(|| DataError::AuthenticationRequired("crumb".into()))
    }
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn vt_history() -> PriceSeries {
    PriceSeries::from_pairs([
        (d("2024-01-02"), 100.0),
        (d("2024-01-03"), 102.0),
        (d("2024-01-04"), 101.0),
        (d("2024-01-05"), 110.0),
    ])
}

fn full_provider() -> MockProvider {
    let mut histories = HashMap::new();
    histories.insert("VT".to_string(), vt_history());
    // EUR is missing 01-04: forward-fill must reuse 01-03.
    histories.insert(
        "EURUSD=X".to_string(),
        PriceSeries::from_pairs([
            (d("2024-01-02"), 1.25),
            (d("2024-01-03"), 2.0),
            (d("2024-01-05"), 1.0),
        ]),
    );
    histories.insert(
        "GBPUSD=X".to_string(),
        PriceSeries::from_pairs([(d("2024-01-01"), 1.25)]),
    );
    histories.insert(
        "CHFUSD=X".to_string(),
        PriceSeries::from_pairs([(d("2024-01-03"), 0.5)]),
    );
    MockProvider {
        histories,
        profile: Some(ProviderProfile {
            long_name: Some("Vanguard Total World Stock Index Fund ETF Shares".into()),
            expense_ratio: Some(0.0006),
            total_assets: Some(48_000_000_000),
        }),
    }
}

fn config_in(dir: &std::path::Path) -> PipelineConfig {
    PipelineConfig {
        output_dir: dir.join("data"),
        ..PipelineConfig::default()
    }
}

fn read_json(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn run_writes_chart_and_summary() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = config_in(temp_dir.path());

    let report = run(&config, &full_provider(), &NoProgress).unwrap();

    assert!(!report.used_fallback_rates);
    assert_eq!(report.chart_path, temp_dir.path().join("data/chartData.json"));
    assert_eq!(report.summary_path, temp_dir.path().join("data/summary.json"));

    let chart_text = std::fs::read_to_string(&report.chart_path).unwrap();
    assert!(!chart_text.contains('\n'), "chart JSON should be compact");
    let chart = read_json(&report.chart_path);

    let labels = chart["labels"].as_array().unwrap();
    assert_eq!(labels.len(), 4);
    assert_eq!(labels[0], "2024-01-02");

    let datasets = chart["datasets"].as_array().unwrap();
    let names: Vec<&str> = datasets.iter().map(|d| d["label"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["USD", "EUR", "GBP", "CHF"]);
    for dataset in datasets {
        assert_eq!(dataset["data"].as_array().unwrap().len(), labels.len());
    }

    let eur: Vec<f64> = datasets[1]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    assert_eq!(eur, vec![80.0, 51.0, 50.5, 110.0]);

    // CHF has no rate before 01-03.
    assert!(datasets[3]["data"][0].is_null());
    assert_eq!(datasets[3]["data"][1], 204.0);

    let summary_text = std::fs::read_to_string(&report.summary_path).unwrap();
    assert!(summary_text.contains("\n  \"etf_info\""), "summary JSON should be indented");
    let summary = read_json(&report.summary_path);

    assert_eq!(summary["etf_info"]["symbol"], "VT");
    assert_eq!(summary["etf_info"]["expense_ratio"], 0.0006);
    assert_eq!(summary["etf_info"]["total_assets"], 48_000_000_000u64);
    assert_eq!(summary["latest_prices"]["USD"]["price"], 110.0);
    assert_eq!(summary["latest_prices"]["USD"]["change_1d"], 9.0);
    assert_eq!(summary["latest_prices"]["EUR"]["price"], 110.0);
    assert_eq!(summary["latest_prices"]["CHF"]["low_52w"], 202.0);
    assert_eq!(summary["exchange_rates"]["EUR"], 1.0);
    assert_eq!(summary["exchange_rates"]["USD"], 1.0);
    assert!(summary["last_updated"].as_str().unwrap().contains('T'));
}

#[test]
fn chart_and_summary_agree_on_latest_prices() {
    let temp_dir = tempfile::tempdir().unwrap();
    let report = run(&config_in(temp_dir.path()), &full_provider(), &NoProgress).unwrap();

    for dataset in &report.chart.datasets {
        let stats = report.summary.latest_prices.get(&dataset.label).unwrap();
        assert_eq!(dataset.data.last().copied(), Some(stats.price));
    }
}

#[test]
fn forex_failure_falls_back_for_every_currency() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut provider = full_provider();
    provider.histories.remove("CHFUSD=X");

    let report = run(&config_in(temp_dir.path()), &provider, &NoProgress).unwrap();
    assert!(report.used_fallback_rates);

    let summary = read_json(&report.summary_path);
    let rates = summary["exchange_rates"].as_object().unwrap();
    assert_eq!(rates.len(), 4);
    assert_eq!(rates["EUR"], 0.85);
    assert_eq!(rates["GBP"], 1.25);
    assert_eq!(rates["CHF"], 1.10);
    assert_eq!(rates["USD"], 1.0);

    // EUR conversion used the constant, not the fetched EURUSD=X series.
    assert_eq!(summary["latest_prices"]["EUR"]["price"], 110.0 / 0.85);
}

#[test]
fn missing_profile_uses_metadata_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut provider = full_provider();
    provider.profile = None;

    let report = run(&config_in(temp_dir.path()), &provider, &NoProgress).unwrap();

    let info = &report.summary.etf_info;
    assert_eq!(info.name, "Vanguard Total World Stock ETF");
    assert_eq!(info.expense_ratio, 0.0007);
    assert_eq!(info.total_assets, 0);
}

#[test]
fn etf_failure_is_fatal_and_writes_nothing() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut provider = full_provider();
    provider.histories.remove("VT");
    let config = config_in(temp_dir.path());

    let err = run(&config, &provider, &NoProgress).unwrap_err();

    assert!(matches!(err, PipelineError::Data(DataError::NetworkUnreachable(_))));
    assert!(config.output_dir.is_dir());
    assert!(!config.chart_path().exists());
    assert!(!config.summary_path().exists());
}

#[test]
fn invalid_config_is_rejected_before_fetching() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = config_in(temp_dir.path());
    config.currencies.foreign.pop();

    let err = run(&config, &full_provider(), &NoProgress).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
    assert!(!config.output_dir.exists());
}

#[test]
fn recap_lists_every_currency() {
    let temp_dir = tempfile::tempdir().unwrap();
    let report = run(&config_in(temp_dir.path()), &full_provider(), &NoProgress).unwrap();

    assert_eq!(report.latest_base_price(), Some(110.0));
    let recap = report.recap();
    assert!(recap.contains("Latest VT price: $110.00 USD"));
    for line in ["  USD: 110.00", "  EUR: 110.00", "  GBP: 88.00", "  CHF: 220.00"] {
        assert!(recap.contains(line), "missing '{line}' in:\n{recap}");
    }
}

#[test]
fn rerun_overwrites_previous_output() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = config_in(temp_dir.path());
    std::fs::create_dir_all(&config.output_dir).unwrap();
    std::fs::write(config.chart_path(), "stale").unwrap();

    run(&config, &full_provider(), &NoProgress).unwrap();

    let chart = read_json(&config.chart_path());
    assert_eq!(chart["labels"].as_array().unwrap().len(), 4);
}
