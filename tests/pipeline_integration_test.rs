//! End-to-end tests: series store -> panel -> regimes -> returns -> reports

mod common;

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use common::SyntheticPanel;
use macro_regimes::config::{ColumnMap, PipelineConfig};
use macro_regimes::data::{CsvSeriesStore, InMemorySeriesStore, Observation, Panel, Series};
use macro_regimes::pipeline::ResearchPipeline;
use macro_regimes::regime::{RateDirection, RegimeType};
use macro_regimes::report::{
    read_regime_table, read_return_table, GROUPED_STATS_FILE, REGIME_PANEL_FILE, RETURNS_FILE,
    SIGNIFICANCE_FILE, THRESHOLDS_FILE,
};
use macro_regimes::returns::{SignificanceTest, SkipReason};
use std::fs::{self, File};
use tempfile::TempDir;

fn pipeline() -> ResearchPipeline {
    ResearchPipeline::new(PipelineConfig::default()).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_rising_rates_three_years() {
    let panel = SyntheticPanel::rising_rates(36).into_panel();
    let output = pipeline().run(&panel).unwrap();
    let labels = output.returns.regimes().labels();

    assert_eq!(labels.len(), 36);
    assert!(labels[..12].iter().all(|l| l.rate_direction.is_none()));
    assert!(labels[12..]
        .iter()
        .all(|l| l.rate_direction == Some(RateDirection::Rising)));

    // 24 Rising months and no Falling ones: below the 30 required
    assert!(matches!(
        output.significance,
        SignificanceTest::Skipped {
            reason: SkipReason::InsufficientData,
            ..
        }
    ));
}

#[test]
fn test_alternating_price_log_returns() {
    let panel = SyntheticPanel::rising_rates(36).into_panel();
    let output = pipeline().run(&panel).unwrap();
    let equities = output.returns.asset("equities").unwrap();

    let up = 1.05_f64.ln();
    let down = (100.0_f64 / 105.0).ln();
    assert_eq!(equities.values[0], None);
    for (row, value) in equities.values.iter().enumerate().skip(1) {
        let expected = if row % 2 == 1 { up } else { down };
        assert_relative_eq!(value.unwrap(), expected, epsilon = 1e-12);
    }

    let all = output.stats_for("equities", RegimeType::All);
    assert_eq!(all.len(), 1);
    let row = all[0];
    assert_eq!(row.n, 35);

    let mean = equities.values.iter().flatten().sum::<f64>() / 35.0;
    assert_relative_eq!(row.mean.unwrap(), mean, epsilon = 1e-12);
    assert_relative_eq!(row.annualized_mean.unwrap(), mean * 12.0, epsilon = 1e-12);
}

#[test]
fn test_log_returns_recover_prices() {
    let panel = SyntheticPanel::cyclical(60).into_panel();
    let output = pipeline().run(&panel).unwrap();
    let prices = panel.column("equity_index").unwrap();
    let returns = &output.returns.asset("equities").unwrap().values;

    let mut level = prices[0].unwrap();
    for row in 1..prices.len() {
        level *= returns[row].unwrap().exp();
        assert_relative_eq!(level, prices[row].unwrap(), max_relative = 1e-9);
    }
}

#[test]
fn test_missing_price_only_drops_adjacent_returns() {
    let panel = SyntheticPanel::cyclical(60)
        .set("equity_index", 40, None)
        .into_panel();
    let output = pipeline().run(&panel).unwrap();
    let equities = output.returns.asset("equities").unwrap();

    assert_eq!(equities.values[40], None);
    assert_eq!(equities.values[41], None);
    assert!(equities.values[39].is_some());
    assert!(equities.values[42].is_some());
    assert_eq!(equities.usable_count(), 59 - 2);
}

#[test]
fn test_reports_written() {
    let panel = SyntheticPanel::rising_rates(36).into_panel();
    let output = pipeline().run(&panel).unwrap();
    let dir = TempDir::new().unwrap();

    let written = output.write_to(dir.path()).unwrap();
    assert_eq!(written.len(), 6);
    assert!(written.iter().all(|p| p.exists()));

    let regime_panel = fs::read_to_string(dir.path().join(REGIME_PANEL_FILE)).unwrap();
    let mut lines = regime_panel.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("date,policy_rate,cpi,"));
    assert!(header.ends_with(
        "inflation_yoy,rate_change_12m,rate_direction_regime,rate_level_regime,inflation_regime,joint_regime"
    ));
    let first = lines.next().unwrap();
    assert!(first.starts_with("2000-01-31,"));
    assert!(first.ends_with(",,,Undefined,Mid,Undefined,Undefined"));

    let returns = fs::read_to_string(dir.path().join(RETURNS_FILE)).unwrap();
    let header = returns.lines().next().unwrap();
    assert!(header.contains("equities_log_return"));
    assert!(header.contains("cash_simple_yield_return"));
    assert!(header.contains("usable_equities"));
    assert!(header.ends_with("fully_labeled"));

    let thresholds = fs::read_to_string(dir.path().join(THRESHOLDS_FILE)).unwrap();
    assert!(thresholds.starts_with("metric,method,n_obs,lower,upper"));
    assert!(thresholds.contains("rate_change_12m,fixed_band,,-0.25,0.25"));

    let grouped = fs::read_to_string(dir.path().join(GROUPED_STATS_FILE)).unwrap();
    assert!(grouped.contains("equities,rate_direction,Falling,0,,,,"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(SIGNIFICANCE_FILE)).unwrap())
            .unwrap();
    assert_eq!(json["status"], "skipped");
    assert_eq!(json["reason"], "insufficient_data");
    assert_eq!(json["n2"], 0);
}

#[test]
fn test_report_tables_read_back() {
    let panel = SyntheticPanel::rising_rates(36)
        .set("equity_index", 20, None)
        .into_panel();
    let output = pipeline().run(&panel).unwrap();
    let dir = TempDir::new().unwrap();
    output.write_to(dir.path()).unwrap();

    let regimes = read_regime_table(File::open(dir.path().join(REGIME_PANEL_FILE)).unwrap()).unwrap();
    assert_eq!(&regimes, output.returns.regimes());
    // First year has no YoY inflation and no 12-month change
    let inflation_yoy = regimes.panel().column("inflation_yoy").unwrap();
    assert!(inflation_yoy[..12].iter().all(Option::is_none));
    assert!(regimes.labels()[..12].iter().all(|l| l.rate_direction.is_none()));

    let assets = &PipelineConfig::default().summary.assets;
    let returns =
        read_return_table(File::open(dir.path().join(RETURNS_FILE)).unwrap(), assets).unwrap();
    assert_eq!(returns, output.returns);
    let equities = returns.asset("equities").unwrap();
    assert_eq!(equities.values[20], None);
    assert_eq!(equities.values[21], None);
    assert_eq!(equities.usable_count(), 33);
}

#[test]
fn test_run_with_renamed_columns() {
    let columns = ColumnMap {
        equity_index: "spx".to_string(),
        policy_rate: "fed_funds".to_string(),
        ..ColumnMap::default()
    };
    let config = PipelineConfig::with_columns(columns.clone());
    let panel = SyntheticPanel::cyclical(60).into_panel_named(&columns);
    let output = ResearchPipeline::new(config).unwrap().run(&panel).unwrap();

    let equities = output.returns.asset("equities").unwrap();
    assert_eq!(equities.spec.column, "spx");
    assert_eq!(equities.usable_count(), 59);
    assert!(output.thresholds.rate_level.is_defined());

    let baseline = pipeline()
        .run(&SyntheticPanel::cyclical(60).into_panel())
        .unwrap();
    assert_eq!(output.returns.regimes().labels(), baseline.returns.regimes().labels());
    assert_eq!(equities.values, baseline.returns.asset("equities").unwrap().values);
}

#[test]
fn test_panel_csv_round_trip_through_run() {
    let panel = SyntheticPanel::cyclical(48)
        .set("short_yield", 10, None)
        .into_panel();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("panel.csv");

    panel.write_csv(&path).unwrap();
    let reloaded = Panel::read_csv(&path).unwrap();
    assert_eq!(reloaded.len(), panel.len());
    assert_eq!(reloaded.column("short_yield").unwrap()[10], None);

    let a = pipeline().run(&panel).unwrap();
    let b = pipeline().run(&reloaded).unwrap();
    assert_eq!(a.thresholds.rate_level.n_obs, b.thresholds.rate_level.n_obs);
    assert_eq!(a.returns.regimes().labels(), b.returns.regimes().labels());
}

fn monthly(id: &str, months: u32, f: impl Fn(u32) -> f64) -> Series {
    Series::new(
        id,
        (0..months)
            .map(|i| Observation::new(date(2020 + (i / 12) as i32, i % 12 + 1, 1), Some(f(i))))
            .collect(),
    )
}

fn daily(id: &str, start: NaiveDate, days: i64, f: impl Fn(i64) -> f64) -> Series {
    Series::new(
        id,
        (0..days)
            .map(|i| Observation::new(start + Duration::days(i), Some(f(i))))
            .collect(),
    )
}

fn store(months: u32) -> InMemorySeriesStore {
    let days = date(2020 + (months / 12) as i32, months % 12 + 1, 1)
        .signed_duration_since(date(2020, 1, 1))
        .num_days();

    let mut store = InMemorySeriesStore::new();
    store.insert(monthly("FEDFUNDS", months, |i| 1.0 + 0.1 * i as f64));
    store.insert(monthly("CPIAUCSL", months, |i| 250.0 + i as f64));
    store.insert(monthly("TB3MS", months, |_| 1.5));
    store.insert(daily("SP500", date(2020, 1, 1), days, |i| 3000.0 + i as f64));
    store.insert(daily("DGS10", date(2020, 1, 1), days, |i| (i % 2) as f64));
    store
}

#[test]
fn test_build_panel_from_mixed_frequencies() {
    let panel = pipeline()
        .build_panel(&store(3), date(2020, 1, 1), date(2020, 12, 31))
        .unwrap();

    assert_eq!(
        panel.dates(),
        &[date(2020, 1, 31), date(2020, 2, 29), date(2020, 3, 31)]
    );
    // Last daily close of each month
    assert_eq!(panel.column("equity_index").unwrap()[0], Some(3030.0));
    assert_eq!(panel.column("equity_index").unwrap()[1], Some(3059.0));
    // Monthly average of a 0/1 alternating daily yield
    let jan = panel.column("long_yield").unwrap()[0].unwrap();
    assert_relative_eq!(jan, 15.0 / 31.0, epsilon = 1e-12);
    assert_relative_eq!(panel.column("policy_rate").unwrap()[2].unwrap(), 1.2, epsilon = 1e-12);
}

#[test]
fn test_build_panel_missing_series_is_fatal() {
    let mut store = store(3);
    store.insert(Series::new("TB3MS", Vec::new()));

    let result = pipeline().build_panel(&store, date(2020, 1, 1), date(2020, 12, 31));
    assert!(result.is_err());
}

#[test]
fn test_csv_store_to_research_output() {
    let dir = TempDir::new().unwrap();
    let memory = store(36);
    for id in memory.ids() {
        let series = macro_regimes::data::SeriesStore::fetch(
            &memory,
            &id,
            date(2020, 1, 1),
            date(2022, 12, 31),
        )
        .unwrap();
        CsvSeriesStore::write_file(&series, &dir.path().join(format!("{}.csv", id))).unwrap();
    }

    let csv_store = CsvSeriesStore::new(dir.path());
    let pipeline = pipeline();
    let panel = pipeline
        .build_panel(&csv_store, date(2020, 1, 1), date(2022, 12, 31))
        .unwrap();
    assert_eq!(panel.len(), 36);

    let output = pipeline.run(&panel).unwrap();
    let labels = output.returns.regimes().labels();
    assert!(labels[12..]
        .iter()
        .all(|l| l.rate_direction == Some(RateDirection::Rising)));
    assert!(output.thresholds.rate_level.is_defined());
}
