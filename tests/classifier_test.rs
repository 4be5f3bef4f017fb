//! Integration tests for the regime classifier
//!
//! Covers threshold derivation, per-month labelling and the rule that a gap
//! in the data marks records undefined instead of aborting the run.

mod common;

use approx::assert_relative_eq;
use common::{present, SyntheticPanel};
use macro_regimes::config::{ColumnMap, RegimeConfig};
use macro_regimes::data::Panel;
use macro_regimes::error::RegimeError;
use macro_regimes::regime::classifier::{classify_direction, classify_level};
use macro_regimes::regime::{
    InflationRegime, JointRegime, PercentileThresholds, RateDirection, RateLevel,
    RegimeClassifier, RegimeType,
};
use macro_regimes::types::{Value, MISSING_LABEL};
use proptest::prelude::*;

fn classifier() -> RegimeClassifier {
    RegimeClassifier::new(ColumnMap::default(), RegimeConfig::default())
}

fn rate_cpi_panel(rates: Vec<Value>, cpi: Vec<Value>) -> Panel {
    Panel::new(
        common::grid(rates.len()),
        vec![("policy_rate".to_string(), rates), ("cpi".to_string(), cpi)],
    )
    .unwrap()
}

#[test]
fn test_short_history_leaves_levels_undefined() {
    let panel = SyntheticPanel::cyclical(20).into_panel();
    let result = classifier().classify(&panel).unwrap();

    assert!(!result.thresholds.rate_level.is_defined());
    assert!(!result.thresholds.inflation.is_defined());
    assert_eq!(result.thresholds.rate_level.n_obs, 20);

    for labels in result.table.labels() {
        assert_eq!(labels.rate_level, None);
        assert_eq!(labels.inflation, None);
        assert_eq!(labels.joint(), None);
    }

    // Direction only needs the 12-month change
    let directions = result.table.label_column(RegimeType::RateDirection);
    assert!(directions[..12].iter().all(Option::is_none));
    assert!(directions[12..].iter().all(Option::is_some));

    let missing_levels = result
        .counts
        .iter()
        .find(|r| r.regime_type == RegimeType::RateLevel && r.label == MISSING_LABEL)
        .unwrap();
    assert_eq!(missing_levels.count, 20);
}

#[test]
fn test_rate_level_quartiles() {
    let rates = present((1..=24).map(f64::from));
    let cpi = present((0..24).map(|i| 100.0 + i as f64));
    let result = classifier().classify(&rate_cpi_panel(rates, cpi)).unwrap();

    assert_relative_eq!(result.thresholds.rate_level.lower.unwrap(), 6.75, epsilon = 1e-12);
    assert_relative_eq!(result.thresholds.rate_level.upper.unwrap(), 18.25, epsilon = 1e-12);

    let levels: Vec<Option<RateLevel>> =
        result.table.labels().iter().map(|l| l.rate_level).collect();
    assert!(levels[..6].iter().all(|l| *l == Some(RateLevel::Low)));
    assert!(levels[6..18].iter().all(|l| *l == Some(RateLevel::Mid)));
    assert!(levels[18..].iter().all(|l| *l == Some(RateLevel::High)));

    // Only 12 YoY inflation values exist, below the 24 required
    assert_eq!(result.thresholds.inflation.n_obs, 12);
    assert!(result.table.labels().iter().all(|l| l.inflation.is_none()));
}

#[test]
fn test_boundary_values_fall_in_middle() {
    let values = present((1..=25).map(f64::from));
    let thresholds = PercentileThresholds::compute(&values, 0.25, 0.75, 24);

    assert_eq!(thresholds.lower, Some(7.0));
    assert_eq!(thresholds.upper, Some(19.0));
    assert_eq!(classify_level(Some(7.0), &thresholds), Some(RateLevel::Mid));
    assert_eq!(classify_level(Some(19.0), &thresholds), Some(RateLevel::Mid));
    assert_eq!(classify_level(Some(6.99), &thresholds), Some(RateLevel::Low));
    assert_eq!(classify_level(Some(19.01), &thresholds), Some(RateLevel::High));
    assert_eq!(classify_level(None, &thresholds), None);
}

#[test]
fn test_direction_band_edges_are_stable() {
    assert_eq!(classify_direction(Some(0.25), 0.25), Some(RateDirection::Stable));
    assert_eq!(classify_direction(Some(-0.25), 0.25), Some(RateDirection::Stable));
    assert_eq!(classify_direction(Some(0.2501), 0.25), Some(RateDirection::Rising));
    assert_eq!(classify_direction(Some(-0.2501), 0.25), Some(RateDirection::Falling));
    assert_eq!(classify_direction(None, 0.25), None);
}

#[test]
fn test_missing_cpi_month_is_local() {
    let panel = SyntheticPanel::cyclical(48)
        .set("cpi", 30, None)
        .into_panel();
    let result = classifier().classify(&panel).unwrap();
    let inflation_yoy = result.table.panel().column("inflation_yoy").unwrap();

    // The gap poisons its own YoY value and the one twelve months later
    assert_eq!(inflation_yoy[30], None);
    assert_eq!(inflation_yoy[42], None);
    assert!(inflation_yoy[31].is_some());
    assert!(inflation_yoy[41].is_some());

    assert!(result.thresholds.inflation.is_defined());
    let labels = result.table.labels();
    assert_eq!(labels[30].inflation, None);
    assert_eq!(labels[42].inflation, None);
    assert!(labels[31].inflation.is_some());
    assert!(labels[30].rate_direction.is_some());
    assert!(labels[30].rate_level.is_some());
}

#[test]
fn test_nan_rate_gets_undefined_level() {
    let panel = SyntheticPanel::cyclical(60)
        .set("policy_rate", 3, Some(f64::NAN))
        .into_panel();
    let result = classifier().classify(&panel).unwrap();

    assert_eq!(result.table.panel().column("policy_rate").unwrap()[3], None);
    assert_eq!(result.thresholds.rate_level.n_obs, 59);
    assert_eq!(result.table.labels()[3].rate_level, None);
    assert!(result.table.labels()[4].rate_level.is_some());
    // The NaN month has no 12-month change either
    assert_eq!(result.table.labels()[15].rate_direction, None);
}

#[test]
fn test_zero_cpi_base_is_undefined() {
    let panel = SyntheticPanel::cyclical(36)
        .set("cpi", 5, Some(0.0))
        .into_panel();
    let result = classifier().classify(&panel).unwrap();
    let inflation_yoy = result.table.panel().column("inflation_yoy").unwrap();

    assert_eq!(inflation_yoy[17], None);
    assert!(inflation_yoy[18].is_some());
}

#[test]
fn test_missing_cpi_column_is_fatal() {
    let panel = Panel::new(
        common::grid(3),
        vec![("policy_rate".to_string(), present([1.0, 2.0, 3.0]))],
    )
    .unwrap();

    match classifier().classify(&panel) {
        Err(RegimeError::MissingColumn(name)) => assert_eq!(name, "cpi"),
        other => panic!("expected MissingColumn, got {:?}", other),
    }
}

#[test]
fn test_counts_cover_every_month() {
    let panel = SyntheticPanel::cyclical(60).into_panel();
    let result = classifier().classify(&panel).unwrap();

    for regime_type in RegimeType::CLASSIFIED {
        let rows: Vec<_> = result
            .counts
            .iter()
            .filter(|r| r.regime_type == regime_type)
            .collect();
        assert_eq!(rows.len(), regime_type.domain().len() + 1);
        assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), 60);
    }
}

#[test]
fn test_joint_regime_label() {
    let joint = JointRegime {
        inflation: InflationRegime::High,
        direction: RateDirection::Rising,
    };
    assert_eq!(joint.to_string(), "High_Rising");
    assert_eq!(JointRegime::all().len(), 9);
    assert!(RegimeType::Joint.contains("Moderate_Stable"));
}

#[test]
fn test_classification_is_deterministic() {
    let panel = SyntheticPanel::cyclical(72).into_panel();
    let first = classifier().classify(&panel).unwrap();
    let second = classifier().classify(&panel).unwrap();

    assert_eq!(first, second);
}

proptest! {
    #[test]
    fn prop_direction_is_symmetric(change in -5.0f64..5.0) {
        let up = classify_direction(Some(change), 0.25);
        let down = classify_direction(Some(-change), 0.25);
        let mirrored = match up {
            Some(RateDirection::Rising) => Some(RateDirection::Falling),
            Some(RateDirection::Falling) => Some(RateDirection::Rising),
            other => other,
        };
        prop_assert_eq!(down, mirrored);
    }

    #[test]
    fn prop_direction_follows_band(change in -5.0f64..5.0) {
        let expected = if change > 0.25 {
            RateDirection::Rising
        } else if change < -0.25 {
            RateDirection::Falling
        } else {
            RateDirection::Stable
        };
        prop_assert_eq!(classify_direction(Some(change), 0.25), Some(expected));
    }

    #[test]
    fn prop_thresholds_ignore_order_and_gaps(
        values in prop::collection::vec(-10.0f64..10.0, 24..80)
    ) {
        let forward = present(values.iter().copied());
        let mut reversed: Vec<Value> = forward.iter().rev().copied().collect();
        reversed.push(None);

        let a = PercentileThresholds::compute(&forward, 0.25, 0.75, 24);
        let b = PercentileThresholds::compute(&reversed, 0.25, 0.75, 24);

        prop_assert_eq!(a, b);
        prop_assert!(a.lower.unwrap() <= a.upper.unwrap());
    }
}
