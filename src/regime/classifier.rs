//! Regime classifier
//!
//! Derives year-over-year inflation and the 12-month policy-rate change,
//! computes full-sample thresholds once, and labels every month
//! independently against them.

use crate::config::{ColumnMap, RegimeConfig};
use crate::data::panel::Panel;
use crate::derived::{difference, percent_change};
use crate::error::{RegimeError, Result};
use crate::regime::labels::{InflationRegime, RateDirection, RateLevel, RegimeLabels, RegimeType};
use crate::regime::thresholds::{Band, PercentileThresholds, Thresholds};
use crate::types::{MonthEnd, Value, MISSING_LABEL};
use serde::{Deserialize, Serialize};

/// Column holding year-over-year CPI growth in percent
pub const INFLATION_YOY: &str = "inflation_yoy";
/// Column holding the policy-rate change over the lookback window
pub const RATE_CHANGE_12M: &str = "rate_change_12m";

/// Panel with derived fields plus one set of regime labels per month
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeTable {
    panel: Panel,
    labels: Vec<RegimeLabels>,
}

impl RegimeTable {
    /// Pair a panel with one set of labels per row
    pub fn new(panel: Panel, labels: Vec<RegimeLabels>) -> Result<Self> {
        if labels.len() != panel.len() {
            return Err(RegimeError::ColumnLengthMismatch {
                column: "regime labels".to_string(),
                expected: panel.len(),
                actual: labels.len(),
            });
        }
        Ok(Self { panel, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn dates(&self) -> &[MonthEnd] {
        self.panel.dates()
    }

    /// Original columns plus `inflation_yoy` and `rate_change_12m`
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn labels(&self) -> &[RegimeLabels] {
        &self.labels
    }

    /// One regime type's labels for every month
    pub fn label_column(&self, regime_type: RegimeType) -> Vec<Option<String>> {
        self.labels.iter().map(|l| l.label(regime_type)).collect()
    }
}

/// Frequency of one label value for one regime type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRow {
    pub regime_type: RegimeType,
    pub label: String,
    pub count: usize,
}

/// Everything one classification run produces
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub table: RegimeTable,
    pub thresholds: Thresholds,
    pub counts: Vec<CountRow>,
}

/// Labels each month of a panel with rate and inflation regimes
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    columns: ColumnMap,
    config: RegimeConfig,
}

impl RegimeClassifier {
    pub fn new(columns: ColumnMap, config: RegimeConfig) -> Self {
        Self { columns, config }
    }

    pub fn config(&self) -> &RegimeConfig {
        &self.config
    }

    /// Classify every month of `panel`.
    ///
    /// Fails only when the policy-rate or CPI column is absent or the
    /// configuration is invalid. Missing values and thin samples surface as
    /// undefined labels.
    pub fn classify(&self, panel: &Panel) -> Result<Classification> {
        self.config.validate()?;

        let rate = panel.require(&self.columns.policy_rate)?;
        let cpi = panel.require(&self.columns.cpi)?;
        let lookback = self.config.lookback_months;

        let inflation = percent_change(cpi, lookback);
        let rate_change = difference(rate, lookback);

        let thresholds = Thresholds::compute(rate, &inflation, &self.config);
        log_thresholds("rate level", &thresholds.rate_level, self.config.min_threshold_obs);
        log_thresholds("inflation", &thresholds.inflation, self.config.min_threshold_obs);

        let labels: Vec<RegimeLabels> = (0..panel.len())
            .map(|row| classify_record(rate[row], inflation[row], rate_change[row], &thresholds))
            .collect();

        let panel = panel
            .with_column(INFLATION_YOY, inflation)?
            .with_column(RATE_CHANGE_12M, rate_change)?;
        let counts = count_labels(&labels);

        log::info!(
            "Classified {} months ({} with a joint regime)",
            labels.len(),
            labels.iter().filter(|l| l.joint().is_some()).count()
        );

        Ok(Classification {
            table: RegimeTable { panel, labels },
            thresholds,
            counts,
        })
    }
}

fn log_thresholds(metric: &str, thresholds: &PercentileThresholds, min_obs: usize) {
    match (thresholds.lower, thresholds.upper) {
        (Some(lower), Some(upper)) => log::info!(
            "{} thresholds from {} observations: lower={:.4} upper={:.4}",
            metric,
            thresholds.n_obs,
            lower,
            upper
        ),
        _ => log::warn!(
            "{} thresholds undefined: {} observations, {} required",
            metric,
            thresholds.n_obs,
            min_obs
        ),
    }
}

/// Direction from the rate change versus a fixed symmetric band
pub fn classify_direction(rate_change: Value, band: f64) -> Option<RateDirection> {
    let change = rate_change?;
    Some(if change > band {
        RateDirection::Rising
    } else if change < -band {
        RateDirection::Falling
    } else {
        RateDirection::Stable
    })
}

pub fn classify_level(rate: Value, thresholds: &PercentileThresholds) -> Option<RateLevel> {
    thresholds.band(rate).map(|band| match band {
        Band::Lower => RateLevel::Low,
        Band::Middle => RateLevel::Mid,
        Band::Upper => RateLevel::High,
    })
}

pub fn classify_inflation(
    inflation: Value,
    thresholds: &PercentileThresholds,
) -> Option<InflationRegime> {
    thresholds.band(inflation).map(|band| match band {
        Band::Lower => InflationRegime::Low,
        Band::Middle => InflationRegime::Moderate,
        Band::Upper => InflationRegime::High,
    })
}

/// Labels of one month; uses nothing but its own inputs and the thresholds
pub fn classify_record(
    rate: Value,
    inflation: Value,
    rate_change: Value,
    thresholds: &Thresholds,
) -> RegimeLabels {
    RegimeLabels {
        rate_direction: classify_direction(rate_change, thresholds.direction_band),
        rate_level: classify_level(rate, &thresholds.rate_level),
        inflation: classify_inflation(inflation, &thresholds.inflation),
    }
}

/// Count of every label value per classified regime type, with undefined
/// records counted under `Missing`
pub fn count_labels(labels: &[RegimeLabels]) -> Vec<CountRow> {
    RegimeType::CLASSIFIED
        .iter()
        .flat_map(|&regime_type| {
            let column: Vec<Option<String>> = labels.iter().map(|l| l.label(regime_type)).collect();

            let mut rows: Vec<CountRow> = regime_type
                .domain()
                .into_iter()
                .map(|label| CountRow {
                    regime_type,
                    count: column.iter().filter(|l| l.as_deref() == Some(label.as_str())).count(),
                    label,
                })
                .collect();
            rows.push(CountRow {
                regime_type,
                label: MISSING_LABEL.to_string(),
                count: column.iter().filter(|l| l.is_none()).count(),
            });
            rows
        })
        .collect()
}
