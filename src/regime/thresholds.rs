//! Full-sample distributional thresholds
//!
//! Percentiles use linear interpolation between order statistics with
//! `h = (n - 1) * p` (Hyndman-Fan type 7), the convention of most dataframe
//! libraries. Thresholds are computed once over every non-missing value and
//! handed to the classifier as an immutable value.

use crate::config::RegimeConfig;
use crate::types::Value;
use serde::{Deserialize, Serialize};

/// Linear-interpolation percentile of an ascending-sorted, non-empty sample.
///
/// `p` is a fraction in `[0, 1]`.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }

    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let weight = h - lo as f64;
    Some(sorted[lo] + weight * (sorted[hi] - sorted[lo]))
}

/// Present finite values of a column, sorted ascending
pub fn sorted_present(values: &[Value]) -> Vec<f64> {
    let mut present: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    present.sort_by(|a, b| a.total_cmp(b));
    present
}

/// Lower/upper percentile pair for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileThresholds {
    /// Non-missing observations the thresholds were computed from
    pub n_obs: usize,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl PercentileThresholds {
    /// Compute thresholds, or leave both undefined when fewer than
    /// `min_obs` values are present
    pub fn compute(values: &[Value], lower_p: f64, upper_p: f64, min_obs: usize) -> Self {
        let sorted = sorted_present(values);
        let n_obs = sorted.len();

        if n_obs < min_obs.max(1) {
            return Self {
                n_obs,
                lower: None,
                upper: None,
            };
        }

        Self {
            n_obs,
            lower: percentile_sorted(&sorted, lower_p),
            upper: percentile_sorted(&sorted, upper_p),
        }
    }

    pub fn is_defined(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    /// Place a value in the lower, middle or upper band.
    ///
    /// Strictly below `lower` is the lower band, strictly above `upper` is the
    /// upper band; everything in between (inclusive) is the middle. NaN has
    /// no band.
    pub fn band(&self, value: Value) -> Option<Band> {
        let value = value.filter(|v| v.is_finite())?;
        let (lower, upper) = (self.lower?, self.upper?);
        Some(if value < lower {
            Band::Lower
        } else if value > upper {
            Band::Upper
        } else {
            Band::Middle
        })
    }
}

/// Position of a value relative to a threshold pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Lower,
    Middle,
    Upper,
}

/// Every threshold used by one classification run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub rate_level: PercentileThresholds,
    pub inflation: PercentileThresholds,
    /// Symmetric band around zero for the 12-month rate change
    pub direction_band: f64,
    pub lower_percentile: f64,
    pub upper_percentile: f64,
}

impl Thresholds {
    /// Compute thresholds from the full sample of both metrics
    pub fn compute(rate_level: &[Value], inflation: &[Value], config: &RegimeConfig) -> Self {
        let compute = |values: &[Value]| {
            PercentileThresholds::compute(
                values,
                config.lower_percentile,
                config.upper_percentile,
                config.min_threshold_obs,
            )
        };

        Self {
            rate_level: compute(rate_level),
            inflation: compute(inflation),
            direction_band: config.direction_band,
            lower_percentile: config.lower_percentile,
            upper_percentile: config.upper_percentile,
        }
    }

    /// Threshold report rows: one per metric
    pub fn report(&self) -> Vec<ThresholdRow> {
        let percentile_method = format!(
            "percentile_linear_p{}_p{}",
            (self.lower_percentile * 100.0).round(),
            (self.upper_percentile * 100.0).round()
        );

        vec![
            ThresholdRow {
                metric: "rate_level".to_string(),
                method: percentile_method.clone(),
                n_obs: Some(self.rate_level.n_obs),
                lower: self.rate_level.lower,
                upper: self.rate_level.upper,
            },
            ThresholdRow {
                metric: "inflation_yoy".to_string(),
                method: percentile_method,
                n_obs: Some(self.inflation.n_obs),
                lower: self.inflation.lower,
                upper: self.inflation.upper,
            },
            ThresholdRow {
                metric: "rate_change_12m".to_string(),
                method: "fixed_band".to_string(),
                n_obs: None,
                lower: Some(-self.direction_band),
                upper: Some(self.direction_band),
            },
        ]
    }
}

/// One row of the threshold report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRow {
    pub metric: String,
    pub method: String,
    pub n_obs: Option<usize>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}
