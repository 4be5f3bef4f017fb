//! Regime classification: derived macro fields, thresholds and labels

pub mod classifier;
pub mod labels;
pub mod thresholds;

pub use classifier::{
    Classification, CountRow, RegimeClassifier, RegimeTable, INFLATION_YOY, RATE_CHANGE_12M,
};
pub use labels::{InflationRegime, JointRegime, RateDirection, RateLevel, RegimeLabels, RegimeType};
pub use thresholds::{PercentileThresholds, ThresholdRow, Thresholds};
