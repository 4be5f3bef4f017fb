//! Core types and constants

use chrono::NaiveDate;

/// Calendar month-end date keying every panel row
pub type MonthEnd = NaiveDate;

/// A possibly-missing numeric observation
pub type Value = Option<f64>;

/// One column of a panel, aligned with the panel's dates
pub type Column = Vec<Value>;

/// Label written for a missing regime
pub const UNDEFINED_LABEL: &str = "Undefined";

/// Pseudo-label used by the count report for records without a regime
pub const MISSING_LABEL: &str = "Missing";

/// Trap non-finite arithmetic results (division by zero, log of non-positive)
/// and turn them into a missing value
pub fn finite(value: f64) -> Value {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}
