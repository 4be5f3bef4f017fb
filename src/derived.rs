//! Lag-based transforms producing derived columns
//!
//! Every transform maps a column to a new column of equal length. A record
//! whose inputs are missing, or whose arithmetic would divide by zero or take
//! the log of a non-positive number, gets `None`; nothing here fails.
//!
//! Inputs must be sorted by date with one row per month, which `Panel`
//! guarantees, so a lag of `n` rows is a lag of `n` months.

use crate::types::{finite, Column, Value};

/// Percentage growth versus `lag` rows earlier: `(x[t] / x[t-lag] - 1) * 100`.
///
/// Undefined when either value is missing or the earlier value is not
/// strictly positive.
pub fn percent_change(values: &[Value], lag: usize) -> Column {
    lagged(values, lag, |current, prior| {
        if prior <= 0.0 {
            return None;
        }
        finite((current / prior - 1.0) * 100.0)
    })
}

/// Level difference versus `lag` rows earlier: `x[t] - x[t-lag]`
pub fn difference(values: &[Value], lag: usize) -> Column {
    lagged(values, lag, |current, prior| finite(current - prior))
}

/// Single-step log return `ln(x[t] / x[t-1])`.
///
/// Undefined when either price is missing or not strictly positive.
pub fn log_return(values: &[Value]) -> Column {
    lagged(values, 1, |current, prior| {
        if prior <= 0.0 || current <= 0.0 {
            return None;
        }
        finite((current / prior).ln())
    })
}

/// Annualized yield spread over `periods_per_year` periods, read as a
/// per-period simple return. Units follow the input (percent in, percent out).
pub fn simple_yield_return(values: &[Value], periods_per_year: f64) -> Column {
    values
        .iter()
        .map(|v| v.and_then(|y| finite(y / periods_per_year)))
        .collect()
}

/// Month-over-month change of a yield
pub fn yield_change(values: &[Value]) -> Column {
    difference(values, 1)
}

fn lagged<F>(values: &[Value], lag: usize, f: F) -> Column
where
    F: Fn(f64, f64) -> Value,
{
    values
        .iter()
        .enumerate()
        .map(|(idx, current)| {
            if lag == 0 || idx < lag {
                return None;
            }
            match (*current, values[idx - lag]) {
                (Some(current), Some(prior)) => f(current, prior),
                _ => None,
            }
        })
        .collect()
}
