//! Observation frequency and month-end alignment utilities

use crate::error::{RegimeError, Result};
use crate::types::MonthEnd;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Native frequency of a raw series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// One observation per business day
    Daily,
    /// One observation per week
    Weekly,
    /// One observation per month
    Monthly,
    /// One observation per quarter
    Quarterly,
}

impl Frequency {
    /// Typical number of observations per calendar year
    pub fn periods_per_year(&self) -> usize {
        match self {
            Frequency::Daily => 252,
            Frequency::Weekly => 52,
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
        }
    }

    /// Check if this frequency is higher (more frequent) than another
    pub fn is_higher_than(&self, other: Frequency) -> bool {
        self.periods_per_year() > other.periods_per_year()
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
        }
    }

    /// Parse from string (accepts the single-letter codes data vendors use)
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "daily" | "d" => Ok(Frequency::Daily),
            "weekly" | "w" => Ok(Frequency::Weekly),
            "monthly" | "m" => Ok(Frequency::Monthly),
            "quarterly" | "q" => Ok(Frequency::Quarterly),
            _ => Err(RegimeError::ParseError(format!("Unknown frequency: {}", s))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Last calendar day of the month containing `date`
pub fn month_end(date: NaiveDate) -> MonthEnd {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Check if a date is already a month-end
pub fn is_month_end(date: NaiveDate) -> bool {
    month_end(date) == date
}

/// Month-end `months` months after (or before, when negative) `date`
pub fn shift_months(date: MonthEnd, months: i32) -> Option<MonthEnd> {
    let first = date.with_day(1)?;
    let shifted = if months >= 0 {
        first.checked_add_months(Months::new(months as u32))?
    } else {
        first.checked_sub_months(Months::new(months.unsigned_abs()))?
    };
    Some(month_end(shifted))
}

/// Number of whole months from `start` to `end` (negative when `end` precedes `start`)
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32
}

/// Every month-end from the month of `start` through the month of `end`, inclusive
pub fn monthly_grid(start: NaiveDate, end: NaiveDate) -> Vec<MonthEnd> {
    let span = months_between(start, end);
    if span < 0 {
        return Vec::new();
    }

    let first = month_end(start);
    (0..=span).filter_map(|m| shift_months(first, m)).collect()
}
