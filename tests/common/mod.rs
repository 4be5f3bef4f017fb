//! Synthetic monthly panels shared by the integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use macro_regimes::config::ColumnMap;
use macro_regimes::data::frequency::{monthly_grid, shift_months};
use macro_regimes::data::Panel;
use macro_regimes::types::{Column, Value};

pub fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 31).unwrap()
}

pub fn grid(months: usize) -> Vec<NaiveDate> {
    let end = shift_months(start(), months as i32 - 1).unwrap();
    monthly_grid(start(), end)
}

pub fn present(values: impl IntoIterator<Item = f64>) -> Column {
    values.into_iter().map(Some).collect()
}

/// Columns for every field the default configuration reads
pub struct SyntheticPanel {
    pub policy_rate: Column,
    pub cpi: Column,
    pub equity_index: Column,
    pub long_yield: Column,
    pub short_yield: Column,
}

impl SyntheticPanel {
    /// Rates and prices that vary smoothly month to month
    pub fn cyclical(months: usize) -> Self {
        let t = |i: usize| i as f64;
        Self {
            policy_rate: present((0..months).map(|i| 3.0 + 2.5 * (t(i) / 9.0).sin())),
            cpi: present(
                (0..months).map(|i| 100.0 * (1.0 + 0.002 * t(i) + 0.01 * (t(i) / 7.0).sin())),
            ),
            equity_index: present((0..months).map(|i| 100.0 + t(i) + 5.0 * (t(i) / 3.0).cos())),
            long_yield: present((0..months).map(|i| 4.0 + 0.5 * (t(i) / 5.0).sin())),
            short_yield: present((0..months).map(|i| 2.0 + 0.3 * (t(i) / 4.0).cos())),
        }
    }

    /// Policy rate up 0.5pp every 12 months, equity alternating 100/105
    pub fn rising_rates(months: usize) -> Self {
        Self {
            policy_rate: present((0..months).map(|i| 1.0 + 0.5 * (i / 12) as f64)),
            cpi: present((0..months).map(|i| 100.0 + i as f64 * 0.25)),
            equity_index: present((0..months).map(|i| if i % 2 == 0 { 100.0 } else { 105.0 })),
            long_yield: vec![Some(4.0); months],
            short_yield: vec![Some(2.0); months],
        }
    }

    pub fn set(mut self, column: &str, row: usize, value: Value) -> Self {
        let target = match column {
            "policy_rate" => &mut self.policy_rate,
            "cpi" => &mut self.cpi,
            "equity_index" => &mut self.equity_index,
            "long_yield" => &mut self.long_yield,
            "short_yield" => &mut self.short_yield,
            other => panic!("unknown column {}", other),
        };
        target[row] = value;
        self
    }

    pub fn into_panel(self) -> Panel {
        self.into_panel_named(&ColumnMap::default())
    }

    /// Panel whose columns carry the names of a custom column map
    pub fn into_panel_named(self, columns: &ColumnMap) -> Panel {
        let months = self.policy_rate.len();
        Panel::new(
            grid(months),
            vec![
                (columns.policy_rate.clone(), self.policy_rate),
                (columns.cpi.clone(), self.cpi),
                (columns.equity_index.clone(), self.equity_index),
                (columns.long_yield.clone(), self.long_yield),
                (columns.short_yield.clone(), self.short_yield),
            ],
        )
        .unwrap()
    }
}
