//! Per-asset period returns joined to regime labels

use crate::derived::{log_return, simple_yield_return, yield_change};
use crate::error::{RegimeError, Result};
use crate::regime::classifier::RegimeTable;
use crate::types::{Column, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a panel column turns into a monthly return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnRule {
    /// `ln(p[t] / p[t-1])` of a price index
    LogReturn,
    /// Annualized yield divided by the periods per year
    SimpleYield,
    /// Month-over-month yield difference (risk proxy)
    YieldChange,
}

impl ReturnRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnRule::LogReturn => "log_return",
            ReturnRule::SimpleYield => "simple_yield_return",
            ReturnRule::YieldChange => "yield_change",
        }
    }

    /// Apply the rule to a date-sorted column
    pub fn apply(&self, values: &[Value], periods_per_year: f64) -> Column {
        match self {
            ReturnRule::LogReturn => log_return(values),
            ReturnRule::SimpleYield => simple_yield_return(values, periods_per_year),
            ReturnRule::YieldChange => yield_change(values),
        }
    }
}

impl fmt::Display for ReturnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An asset category and the panel column its return comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub name: String,
    pub column: String,
    pub rule: ReturnRule,
}

impl AssetSpec {
    pub fn new(name: impl Into<String>, column: impl Into<String>, rule: ReturnRule) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            rule,
        }
    }
}

/// Monthly returns of one asset, aligned with the regime table
#[derive(Debug, Clone, PartialEq)]
pub struct AssetReturns {
    pub spec: AssetSpec,
    pub values: Column,
}

impl AssetReturns {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Usability flag per month: the return is defined
    pub fn usable(&self) -> Vec<bool> {
        self.values.iter().map(Option::is_some).collect()
    }

    pub fn usable_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Regime table enriched with per-asset returns
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnTable {
    regimes: RegimeTable,
    assets: Vec<AssetReturns>,
}

impl ReturnTable {
    /// Compute each asset's returns from its panel column.
    ///
    /// An asset whose column is absent is a fatal error; individual missing
    /// prices or yields only leave that month's return undefined.
    pub fn compute(
        regimes: RegimeTable,
        specs: &[AssetSpec],
        periods_per_year: f64,
    ) -> Result<ReturnTable> {
        let mut assets = Vec::with_capacity(specs.len());

        for spec in specs {
            let column = regimes.panel().require(&spec.column)?;
            let values = spec.rule.apply(column, periods_per_year);
            let returns = AssetReturns {
                spec: spec.clone(),
                values,
            };
            log::info!(
                "{}: {} of {} monthly returns defined ({})",
                spec.name,
                returns.usable_count(),
                regimes.len(),
                spec.rule
            );
            assets.push(returns);
        }

        Ok(ReturnTable { regimes, assets })
    }

    /// Assemble a table from already computed returns
    pub fn from_parts(regimes: RegimeTable, assets: Vec<AssetReturns>) -> Result<ReturnTable> {
        for asset in &assets {
            if asset.values.len() != regimes.len() {
                return Err(RegimeError::ColumnLengthMismatch {
                    column: asset.name().to_string(),
                    expected: regimes.len(),
                    actual: asset.values.len(),
                });
            }
        }
        Ok(ReturnTable { regimes, assets })
    }

    pub fn regimes(&self) -> &RegimeTable {
        &self.regimes
    }

    pub fn assets(&self) -> &[AssetReturns] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.regimes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regimes.is_empty()
    }

    pub fn asset(&self, name: &str) -> Option<&AssetReturns> {
        self.assets.iter().find(|a| a.name() == name)
    }

    pub fn require_asset(&self, name: &str) -> Result<&AssetReturns> {
        self.asset(name)
            .ok_or_else(|| RegimeError::DataError(format!("No returns computed for asset {}", name)))
    }

    /// Per-month flag: the joint regime is defined
    pub fn fully_labeled(&self) -> Vec<bool> {
        self.regimes
            .labels()
            .iter()
            .map(|l| l.joint().is_some())
            .collect()
    }
}
