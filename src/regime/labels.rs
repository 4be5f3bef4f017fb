//! Categorical regime labels
//!
//! A missing regime is `None` wherever a label is stored, so no arithmetic or
//! grouping can mistake "no regime" for a real one.

use crate::error::{RegimeError, Result};
use crate::types::UNDEFINED_LABEL;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the policy rate over the lookback window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateDirection {
    Rising,
    Falling,
    Stable,
}

impl RateDirection {
    pub const ALL: [RateDirection; 3] = [
        RateDirection::Rising,
        RateDirection::Falling,
        RateDirection::Stable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RateDirection::Rising => "Rising",
            RateDirection::Falling => "Falling",
            RateDirection::Stable => "Stable",
        }
    }
}

/// Policy-rate level relative to its own history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateLevel {
    Low,
    Mid,
    High,
}

impl RateLevel {
    pub const ALL: [RateLevel; 3] = [RateLevel::Low, RateLevel::Mid, RateLevel::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RateLevel::Low => "Low",
            RateLevel::Mid => "Mid",
            RateLevel::High => "High",
        }
    }
}

/// Year-over-year inflation relative to its own history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InflationRegime {
    Low,
    Moderate,
    High,
}

impl InflationRegime {
    pub const ALL: [InflationRegime; 3] = [
        InflationRegime::Low,
        InflationRegime::Moderate,
        InflationRegime::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InflationRegime::Low => "Low",
            InflationRegime::Moderate => "Moderate",
            InflationRegime::High => "High",
        }
    }
}

/// Inflation regime crossed with rate direction, e.g. `High_Rising`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JointRegime {
    pub inflation: InflationRegime,
    pub direction: RateDirection,
}

impl JointRegime {
    pub fn all() -> Vec<JointRegime> {
        InflationRegime::ALL
            .iter()
            .flat_map(|&inflation| {
                RateDirection::ALL
                    .iter()
                    .map(move |&direction| JointRegime { inflation, direction })
            })
            .collect()
    }
}

impl fmt::Display for RateDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RateLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for InflationRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for JointRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.inflation, self.direction)
    }
}

/// Label of the unconditional pseudo-regime
pub const ALL_LABEL: &str = "All";

/// The regime dimensions records can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeType {
    /// Every record in one group; the unconditional baseline
    All,
    RateDirection,
    RateLevel,
    Inflation,
    Joint,
}

impl RegimeType {
    /// Regime types produced by the classifier
    pub const CLASSIFIED: [RegimeType; 4] = [
        RegimeType::RateDirection,
        RegimeType::RateLevel,
        RegimeType::Inflation,
        RegimeType::Joint,
    ];

    /// Classified types plus the unconditional baseline
    pub const ALL_TYPES: [RegimeType; 5] = [
        RegimeType::All,
        RegimeType::RateDirection,
        RegimeType::RateLevel,
        RegimeType::Inflation,
        RegimeType::Joint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegimeType::All => "all",
            RegimeType::RateDirection => "rate_direction",
            RegimeType::RateLevel => "rate_level",
            RegimeType::Inflation => "inflation",
            RegimeType::Joint => "joint",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "all" => Ok(RegimeType::All),
            "rate_direction" | "direction" => Ok(RegimeType::RateDirection),
            "rate_level" | "level" => Ok(RegimeType::RateLevel),
            "inflation" => Ok(RegimeType::Inflation),
            "joint" => Ok(RegimeType::Joint),
            _ => Err(RegimeError::ParseError(format!("Unknown regime type: {}", s))),
        }
    }

    /// Every defined label this type can take, in report order
    pub fn domain(&self) -> Vec<String> {
        match self {
            RegimeType::All => vec![ALL_LABEL.to_string()],
            RegimeType::RateDirection => {
                RateDirection::ALL.iter().map(|l| l.to_string()).collect()
            }
            RegimeType::RateLevel => RateLevel::ALL.iter().map(|l| l.to_string()).collect(),
            RegimeType::Inflation => InflationRegime::ALL.iter().map(|l| l.to_string()).collect(),
            RegimeType::Joint => JointRegime::all().iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.domain().iter().any(|l| l == label)
    }
}

impl fmt::Display for RegimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regime labels of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegimeLabels {
    pub rate_direction: Option<RateDirection>,
    pub rate_level: Option<RateLevel>,
    pub inflation: Option<InflationRegime>,
}

impl RegimeLabels {
    /// Joint regime; defined only when both constituents are
    pub fn joint(&self) -> Option<JointRegime> {
        match (self.inflation, self.rate_direction) {
            (Some(inflation), Some(direction)) => Some(JointRegime { inflation, direction }),
            _ => None,
        }
    }

    /// Label for one regime type, `None` when undefined
    pub fn label(&self, regime_type: RegimeType) -> Option<String> {
        match regime_type {
            RegimeType::All => Some(ALL_LABEL.to_string()),
            RegimeType::RateDirection => self.rate_direction.map(|l| l.to_string()),
            RegimeType::RateLevel => self.rate_level.map(|l| l.to_string()),
            RegimeType::Inflation => self.inflation.map(|l| l.to_string()),
            RegimeType::Joint => self.joint().map(|l| l.to_string()),
        }
    }

    /// Rebuild labels from their display form; `Undefined` or blank is `None`
    pub fn parse(rate_direction: &str, rate_level: &str, inflation: &str) -> Result<Self> {
        Ok(Self {
            rate_direction: parse_label(rate_direction, &RateDirection::ALL, RegimeType::RateDirection)?,
            rate_level: parse_label(rate_level, &RateLevel::ALL, RegimeType::RateLevel)?,
            inflation: parse_label(inflation, &InflationRegime::ALL, RegimeType::Inflation)?,
        })
    }

    /// Label for display and file output, `Undefined` when missing
    pub fn display_label(&self, regime_type: RegimeType) -> String {
        self.label(regime_type)
            .unwrap_or_else(|| UNDEFINED_LABEL.to_string())
    }
}

fn parse_label<T: Copy + fmt::Display>(
    raw: &str,
    domain: &[T],
    regime_type: RegimeType,
) -> Result<Option<T>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == UNDEFINED_LABEL {
        return Ok(None);
    }
    domain
        .iter()
        .find(|label| label.to_string() == raw)
        .map(|label| Some(*label))
        .ok_or_else(|| {
            RegimeError::ParseError(format!("'{}' is not a {} label", raw, regime_type))
        })
}
