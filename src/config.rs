//! Pipeline configuration
//!
//! Every default equals the fixed constant of the reference research design.
//! All structs deserialize with per-field defaults, so a config file only has
//! to name what it changes. Default assets and series read whatever column
//! names the `columns` section sets.

use crate::data::frequency::Frequency;
use crate::data::panel::{Aggregation, SeriesSpec};
use crate::error::{RegimeError, Result};
use crate::regime::labels::RegimeType;
use crate::returns::assets::{AssetSpec, ReturnRule};
use serde::{Deserialize, Serialize};

/// Names of the panel columns the core requires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub policy_rate: String,
    pub cpi: String,
    pub equity_index: String,
    pub long_yield: String,
    pub short_yield: String,
    /// Further panel columns assets or series may read
    pub extra: Vec<String>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            policy_rate: "policy_rate".to_string(),
            cpi: "cpi".to_string(),
            equity_index: "equity_index".to_string(),
            long_yield: "long_yield".to_string(),
            short_yield: "short_yield".to_string(),
            extra: Vec::new(),
        }
    }
}

impl ColumnMap {
    pub fn required(&self) -> [&str; 5] {
        [
            &self.policy_rate,
            &self.cpi,
            &self.equity_index,
            &self.long_yield,
            &self.short_yield,
        ]
    }

    /// Whether `name` is a required or declared extra column
    pub fn contains(&self, name: &str) -> bool {
        self.required().contains(&name) || self.extra.iter().any(|c| c == name)
    }
}

/// Regime classification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Rate changes strictly beyond +/- this many points are Rising/Falling
    pub direction_band: f64,
    /// Months between the two endpoints of YoY inflation and rate change
    pub lookback_months: usize,
    pub lower_percentile: f64,
    pub upper_percentile: f64,
    /// Fewer non-missing values than this leaves percentile thresholds undefined
    pub min_threshold_obs: usize,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            direction_band: 0.25,
            lookback_months: 12,
            lower_percentile: 0.25,
            upper_percentile: 0.75,
            min_threshold_obs: 24,
        }
    }
}

impl RegimeConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.direction_band.is_finite() || self.direction_band < 0.0 {
            return Err(RegimeError::ConfigError(format!(
                "direction_band must be a non-negative number, got {}",
                self.direction_band
            )));
        }
        if self.lookback_months == 0 {
            return Err(RegimeError::ConfigError(
                "lookback_months must be at least 1".to_string(),
            ));
        }
        let in_unit = |p: f64| p > 0.0 && p < 1.0;
        if !in_unit(self.lower_percentile)
            || !in_unit(self.upper_percentile)
            || self.lower_percentile >= self.upper_percentile
        {
            return Err(RegimeError::ConfigError(format!(
                "percentiles must satisfy 0 < lower < upper < 1, got {} and {}",
                self.lower_percentile, self.upper_percentile
            )));
        }
        Ok(())
    }
}

/// Designated regime contrast for the two-sample test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignificanceConfig {
    pub asset: String,
    pub regime_type: RegimeType,
    pub group1: String,
    pub group2: String,
    /// Minimum combined non-missing observations across both groups
    pub min_obs: usize,
    /// Confidence level of the interval on the mean difference
    pub confidence: f64,
}

impl Default for SignificanceConfig {
    fn default() -> Self {
        Self {
            asset: "equities".to_string(),
            regime_type: RegimeType::RateDirection,
            group1: "Rising".to_string(),
            group2: "Falling".to_string(),
            min_obs: 30,
            confidence: 0.95,
        }
    }
}

/// Return and summary settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Annualization factor: mean x N, standard deviation x sqrt(N)
    pub periods_per_year: f64,
    pub assets: Vec<AssetSpec>,
    pub significance: SignificanceConfig,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self::for_columns(&ColumnMap::default())
    }
}

impl SummaryConfig {
    /// Default assets reading the given columns
    pub fn for_columns(columns: &ColumnMap) -> Self {
        Self {
            periods_per_year: 12.0,
            assets: vec![
                AssetSpec::new("equities", &columns.equity_index, ReturnRule::LogReturn),
                AssetSpec::new("cash", &columns.short_yield, ReturnRule::SimpleYield),
                AssetSpec::new("duration", &columns.long_yield, ReturnRule::YieldChange),
            ],
            significance: SignificanceConfig::default(),
        }
    }

    pub fn asset(&self, name: &str) -> Option<&AssetSpec> {
        self.assets.iter().find(|a| a.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.periods_per_year.is_finite() || self.periods_per_year <= 0.0 {
            return Err(RegimeError::ConfigError(format!(
                "periods_per_year must be positive, got {}",
                self.periods_per_year
            )));
        }
        for (idx, asset) in self.assets.iter().enumerate() {
            if self.assets[..idx].iter().any(|a| a.name == asset.name) {
                return Err(RegimeError::ConfigError(format!(
                    "Duplicate asset name: {}",
                    asset.name
                )));
            }
        }

        let sig = &self.significance;
        if self.asset(&sig.asset).is_none() {
            return Err(RegimeError::ConfigError(format!(
                "Significance test asset '{}' is not configured",
                sig.asset
            )));
        }
        for label in [&sig.group1, &sig.group2] {
            if !sig.regime_type.contains(label) {
                return Err(RegimeError::ConfigError(format!(
                    "'{}' is not a {} label",
                    label, sig.regime_type
                )));
            }
        }
        if sig.group1 == sig.group2 {
            return Err(RegimeError::ConfigError(
                "Significance test groups must differ".to_string(),
            ));
        }
        if !(sig.confidence > 0.0 && sig.confidence < 1.0) {
            return Err(RegimeError::ConfigError(format!(
                "confidence must be in (0, 1), got {}",
                sig.confidence
            )));
        }
        Ok(())
    }
}

/// Complete configuration of one research run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PipelineConfigFile")]
pub struct PipelineConfig {
    pub columns: ColumnMap,
    pub regime: RegimeConfig,
    pub summary: SummaryConfig,
    /// Raw series feeding the panel builder
    pub series: Vec<SeriesSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_columns(ColumnMap::default())
    }
}

impl PipelineConfig {
    /// Default configuration whose assets and series read `columns`
    pub fn with_columns(columns: ColumnMap) -> Self {
        let series = vec![
            SeriesSpec::new("FEDFUNDS", &columns.policy_rate, Frequency::Monthly),
            SeriesSpec::new("CPIAUCSL", &columns.cpi, Frequency::Monthly),
            SeriesSpec::new("SP500", &columns.equity_index, Frequency::Daily)
                .with_aggregation(Aggregation::Last),
            SeriesSpec::new("DGS10", &columns.long_yield, Frequency::Daily),
            SeriesSpec::new("TB3MS", &columns.short_yield, Frequency::Monthly),
        ];

        Self {
            regime: RegimeConfig::default(),
            summary: SummaryConfig::for_columns(&columns),
            series,
            columns,
        }
    }

    /// Reject settings no run could honour
    pub fn validate(&self) -> Result<()> {
        self.regime.validate()?;
        self.summary.validate()?;

        for asset in &self.summary.assets {
            if !self.columns.contains(&asset.column) {
                return Err(RegimeError::ConfigError(format!(
                    "Asset '{}' reads column '{}', which is not in the column map",
                    asset.name, asset.column
                )));
            }
        }
        for spec in &self.series {
            if !self.columns.contains(&spec.column) {
                return Err(RegimeError::ConfigError(format!(
                    "Series {} fills column '{}', which is not in the column map",
                    spec.id, spec.column
                )));
            }
        }
        Ok(())
    }
}

/// On-disk shape of `PipelineConfig`: omitted assets and series default to
/// the configured column names
#[derive(Debug, Deserialize)]
#[serde(default)]
struct PipelineConfigFile {
    columns: ColumnMap,
    regime: RegimeConfig,
    summary: SummaryConfigFile,
    series: Option<Vec<SeriesSpec>>,
}

impl Default for PipelineConfigFile {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            regime: RegimeConfig::default(),
            summary: SummaryConfigFile::default(),
            series: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SummaryConfigFile {
    periods_per_year: f64,
    assets: Option<Vec<AssetSpec>>,
    significance: SignificanceConfig,
}

impl Default for SummaryConfigFile {
    fn default() -> Self {
        let defaults = SummaryConfig::default();
        Self {
            periods_per_year: defaults.periods_per_year,
            assets: None,
            significance: defaults.significance,
        }
    }
}

impl From<PipelineConfigFile> for PipelineConfig {
    fn from(file: PipelineConfigFile) -> Self {
        let mut config = PipelineConfig::with_columns(file.columns);
        config.regime = file.regime;
        config.summary.periods_per_year = file.summary.periods_per_year;
        config.summary.significance = file.summary.significance;
        if let Some(assets) = file.summary.assets {
            config.summary.assets = assets;
        }
        if let Some(series) = file.series {
            config.series = series;
        }
        config
    }
}
