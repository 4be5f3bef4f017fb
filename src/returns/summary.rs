//! Grouped descriptive statistics of returns by regime
//!
//! Annualization multiplies the monthly mean by the periods per year and the
//! monthly standard deviation by its square root. This treats monthly returns
//! as independent and identically distributed.

use crate::regime::labels::RegimeType;
use crate::returns::assets::{AssetReturns, ReturnTable};
use crate::types::finite;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution};

/// Count, mean and sample standard deviation of a return sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub n: usize,
    /// Undefined for an empty sample
    pub mean: Option<f64>,
    /// Sample (n - 1) standard deviation; undefined below two observations
    pub sd: Option<f64>,
}

impl Moments {
    pub fn from_sample(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self {
                n,
                mean: None,
                sd: None,
            };
        }

        let data = Data::new(values.to_vec());
        let mean = data.mean().and_then(finite);
        let sd = if n < 2 {
            None
        } else {
            data.std_dev().and_then(finite)
        };
        Self { n, mean, sd }
    }

    pub fn variance(&self) -> Option<f64> {
        self.sd.map(|sd| sd * sd)
    }
}

/// Statistics of one (asset, regime type, label) partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub asset: String,
    pub regime_type: RegimeType,
    pub label: String,
    pub n: usize,
    pub mean: Option<f64>,
    pub sd: Option<f64>,
    pub annualized_mean: Option<f64>,
    pub annualized_sd: Option<f64>,
}

impl GroupStats {
    fn new(
        asset: &str,
        regime_type: RegimeType,
        label: String,
        moments: Moments,
        periods_per_year: f64,
    ) -> Self {
        Self {
            asset: asset.to_string(),
            regime_type,
            label,
            n: moments.n,
            mean: moments.mean,
            sd: moments.sd,
            annualized_mean: moments.mean.map(|m| m * periods_per_year),
            annualized_sd: moments.sd.map(|sd| sd * periods_per_year.sqrt()),
        }
    }
}

/// Non-missing returns of `asset` in months labelled `label`
pub fn partition(
    table: &ReturnTable,
    asset: &AssetReturns,
    regime_type: RegimeType,
    label: &str,
) -> Vec<f64> {
    table
        .regimes()
        .labels()
        .iter()
        .zip(&asset.values)
        .filter(|(labels, _)| labels.label(regime_type).as_deref() == Some(label))
        .filter_map(|(_, value)| *value)
        .collect()
}

/// Statistics for every asset, every requested regime type and every label
/// in that type's domain.
///
/// Months with an undefined regime are left out of that type's partitions.
/// Empty and single-observation partitions are still reported, with their
/// statistics undefined.
pub fn grouped_statistics(
    table: &ReturnTable,
    regime_types: &[RegimeType],
    periods_per_year: f64,
) -> Vec<GroupStats> {
    let mut rows = Vec::new();

    for asset in table.assets() {
        for &regime_type in regime_types {
            for label in regime_type.domain() {
                let sample = partition(table, asset, regime_type, &label);
                let moments = Moments::from_sample(&sample);
                rows.push(GroupStats::new(
                    asset.name(),
                    regime_type,
                    label,
                    moments,
                    periods_per_year,
                ));
            }
        }
    }

    let thin = rows.iter().filter(|r| r.sd.is_none()).count();
    if thin > 0 {
        log::warn!("{} of {} regime groups have fewer than 2 returns", thin, rows.len());
    }
    rows
}
