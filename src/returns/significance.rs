//! Two-sample test of mean returns between two regimes
//!
//! Welch's unequal-variance t-test on independent samples. Monthly returns
//! within a regime are serially correlated, which this test ignores, so its
//! p-values overstate significance. The result carries that caveat.

use crate::config::SignificanceConfig;
use crate::error::Result;
use crate::regime::labels::RegimeType;
use crate::returns::assets::ReturnTable;
use crate::returns::summary::{partition, Moments};
use crate::types::finite;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::fmt;

/// Caveat attached to every completed test
pub const SERIAL_CORRELATION_CAVEAT: &str =
    "independent-samples Welch test; serial correlation within regimes is ignored, p-values are optimistic";

/// Welch t statistics for two samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WelchStatistics {
    pub mean1: f64,
    pub mean2: f64,
    /// `mean1 - mean2`
    pub mean_diff: f64,
    pub std_error: f64,
    pub t_stat: f64,
    /// Welch-Satterthwaite degrees of freedom
    pub df: f64,
    /// Two-sided p-value
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// Welch's t-test with a two-sided confidence interval on `mean1 - mean2`.
///
/// `None` when either sample has fewer than two observations or the standard
/// error is zero.
pub fn welch_t_test(sample1: &[f64], sample2: &[f64], confidence: f64) -> Option<WelchStatistics> {
    let m1 = Moments::from_sample(sample1);
    let m2 = Moments::from_sample(sample2);
    let (mean1, var1) = (m1.mean?, m1.variance()?);
    let (mean2, var2) = (m2.mean?, m2.variance()?);

    let a = var1 / m1.n as f64;
    let b = var2 / m2.n as f64;
    let std_error = (a + b).sqrt();
    if std_error.is_nan() || std_error <= 0.0 {
        return None;
    }

    let mean_diff = mean1 - mean2;
    let t_stat = finite(mean_diff / std_error)?;
    let df = finite((a + b).powi(2) / (a * a / (m1.n - 1) as f64 + b * b / (m2.n - 1) as f64))?;

    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    let p_value = (2.0 * (1.0 - dist.cdf(t_stat.abs()))).clamp(0.0, 1.0);
    let critical = dist.inverse_cdf(1.0 - (1.0 - confidence) / 2.0);
    let margin = finite(critical * std_error)?;

    Some(WelchStatistics {
        mean1,
        mean2,
        mean_diff,
        std_error,
        t_stat,
        df,
        p_value,
        ci_lower: mean_diff - margin,
        ci_upper: mean_diff + margin,
    })
}

/// Why a test was not run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Combined observations below the configured minimum
    InsufficientData,
    /// One of the two labels has no observations
    MissingGroup,
    /// A group has fewer than two observations or zero combined variance
    DegenerateVariance,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::InsufficientData => "skipped: insufficient data",
            SkipReason::MissingGroup => "skipped: a regime group has no observations",
            SkipReason::DegenerateVariance => "skipped: variance undefined or zero",
        })
    }
}

/// Groups compared by a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestGroups {
    pub asset: String,
    pub regime_type: RegimeType,
    pub group1: String,
    pub group2: String,
    pub n1: usize,
    pub n2: usize,
}

/// Outcome of the regime contrast test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignificanceTest {
    Completed {
        #[serde(flatten)]
        groups: TestGroups,
        #[serde(flatten)]
        stats: WelchStatistics,
        confidence: f64,
        caveat: String,
    },
    Skipped {
        #[serde(flatten)]
        groups: TestGroups,
        reason: SkipReason,
        message: String,
    },
}

impl SignificanceTest {
    pub fn groups(&self) -> &TestGroups {
        match self {
            SignificanceTest::Completed { groups, .. } | SignificanceTest::Skipped { groups, .. } => {
                groups
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SignificanceTest::Completed { .. })
    }

    pub fn statistics(&self) -> Option<&WelchStatistics> {
        match self {
            SignificanceTest::Completed { stats, .. } => Some(stats),
            SignificanceTest::Skipped { .. } => None,
        }
    }

    fn skipped(groups: TestGroups, reason: SkipReason) -> Self {
        log::warn!(
            "Significance test {} {} vs {} for {} {} (n1={}, n2={})",
            groups.regime_type,
            groups.group1,
            groups.group2,
            groups.asset,
            reason,
            groups.n1,
            groups.n2
        );
        SignificanceTest::Skipped {
            message: reason.to_string(),
            groups,
            reason,
        }
    }
}

/// Test two labelled samples, enforcing the minimum-sample precondition.
///
/// Skip reasons are checked in order: too few combined observations, then an
/// empty group, then a degenerate variance.
pub fn compare_samples(
    groups: TestGroups,
    sample1: &[f64],
    sample2: &[f64],
    min_obs: usize,
    confidence: f64,
) -> SignificanceTest {
    if sample1.len() + sample2.len() < min_obs {
        return SignificanceTest::skipped(groups, SkipReason::InsufficientData);
    }
    if sample1.is_empty() || sample2.is_empty() {
        return SignificanceTest::skipped(groups, SkipReason::MissingGroup);
    }

    match welch_t_test(sample1, sample2, confidence) {
        Some(stats) => {
            log::info!(
                "{} {} vs {}: diff={:.5} t={:.3} p={:.4}",
                groups.asset,
                groups.group1,
                groups.group2,
                stats.mean_diff,
                stats.t_stat,
                stats.p_value
            );
            SignificanceTest::Completed {
                groups,
                stats,
                confidence,
                caveat: SERIAL_CORRELATION_CAVEAT.to_string(),
            }
        }
        None => SignificanceTest::skipped(groups, SkipReason::DegenerateVariance),
    }
}

/// Run the configured regime contrast on a return table
pub fn regime_contrast(table: &ReturnTable, config: &SignificanceConfig) -> Result<SignificanceTest> {
    let asset = table.require_asset(&config.asset)?;
    let sample1 = partition(table, asset, config.regime_type, &config.group1);
    let sample2 = partition(table, asset, config.regime_type, &config.group2);

    let groups = TestGroups {
        asset: config.asset.clone(),
        regime_type: config.regime_type,
        group1: config.group1.clone(),
        group2: config.group2.clone(),
        n1: sample1.len(),
        n2: sample2.len(),
    };

    Ok(compare_samples(
        groups,
        &sample1,
        &sample2,
        config.min_obs,
        config.confidence,
    ))
}
