//! Asset returns, regime-grouped statistics and the regime contrast test

pub mod assets;
pub mod significance;
pub mod summary;

pub use assets::{AssetReturns, AssetSpec, ReturnRule, ReturnTable};
pub use significance::{
    compare_samples, regime_contrast, welch_t_test, SignificanceTest, SkipReason, TestGroups,
    WelchStatistics,
};
pub use summary::{grouped_statistics, GroupStats, Moments};
