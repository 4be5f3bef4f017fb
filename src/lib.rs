//! # macro-regimes
//!
//! Classifies months into macroeconomic regimes (policy-rate direction and
//! level, inflation) and measures how asset returns behave in each regime.
//!
//! The run is a straight line of pure stages:
//! series store -> monthly panel -> regime classifier -> returns ->
//! grouped statistics and a two-sample test.
//!
//! ## Example
//!
//! ```rust,no_run
//! use macro_regimes::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<()> {
//! let panel = Panel::read_csv(Path::new("panel.csv"))?;
//! let pipeline = ResearchPipeline::new(PipelineConfig::default())?;
//! let output = pipeline.run(&panel)?;
//! output.write_to(Path::new("out"))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod derived;
pub mod error;
pub mod pipeline;
pub mod regime;
pub mod report;
pub mod returns;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::config::{ColumnMap, PipelineConfig, RegimeConfig, SignificanceConfig, SummaryConfig};
    pub use crate::data::{CsvSeriesStore, InMemorySeriesStore, Panel, PanelBuilder, SeriesStore};
    pub use crate::error::{RegimeError, Result};
    pub use crate::pipeline::{ResearchOutput, ResearchPipeline};
    pub use crate::regime::{
        Classification, RateDirection, RegimeClassifier, RegimeLabels, RegimeType, Thresholds,
    };
    pub use crate::returns::{GroupStats, ReturnTable, SignificanceTest};
    pub use crate::types::*;
}
