//! Raw series acquisition and monthly panel construction

pub mod frequency;
pub mod panel;
pub mod series;
pub mod sources;

pub use frequency::Frequency;
pub use panel::{Aggregation, Panel, PanelBuilder, SeriesSpec};
pub use series::{CsvSeriesStore, InMemorySeriesStore, Observation, Series, SeriesStore};
