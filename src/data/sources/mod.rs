//! External data source integrations
//!
//! Remote sources download raw series into a local store; the research
//! pipeline itself only ever reads through `SeriesStore`.

#[cfg(feature = "async")]
pub mod fred;

#[cfg(feature = "async")]
pub use fred::FredSource;
