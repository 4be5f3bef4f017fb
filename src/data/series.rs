//! Raw dated observations and the stores that supply them
//!
//! A series store answers one question: "give me series X between two dates".
//! Missing observations are kept as `None` rather than dropped so that gaps
//! stay visible to the panel builder.

use crate::error::{RegimeError, Result};
use crate::types::Value;
use chrono::NaiveDate;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Marker some vendors use for a missing observation
const VENDOR_MISSING: &str = ".";

/// A single dated observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Value,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Value) -> Self {
        Self { date, value }
    }
}

/// A named series of observations, sorted by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    pub observations: Vec<Observation>,
}

impl Series {
    /// Create a series, sorting observations by date
    pub fn new(id: impl Into<String>, mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|o| o.date);
        Self {
            id: id.into(),
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of observations carrying a value
    pub fn present_count(&self) -> usize {
        self.observations.iter().filter(|o| o.value.is_some()).count()
    }

    /// Restrict to observations within `[start, end]`
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> Series {
        Series {
            id: self.id.clone(),
            observations: self
                .observations
                .iter()
                .filter(|o| o.date >= start && o.date <= end)
                .copied()
                .collect(),
        }
    }
}

/// Source of named series
pub trait SeriesStore {
    /// Fetch observations for `id` between `start` and `end`, inclusive
    fn fetch(&self, id: &str, start: NaiveDate, end: NaiveDate) -> Result<Series>;

    /// Get the store name
    fn name(&self) -> &str;
}

/// Series held in memory (tests, benchmarks, pre-loaded data)
#[derive(Debug, Clone, Default)]
pub struct InMemorySeriesStore {
    series: HashMap<String, Series>,
}

impl InMemorySeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a series
    pub fn insert(&mut self, series: Series) {
        self.series.insert(series.id.clone(), series);
    }

    /// List stored series ids
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.series.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl SeriesStore for InMemorySeriesStore {
    fn fetch(&self, id: &str, start: NaiveDate, end: NaiveDate) -> Result<Series> {
        self.series
            .get(id)
            .map(|s| s.window(start, end))
            .ok_or_else(|| RegimeError::SeriesNotFound(id.to_string()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[derive(Debug, Deserialize)]
struct SeriesRow {
    date: String,
    value: String,
}

/// Directory of `<id>.csv` files with a `date,value` header
///
/// Blank cells and `.` are read as missing.
#[derive(Debug, Clone)]
pub struct CsvSeriesStore {
    dir: PathBuf,
}

impl CsvSeriesStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `id`
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", id))
    }

    /// Parse a `date,value` CSV file
    pub fn read_file(id: &str, path: &Path) -> Result<Series> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut observations = Vec::new();

        for result in reader.deserialize() {
            let row: SeriesRow = result?;
            let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").map_err(|e| {
                RegimeError::ParseError(format!("Invalid date '{}' in {}: {}", row.date, id, e))
            })?;
            observations.push(Observation::new(date, parse_value(&row.value)?));
        }

        Ok(Series::new(id, observations))
    }

    /// Write a series in the format `read_file` accepts
    pub fn write_file(series: &Series, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["date", "value"])?;
        for obs in &series.observations {
            writer.write_record([
                obs.date.format("%Y-%m-%d").to_string(),
                obs.value.map(|v| v.to_string()).unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl SeriesStore for CsvSeriesStore {
    fn fetch(&self, id: &str, start: NaiveDate, end: NaiveDate) -> Result<Series> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(RegimeError::SeriesNotFound(format!(
                "{} (expected {})",
                id,
                path.display()
            )));
        }

        let series = Self::read_file(id, &path)?;
        log::debug!(
            "Read {} observations for {} from {}",
            series.len(),
            id,
            path.display()
        );
        Ok(series.window(start, end))
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Parse a raw cell into a value; blank and vendor missing markers become `None`
pub fn parse_value(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == VENDOR_MISSING {
        return Ok(None);
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| RegimeError::ParseError(format!("Invalid numeric value: {}", raw)))?;
    Ok(crate::types::finite(value))
}
