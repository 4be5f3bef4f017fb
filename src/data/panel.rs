//! Observation panel: named columns aligned on a contiguous month-end grid
//!
//! The panel is the input contract of the classifier. Rows are unique
//! month-ends in ascending order with no omitted months; a month without data
//! is present with missing values.

use crate::data::frequency::{month_end, monthly_grid, Frequency};
use crate::data::series::{parse_value, Series, SeriesStore};
use crate::error::{RegimeError, Result};
use crate::types::{finite, Column, MonthEnd, Value};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

/// Header of the date column in panel files
pub const DATE_COLUMN: &str = "date";

/// Monthly table of named numeric columns
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    dates: Vec<MonthEnd>,
    columns: Vec<(String, Column)>,
}

impl Panel {
    /// Build a panel from dates and columns of equal length.
    ///
    /// Dates are snapped to their month-end and rows sorted ascending. Months
    /// missing between the first and last date are inserted with missing
    /// values. Two rows falling in the same month are rejected. NaN and
    /// infinite cells are stored as missing.
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<(String, Column)>) -> Result<Self> {
        if dates.is_empty() {
            return Err(RegimeError::EmptyPanel);
        }

        for (idx, (name, values)) in columns.iter().enumerate() {
            if values.len() != dates.len() {
                return Err(RegimeError::ColumnLengthMismatch {
                    column: name.clone(),
                    expected: dates.len(),
                    actual: values.len(),
                });
            }
            if columns[..idx].iter().any(|(other, _)| other == name) {
                return Err(RegimeError::DataError(format!("Duplicate column: {}", name)));
            }
        }

        let mut order: Vec<(MonthEnd, usize)> = dates
            .iter()
            .enumerate()
            .map(|(row, d)| (month_end(*d), row))
            .collect();
        order.sort_by_key(|(d, _)| *d);

        if let Some(pair) = order.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(RegimeError::DuplicateDate(pair[0].0));
        }

        let first = order[0].0;
        let last = order[order.len() - 1].0;
        let grid = monthly_grid(first, last);
        let row_at: BTreeMap<MonthEnd, usize> = order.into_iter().collect();

        let gaps = grid.len() - row_at.len();
        if gaps > 0 {
            log::warn!("Panel has {} empty months between {} and {}", gaps, first, last);
        }

        let columns = columns
            .into_iter()
            .map(|(name, values)| {
                let aligned = grid
                    .iter()
                    .map(|d| row_at.get(d).and_then(|&row| values[row]).and_then(finite))
                    .collect();
                (name, aligned)
            })
            .collect();

        Ok(Self {
            dates: grid,
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Month-end dates, ascending
    pub fn dates(&self) -> &[MonthEnd] {
        &self.dates
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Column lookup that treats absence as a fatal precondition failure
    pub fn require(&self, name: &str) -> Result<&[Value]> {
        self.column(name)
            .ok_or_else(|| RegimeError::MissingColumn(name.to_string()))
    }

    /// Return a new panel with one more column; `self` is left untouched
    pub fn with_column(&self, name: impl Into<String>, values: Column) -> Result<Panel> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(RegimeError::ColumnLengthMismatch {
                column: name,
                expected: self.len(),
                actual: values.len(),
            });
        }
        if self.has_column(&name) {
            return Err(RegimeError::DataError(format!("Duplicate column: {}", name)));
        }

        let mut columns = self.columns.clone();
        columns.push((name, values.into_iter().map(|v| v.and_then(finite)).collect()));
        Ok(Panel {
            dates: self.dates.clone(),
            columns,
        })
    }

    /// Read a panel from CSV: a `date` column followed by numeric columns.
    /// Empty cells are missing values.
    pub fn from_reader<R: Read>(reader: R) -> Result<Panel> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let date_idx = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(DATE_COLUMN))
            .ok_or_else(|| RegimeError::MissingColumn(DATE_COLUMN.to_string()))?;

        let names: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != date_idx)
            .map(|(idx, h)| (idx, h.trim().to_string()))
            .collect();

        let mut dates = Vec::new();
        let mut columns: Vec<Column> = vec![Vec::new(); names.len()];

        for result in reader.records() {
            let record = result?;
            dates.push(parse_date(record.get(date_idx).unwrap_or(""))?);

            for (slot, (idx, _)) in columns.iter_mut().zip(&names) {
                slot.push(parse_value(record.get(*idx).unwrap_or(""))?);
            }
        }

        let columns = names
            .into_iter()
            .map(|(_, name)| name)
            .zip(columns)
            .collect();
        Panel::new(dates, columns)
    }

    pub fn read_csv(path: &Path) -> Result<Panel> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Write the panel as CSV; missing values become empty cells
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = vec![DATE_COLUMN.to_string()];
        header.extend(self.column_names().map(str::to_string));
        writer.write_record(&header)?;

        for (row, date) in self.dates.iter().enumerate() {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            record.extend(self.columns.iter().map(|(_, values)| format_value(values[row])));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_writer(file)
    }
}

/// Parse a `YYYY-MM-DD` cell
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| RegimeError::ParseError(format!("Invalid date format: {}", raw)))
}

/// Format a value for CSV output; `None` becomes an empty cell
pub fn format_value(value: Value) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// How observations inside one month collapse to a single monthly value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Last present observation in the month
    Last,
    /// Mean of present observations in the month
    Mean,
}

impl Aggregation {
    /// Default for a series of the given native frequency
    pub fn default_for(frequency: Frequency) -> Self {
        if frequency.is_higher_than(Frequency::Monthly) {
            Aggregation::Mean
        } else {
            Aggregation::Last
        }
    }
}

/// Which raw series feeds which panel column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    /// Identifier in the series store
    pub id: String,
    /// Panel column name
    pub column: String,
    #[serde(default = "default_frequency")]
    pub frequency: Frequency,
    /// Overrides the frequency-derived aggregation
    #[serde(default)]
    pub aggregation: Option<Aggregation>,
}

fn default_frequency() -> Frequency {
    Frequency::Monthly
}

impl SeriesSpec {
    pub fn new(id: impl Into<String>, column: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            id: id.into(),
            column: column.into(),
            frequency,
            aggregation: None,
        }
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub fn effective_aggregation(&self) -> Aggregation {
        self.aggregation
            .unwrap_or_else(|| Aggregation::default_for(self.frequency))
    }
}

/// Collapse a series onto month-end dates
pub fn to_monthly(series: &Series, aggregation: Aggregation) -> BTreeMap<MonthEnd, Value> {
    let mut buckets: BTreeMap<MonthEnd, Vec<f64>> = BTreeMap::new();
    for obs in &series.observations {
        let bucket = buckets.entry(month_end(obs.date)).or_default();
        if let Some(v) = obs.value {
            bucket.push(v);
        }
    }

    buckets
        .into_iter()
        .map(|(month, values)| {
            let value = match aggregation {
                Aggregation::Last => values.last().copied(),
                Aggregation::Mean if values.is_empty() => None,
                Aggregation::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            };
            (month, value)
        })
        .collect()
}

/// Aligns heterogeneous-frequency series from a store onto one monthly panel
#[derive(Debug, Clone)]
pub struct PanelBuilder {
    start: NaiveDate,
    end: NaiveDate,
    specs: Vec<SeriesSpec>,
}

impl PanelBuilder {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            specs: Vec::new(),
        }
    }

    pub fn add_series(mut self, spec: SeriesSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn with_series(mut self, specs: impl IntoIterator<Item = SeriesSpec>) -> Self {
        self.specs.extend(specs);
        self
    }

    pub fn specs(&self) -> &[SeriesSpec] {
        &self.specs
    }

    /// Fetch every series and align them.
    ///
    /// The grid spans the months in which any series has an observation,
    /// clipped to the builder's window. A series for which the store returns
    /// nothing at all aborts the build.
    pub fn build<S: SeriesStore + ?Sized>(&self, store: &S) -> Result<Panel> {
        if self.specs.is_empty() {
            return Err(RegimeError::ConfigError(
                "Panel builder has no series".to_string(),
            ));
        }
        if self.start > self.end {
            return Err(RegimeError::ConfigError(format!(
                "Start date {} is after end date {}",
                self.start, self.end
            )));
        }

        let mut monthly = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            let series = store.fetch(&spec.id, self.start, self.end)?;
            if series.is_empty() {
                return Err(RegimeError::EmptySeries(spec.id.clone()));
            }
            if series.present_count() == 0 {
                log::warn!("Series {} has no values between {} and {}", spec.id, self.start, self.end);
            }
            log::debug!(
                "Fetched {} observations for {} from {} store",
                series.len(),
                spec.id,
                store.name()
            );
            monthly.push(to_monthly(&series, spec.effective_aggregation()));
        }

        let first = monthly.iter().filter_map(|m| m.keys().next()).min().copied();
        let last = monthly.iter().filter_map(|m| m.keys().next_back()).max().copied();
        let (first, last) = match (first, last) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(RegimeError::EmptyPanel),
        };

        let grid = monthly_grid(first.max(month_end(self.start)), last.min(month_end(self.end)));
        let columns = self
            .specs
            .iter()
            .zip(&monthly)
            .map(|(spec, values)| {
                let column = grid
                    .iter()
                    .map(|d| values.get(d).copied().flatten())
                    .collect();
                (spec.column.clone(), column)
            })
            .collect();

        log::info!(
            "Built panel with {} months and {} columns",
            grid.len(),
            self.specs.len()
        );
        Panel::new(grid, columns)
    }
}
