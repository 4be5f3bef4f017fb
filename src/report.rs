//! Tabular outputs of the research core
//!
//! Numeric missing values are written as empty cells and undefined regimes
//! as `Undefined`, so downstream readers can tell "no data" from zero. The
//! regime and return tables read back into the values they were written from.

use crate::data::panel::{format_value, parse_date, Panel, DATE_COLUMN};
use crate::data::series::parse_value;
use crate::error::{RegimeError, Result};
use crate::regime::classifier::{CountRow, RegimeTable};
use crate::regime::labels::{RegimeLabels, RegimeType};
use crate::regime::thresholds::ThresholdRow;
use crate::returns::assets::{AssetReturns, AssetSpec, ReturnTable};
use crate::returns::significance::SignificanceTest;
use crate::returns::summary::GroupStats;
use crate::types::Column;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

pub const REGIME_PANEL_FILE: &str = "regime_panel.csv";
pub const THRESHOLDS_FILE: &str = "thresholds.csv";
pub const COUNTS_FILE: &str = "regime_counts.csv";
pub const RETURNS_FILE: &str = "returns.csv";
pub const GROUPED_STATS_FILE: &str = "grouped_stats.csv";
pub const SIGNIFICANCE_FILE: &str = "significance.json";

/// Header of the per-record joint-regime flag in the return table
pub const FULLY_LABELED_COLUMN: &str = "fully_labeled";

/// Header of a regime label column
pub fn regime_column(regime_type: RegimeType) -> String {
    format!("{}_regime", regime_type.as_str())
}

/// Header of an asset's return column, e.g. `equities_log_return`
pub fn return_column(spec: &AssetSpec) -> String {
    format!("{}_{}", spec.name, spec.rule)
}

/// Header of an asset's usability flag column
pub fn usable_column(spec: &AssetSpec) -> String {
    format!("usable_{}", spec.name)
}

fn table_header(table: &RegimeTable) -> Vec<String> {
    let mut header = vec![DATE_COLUMN.to_string()];
    header.extend(table.panel().column_names().map(str::to_string));
    header.extend(RegimeType::CLASSIFIED.iter().map(|t| regime_column(*t)));
    header
}

fn table_row(table: &RegimeTable, row: usize) -> Vec<String> {
    let panel = table.panel();
    let mut record = vec![panel.dates()[row].format("%Y-%m-%d").to_string()];
    record.extend(
        panel
            .column_names()
            .map(|name| format_value(panel.column(name).and_then(|c| c[row]))),
    );
    let labels = &table.labels()[row];
    record.extend(RegimeType::CLASSIFIED.iter().map(|t| labels.display_label(*t)));
    record
}

/// Regime-tagged table: panel, derived fields and the four label columns
pub fn write_regime_table<W: Write>(table: &RegimeTable, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table_header(table))?;
    for row in 0..table.len() {
        writer.write_record(table_row(table, row))?;
    }
    writer.flush()?;
    Ok(())
}

/// Return-enriched table: regime table plus returns and usability flags
pub fn write_return_table<W: Write>(table: &ReturnTable, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    let regimes = table.regimes();

    let mut header = table_header(regimes);
    header.extend(table.assets().iter().map(|a| return_column(&a.spec)));
    header.extend(table.assets().iter().map(|a| usable_column(&a.spec)));
    header.push(FULLY_LABELED_COLUMN.to_string());
    writer.write_record(&header)?;

    let usable: Vec<Vec<bool>> = table.assets().iter().map(AssetReturns::usable).collect();
    let fully_labeled = table.fully_labeled();
    for row in 0..table.len() {
        let mut record = table_row(regimes, row);
        record.extend(table.assets().iter().map(|a| format_value(a.values[row])));
        record.extend(usable.iter().map(|flags| flags[row].to_string()));
        record.push(fully_labeled[row].to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_rows<W: Write, T: serde::Serialize>(rows: &[T], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_thresholds<W: Write>(rows: &[ThresholdRow], writer: W) -> Result<()> {
    write_rows(rows, writer)
}

pub fn write_counts<W: Write>(rows: &[CountRow], writer: W) -> Result<()> {
    write_rows(rows, writer)
}

pub fn write_grouped_stats<W: Write>(rows: &[GroupStats], writer: W) -> Result<()> {
    write_rows(rows, writer)
}

pub fn write_significance<W: Write>(test: &SignificanceTest, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, test)?;
    Ok(())
}

/// A CSV file held as raw cells, addressed by header
struct CsvTable {
    headers: Vec<String>,
    records: Vec<csv::StringRecord>,
}

impl CsvTable {
    fn read<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let records = reader
            .records()
            .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
        Ok(Self { headers, records })
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| RegimeError::MissingColumn(name.to_string()))
    }

    fn cells(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().map(move |r| r.get(idx).unwrap_or("").trim())
    }

    fn values(&self, idx: usize) -> Result<Column> {
        self.cells(idx).map(parse_value).collect()
    }

    fn label_cells(&self, regime_type: RegimeType) -> Result<Vec<&str>> {
        Ok(self.cells(self.position(&regime_column(regime_type))?).collect())
    }

    fn flags(&self, name: &str) -> Result<Vec<bool>> {
        self.cells(self.position(name)?)
            .map(|cell| match cell {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(RegimeError::ParseError(format!(
                    "Invalid flag '{}' in column {}",
                    other, name
                ))),
            })
            .collect()
    }

    /// Regime table from the date, numeric and label columns; headers in
    /// `skip` belong to an enclosing table
    fn regime_table(&self, skip: &[String]) -> Result<RegimeTable> {
        let date_idx = self.position(DATE_COLUMN)?;
        let dates = self.cells(date_idx).map(parse_date).collect::<Result<Vec<_>>>()?;

        let label_headers: Vec<String> = RegimeType::CLASSIFIED
            .iter()
            .map(|t| regime_column(*t))
            .collect();
        let mut columns = Vec::new();
        for (idx, name) in self.headers.iter().enumerate() {
            if idx == date_idx || label_headers.contains(name) || skip.contains(name) {
                continue;
            }
            columns.push((name.clone(), self.values(idx)?));
        }

        let panel = Panel::new(dates.clone(), columns)?;
        if panel.dates() != dates.as_slice() {
            return Err(RegimeError::ParseError(
                "Regime table rows must be consecutive month-ends in ascending order".to_string(),
            ));
        }

        let direction = self.label_cells(RegimeType::RateDirection)?;
        let level = self.label_cells(RegimeType::RateLevel)?;
        let inflation = self.label_cells(RegimeType::Inflation)?;
        let joint = self.label_cells(RegimeType::Joint)?;

        let mut labels = Vec::with_capacity(dates.len());
        for row in 0..dates.len() {
            let record = RegimeLabels::parse(direction[row], level[row], inflation[row])?;
            if record.display_label(RegimeType::Joint) != joint[row] {
                return Err(RegimeError::ParseError(format!(
                    "Joint regime '{}' on {} disagrees with its inflation and direction labels",
                    joint[row], dates[row]
                )));
            }
            labels.push(record);
        }

        RegimeTable::new(panel, labels)
    }
}

/// Read a table written by `write_regime_table`
pub fn read_regime_table<R: Read>(reader: R) -> Result<RegimeTable> {
    CsvTable::read(reader)?.regime_table(&[])
}

/// Read a table written by `write_return_table` for the given assets.
///
/// Usability flags must agree with the returns they describe.
pub fn read_return_table<R: Read>(reader: R, specs: &[AssetSpec]) -> Result<ReturnTable> {
    let table = CsvTable::read(reader)?;

    let mut skip: Vec<String> = specs.iter().map(return_column).collect();
    skip.extend(specs.iter().map(usable_column));
    skip.push(FULLY_LABELED_COLUMN.to_string());
    let regimes = table.regime_table(&skip)?;

    let mut assets = Vec::with_capacity(specs.len());
    for spec in specs {
        let values = table.values(table.position(&return_column(spec))?)?;
        let flags = table.flags(&usable_column(spec))?;
        if values.iter().zip(&flags).any(|(v, flag)| v.is_some() != *flag) {
            return Err(RegimeError::ParseError(format!(
                "{} disagrees with {}",
                usable_column(spec),
                return_column(spec)
            )));
        }
        assets.push(AssetReturns {
            spec: spec.clone(),
            values,
        });
    }

    let returns = ReturnTable::from_parts(regimes, assets)?;
    if table.flags(FULLY_LABELED_COLUMN)? != returns.fully_labeled() {
        return Err(RegimeError::ParseError(format!(
            "{} disagrees with the joint regime labels",
            FULLY_LABELED_COLUMN
        )));
    }
    Ok(returns)
}

/// Writes report files into one output directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Create the output directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn create(&self, file: &str) -> Result<File> {
        let path = self.path(file);
        log::debug!("Writing {}", path.display());
        Ok(File::create(path)?)
    }

    pub fn regime_table(&self, table: &RegimeTable) -> Result<PathBuf> {
        write_regime_table(table, self.create(REGIME_PANEL_FILE)?)?;
        Ok(self.path(REGIME_PANEL_FILE))
    }

    pub fn thresholds(&self, rows: &[ThresholdRow]) -> Result<PathBuf> {
        write_thresholds(rows, self.create(THRESHOLDS_FILE)?)?;
        Ok(self.path(THRESHOLDS_FILE))
    }

    pub fn counts(&self, rows: &[CountRow]) -> Result<PathBuf> {
        write_counts(rows, self.create(COUNTS_FILE)?)?;
        Ok(self.path(COUNTS_FILE))
    }

    pub fn return_table(&self, table: &ReturnTable) -> Result<PathBuf> {
        write_return_table(table, self.create(RETURNS_FILE)?)?;
        Ok(self.path(RETURNS_FILE))
    }

    pub fn grouped_stats(&self, rows: &[GroupStats]) -> Result<PathBuf> {
        write_grouped_stats(rows, self.create(GROUPED_STATS_FILE)?)?;
        Ok(self.path(GROUPED_STATS_FILE))
    }

    pub fn significance(&self, test: &SignificanceTest) -> Result<PathBuf> {
        write_significance(test, self.create(SIGNIFICANCE_FILE)?)?;
        Ok(self.path(SIGNIFICANCE_FILE))
    }
}
