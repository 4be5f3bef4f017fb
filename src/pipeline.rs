//! End-to-end research run
//!
//! Store -> Panel -> Classifier -> Returns -> Summary -> Test. Each stage
//! takes the previous stage's output by reference or by value and returns a
//! new table; nothing is modified in place.

use crate::config::PipelineConfig;
use crate::data::panel::{Panel, PanelBuilder};
use crate::data::series::SeriesStore;
use crate::error::Result;
use crate::regime::classifier::{Classification, CountRow, RegimeClassifier};
use crate::regime::labels::RegimeType;
use crate::regime::thresholds::Thresholds;
use crate::report::ReportWriter;
use crate::returns::assets::ReturnTable;
use crate::returns::significance::{regime_contrast, SignificanceTest};
use crate::returns::summary::{grouped_statistics, GroupStats};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Everything one research run produces
#[derive(Debug, Clone)]
pub struct ResearchOutput {
    pub thresholds: Thresholds,
    pub counts: Vec<CountRow>,
    pub returns: ReturnTable,
    pub grouped: Vec<GroupStats>,
    pub significance: SignificanceTest,
}

impl ResearchOutput {
    /// Write every output table into `dir`, returning the files written
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let writer = ReportWriter::new(dir)?;
        let written = vec![
            writer.regime_table(self.returns.regimes())?,
            writer.thresholds(&self.thresholds.report())?,
            writer.counts(&self.counts)?,
            writer.return_table(&self.returns)?,
            writer.grouped_stats(&self.grouped)?,
            writer.significance(&self.significance)?,
        ];
        log::info!("Wrote {} report files to {}", written.len(), dir.display());
        Ok(written)
    }

    /// Grouped statistics for one asset and regime type
    pub fn stats_for(&self, asset: &str, regime_type: RegimeType) -> Vec<&GroupStats> {
        self.grouped
            .iter()
            .filter(|s| s.asset == asset && s.regime_type == regime_type)
            .collect()
    }
}

/// Runs the classifier and the summary engine with one configuration
#[derive(Debug, Clone)]
pub struct ResearchPipeline {
    config: PipelineConfig,
}

impl ResearchPipeline {
    /// Create a pipeline; invalid configuration is rejected up front
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build the monthly panel from a series store
    pub fn build_panel<S: SeriesStore + ?Sized>(
        &self,
        store: &S,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Panel> {
        PanelBuilder::new(start, end)
            .with_series(self.config.series.iter().cloned())
            .build(store)
    }

    /// Regime classification stage alone
    pub fn classify(&self, panel: &Panel) -> Result<Classification> {
        for column in self.config.columns.required() {
            panel.require(column)?;
        }
        RegimeClassifier::new(self.config.columns.clone(), self.config.regime.clone())
            .classify(panel)
    }

    /// Return and summary stage on an already classified panel
    pub fn summarize(&self, classification: Classification) -> Result<ResearchOutput> {
        let summary = &self.config.summary;
        let Classification {
            table,
            thresholds,
            counts,
        } = classification;

        let returns = ReturnTable::compute(table, &summary.assets, summary.periods_per_year)?;
        let grouped = grouped_statistics(&returns, &RegimeType::ALL_TYPES, summary.periods_per_year);
        let significance = regime_contrast(&returns, &summary.significance)?;

        Ok(ResearchOutput {
            thresholds,
            counts,
            returns,
            grouped,
            significance,
        })
    }

    /// Full run over a panel
    pub fn run(&self, panel: &Panel) -> Result<ResearchOutput> {
        log::info!(
            "Running regime research over {} months ({} to {})",
            panel.len(),
            panel.dates().first().map(|d| d.to_string()).unwrap_or_default(),
            panel.dates().last().map(|d| d.to_string()).unwrap_or_default()
        );
        let classification = self.classify(panel)?;
        self.summarize(classification)
    }
}
