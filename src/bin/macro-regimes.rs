//! macro-regimes CLI - regime classification and regime-conditional returns
//!
//! ## Example Usage
//!
//! ```bash
//! # Download raw series (requires FRED_API_KEY and the `async` feature)
//! macro-regimes fetch --start 1990-01-01
//!
//! # Align raw series onto a monthly panel
//! macro-regimes build-panel --start 1990-01-01 -o panel.csv
//!
//! # Full run: labels, returns, grouped statistics, Rising vs Falling test
//! macro-regimes run panel.csv -o results/
//!
//! # Show effective configuration
//! macro-regimes info
//! ```

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use macro_regimes::config::PipelineConfig;
use macro_regimes::data::{CsvSeriesStore, Panel};
use macro_regimes::pipeline::{ResearchOutput, ResearchPipeline};
use macro_regimes::regime::RegimeType;
use macro_regimes::report::ReportWriter;
use macro_regimes::returns::SignificanceTest;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// macro-regimes: macro regime classification and asset returns by regime
#[derive(Parser)]
#[command(name = "macro-regimes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Robert Fall")]
#[command(about = "Macro regime classification and regime-conditional return statistics", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download raw series from FRED into the data directory
    #[cfg(feature = "async")]
    Fetch {
        /// Start date (YYYY-MM-DD)
        #[arg(short = 's', long)]
        start: String,

        /// End date (YYYY-MM-DD, default: today)
        #[arg(short = 'e', long)]
        end: Option<String>,
    },

    /// Align raw series onto a monthly panel
    BuildPanel {
        /// Start date (YYYY-MM-DD)
        #[arg(short = 's', long)]
        start: String,

        /// End date (YYYY-MM-DD, default: today)
        #[arg(short = 'e', long)]
        end: Option<String>,

        /// Directory of <series>.csv files (default: configured data dir)
        #[arg(long)]
        series_dir: Option<PathBuf>,

        /// Output panel CSV
        #[arg(short = 'o', long, default_value = "panel.csv")]
        output: PathBuf,
    },

    /// Classify a panel and write the regime table and QA reports
    Classify {
        /// Panel CSV file
        #[arg(value_name = "PANEL")]
        panel: PathBuf,

        /// Output directory
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Classify, compute returns, grouped statistics and the regime test
    Run {
        /// Panel CSV file
        #[arg(value_name = "PANEL")]
        panel: PathBuf,

        /// Output directory
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Show the effective configuration
    Info,
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Config {
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(flatten)]
    research: PipelineConfig,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".macro-regimes")
        .join("series")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            research: PipelineConfig::default(),
        }
    }
}

impl Config {
    fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => dirs::home_dir().map(|home| home.join(".macro-regimes").join("config.toml")),
        };

        if let Some(config_path) = path {
            if config_path.exists() {
                match fs::read_to_string(&config_path) {
                    Ok(contents) => match toml::from_str(&contents) {
                        Ok(config) => return config,
                        Err(e) => {
                            eprintln!("{} Failed to parse config: {}", "Warning:".yellow(), e);
                        }
                    },
                    Err(e) => {
                        eprintln!("{} Failed to read config: {}", "Warning:".yellow(), e);
                    }
                }
            }
        }

        Config::default()
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref());

    if cli.verbose {
        println!(
            "{} v{}",
            "macro-regimes".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "Data dir: {}",
            config.data_dir.display().to_string().dimmed()
        );
    }

    let result = match cli.command {
        #[cfg(feature = "async")]
        Commands::Fetch { start, end } => fetch_series(&start, end.as_deref(), &config),

        Commands::BuildPanel {
            start,
            end,
            series_dir,
            output,
        } => build_panel(&start, end.as_deref(), series_dir, &output, &config),

        Commands::Classify { panel, output } => classify_panel(&panel, output, cli.verbose, &config),

        Commands::Run { panel, output } => run_research(&panel, output, cli.verbose, &config),

        Commands::Info => show_info(&config),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", raw, e).into())
}

fn date_window(
    start: &str,
    end: Option<&str>,
) -> Result<(NaiveDate, NaiveDate), Box<dyn std::error::Error>> {
    let start = parse_date(start)?;
    let end = match end {
        Some(end) => parse_date(end)?,
        None => Utc::now().date_naive(),
    };
    Ok((start, end))
}

fn spinner(message: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    Ok(pb)
}

#[cfg(feature = "async")]
fn fetch_series(start: &str, end: Option<&str>, config: &Config) -> CliResult {
    use macro_regimes::data::sources::FredSource;

    let (start, end) = date_window(start, end)?;
    let ids: Vec<String> = config.research.series.iter().map(|s| s.id.clone()).collect();

    println!("{}", "Fetching series...".cyan().bold());
    let source = FredSource::from_env()?;
    let runtime = tokio::runtime::Runtime::new()?;
    let downloaded =
        runtime.block_on(source.download_to_dir(&ids, start, end, &config.data_dir))?;

    for series in &downloaded {
        println!(
            "  {} {} ({} observations)",
            "✓".green().bold(),
            series.id.bright_green(),
            series.len()
        );
    }
    Ok(())
}

fn build_panel(
    start: &str,
    end: Option<&str>,
    series_dir: Option<PathBuf>,
    output: &Path,
    config: &Config,
) -> CliResult {
    let (start, end) = date_window(start, end)?;
    let dir = series_dir.unwrap_or_else(|| config.data_dir.clone());
    let store = CsvSeriesStore::new(&dir);

    let pipeline = ResearchPipeline::new(config.research.clone())?;
    let pb = spinner("Aligning series onto a monthly grid...")?;
    let panel = pipeline.build_panel(&store, start, end)?;
    panel.write_csv(output)?;
    pb.finish_with_message("Panel built");

    println!(
        "  {} {} months x {} columns -> {}",
        "✓".green().bold(),
        panel.len(),
        panel.column_names().count(),
        output.display()
    );
    Ok(())
}

fn classify_panel(
    panel_path: &Path,
    output: Option<PathBuf>,
    verbose: bool,
    config: &Config,
) -> CliResult {
    let panel = Panel::read_csv(panel_path)?;
    let pipeline = ResearchPipeline::new(config.research.clone())?;
    let classification = pipeline.classify(&panel)?;

    let writer = ReportWriter::new(output.unwrap_or_else(|| config.output_dir.clone()))?;
    let written = vec![
        writer.regime_table(&classification.table)?,
        writer.thresholds(&classification.thresholds.report())?,
        writer.counts(&classification.counts)?,
    ];

    println!("{}", "Thresholds".cyan().bold());
    println!("{}", "==========".cyan());
    for row in classification.thresholds.report() {
        println!(
            "  {:<16} lower={:<10} upper={:<10} {}",
            row.metric,
            fmt_opt(row.lower, 3),
            fmt_opt(row.upper, 3),
            row.method.dimmed()
        );
    }
    println!();

    if verbose {
        println!("{}", "Label counts".cyan().bold());
        for row in &classification.counts {
            println!("  {:<16} {:<18} {}", row.regime_type, row.label, row.count);
        }
        println!();
    }

    print_written(&written);
    Ok(())
}

fn run_research(
    panel_path: &Path,
    output: Option<PathBuf>,
    verbose: bool,
    config: &Config,
) -> CliResult {
    println!("{}", "Running regime research...".cyan().bold());
    println!();

    let panel = Panel::read_csv(panel_path)?;
    let pipeline = ResearchPipeline::new(config.research.clone())?;

    let pb = spinner("Classifying and summarizing...")?;
    let results = pipeline.run(&panel)?;
    let written = results.write_to(&output.unwrap_or_else(|| config.output_dir.clone()))?;
    pb.finish_with_message("Research run complete!");
    println!();

    let significance = &config.research.summary.significance;
    print_group_table(&results, &significance.asset, significance.regime_type);
    if verbose {
        for asset in &config.research.summary.assets {
            if asset.name != significance.asset {
                print_group_table(&results, &asset.name, RegimeType::RateDirection);
            }
        }
    }
    print_significance(&results.significance);
    print_written(&written);
    Ok(())
}

fn print_group_table(results: &ResearchOutput, asset: &str, regime_type: RegimeType) {
    println!(
        "{} {}",
        asset.green().bold(),
        format!("by {}", regime_type).green()
    );
    println!(
        "  {:<18} {:>5} {:>12} {:>12}",
        "label", "n", "ann. mean", "ann. sd"
    );
    for row in results.stats_for(asset, regime_type) {
        println!(
            "  {:<18} {:>5} {:>12} {:>12}",
            row.label,
            row.n,
            fmt_opt(row.annualized_mean, 4),
            fmt_opt(row.annualized_sd, 4)
        );
    }
    println!();
}

fn print_significance(test: &SignificanceTest) {
    let groups = test.groups();
    println!(
        "{} {} {} vs {} ({})",
        "Welch test:".cyan().bold(),
        groups.regime_type,
        groups.group1,
        groups.group2,
        groups.asset
    );

    match test {
        SignificanceTest::Completed {
            stats,
            confidence,
            caveat,
            ..
        } => {
            println!("  n:          {} / {}", groups.n1, groups.n2);
            println!("  mean diff:  {:+.5}", stats.mean_diff);
            println!("  t-stat:     {:.3} (df {:.1})", stats.t_stat, stats.df);
            println!("  p-value:    {}", format!("{:.4}", stats.p_value).bold());
            println!(
                "  {:.0}% CI:    [{:.5}, {:.5}]",
                confidence * 100.0,
                stats.ci_lower,
                stats.ci_upper
            );
            println!("  {}", caveat.dimmed());
        }
        SignificanceTest::Skipped { message, .. } => {
            println!(
                "  {} (n = {} / {})",
                message.yellow(),
                groups.n1,
                groups.n2
            );
        }
    }
    println!();
}

fn print_written(paths: &[PathBuf]) {
    for path in paths {
        println!("{} {}", "✓".green().bold(), path.display());
    }
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}

fn show_info(config: &Config) -> CliResult {
    println!("{}", "macro-regimes configuration".cyan().bold());
    println!("{}", "===========================".cyan());
    println!();
    println!("  {} {}", "Data dir:".bold(), config.data_dir.display());
    println!("  {} {}", "Output dir:".bold(), config.output_dir.display());
    println!();
    println!("{}", toml::to_string_pretty(&config.research)?);
    Ok(())
}
