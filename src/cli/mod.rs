//! Command-line parsing for the prognosis tool.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "prognosis",
    version,
    about = "COVID-19 prognosis from reported death counts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast all metrics for one region and print the tables.
    Forecast(ForecastArgs),
    /// Show the log-space fit diagnostics for one region.
    Debug(ForecastArgs),
    /// Rank regions by projected peak ICU bed demand.
    Rank(RankArgs),
    /// List the regions available from the selected data source.
    Regions(SourceArgs),
}

/// Where the death counts come from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Use US states instead of countries (JHU source only).
    #[arg(long)]
    pub us_states: bool,

    /// Load a local CSV (`date,cumulative_deaths`) instead of fetching JHU data.
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Use a seeded synthetic outbreak instead of real data.
    #[arg(long)]
    pub sample: bool,

    /// Seed for `--sample`.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Common options for forecasting and fit diagnostics.
#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Region to forecast (country or US state, depending on the source).
    #[arg(short, long)]
    pub region: Option<String>,

    /// Full lockdown date (YYYY-MM-DD). Omitting it fits the worst-case
    /// no-intervention trend.
    #[arg(long)]
    pub lockdown: Option<NaiveDate>,

    /// Fall back to the built-in lockdown-date hint for known regions.
    #[arg(long)]
    pub lockdown_hint: bool,

    /// Forecast horizon in days past the last observation.
    #[arg(long, default_value_t = 30)]
    pub lookahead: i64,

    /// Days until a lockdown measurably slows the death growth rate.
    #[arg(long, default_value_t = 21)]
    pub effect_lag: i64,

    /// Minimum usable points required in the pre-lockdown segment.
    #[arg(long, default_value_t = 3)]
    pub min_points: usize,

    /// Huber IRLS reweight iterations (0 = plain least squares).
    #[arg(long, default_value_t = 5)]
    pub robust_iters: usize,

    /// Huber tuning constant (larger = less downweighting).
    #[arg(long, default_value_t = 1.345)]
    pub huber_k: f64,

    /// Observed days of history to show in the tables.
    #[arg(long, default_value_t = 10)]
    pub history_tail: usize,

    /// Render the terminal plot (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 90)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the metric tables to CSV.
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Export the full forecast (fit + tables) to JSON.
    #[arg(long = "export-json", value_name = "FILE")]
    pub export_json: Option<PathBuf>,

    /// Write a markdown debug bundle under `debug/` (debug command only).
    #[arg(long)]
    pub bundle: bool,
}

/// Options for the region ranking.
#[derive(Debug, Args, Clone)]
pub struct RankArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Show the top-N regions.
    #[arg(long, default_value_t = 20)]
    pub top: usize,

    /// Forecast horizon in days past the last observation.
    #[arg(long, default_value_t = 30)]
    pub lookahead: i64,

    /// Apply built-in lockdown-date hints where known.
    #[arg(long)]
    pub lockdown_hints: bool,
}
