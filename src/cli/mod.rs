//! Command-line parsing for the trip analytics dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline and presentation code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::io::EXPORT_FILE_NAME;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "trips", version, about = "Trip demand analytics dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard.
    Tui(FilterArgs),
    /// Print KPIs, breakdowns, forecast, spikes and insights.
    Report(ReportArgs),
    /// Write the filtered rows to CSV.
    Export(ExportArgs),
    /// Write every chart description as JSON.
    Charts(ChartsArgs),
}

/// Data source and filter flags shared by every subcommand.
#[derive(Debug, Args, Clone, Default)]
pub struct FilterArgs {
    /// Trip CSV (falls back to $TRIPS_DATA, then data/Uber-Jan-Feb-FOIL.csv).
    #[arg(short = 'f', long, value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Month to include (repeatable; default: every month in the data).
    #[arg(short = 'm', long = "month", value_name = "NAME")]
    pub months: Vec<String>,

    /// Dispatch base to include (repeatable; default: every base in the data).
    #[arg(short = 'b', long = "base", value_name = "ID")]
    pub bases: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Add ASCII trend, forecast and spike plots.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output CSV path.
    #[arg(short = 'o', long, default_value = EXPORT_FILE_NAME)]
    pub out: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct ChartsArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output JSON path.
    #[arg(short = 'o', long, value_name = "JSON")]
    pub out: PathBuf,
}
