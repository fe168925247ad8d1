//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves the data path
//! - loads the dataset once through the shared cache
//! - runs the dashboard pipeline
//! - prints reports, writes exports, or hands over to the TUI

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Month;
use clap::Parser;
use tracing::info;

use crate::cli::{ChartsArgs, Command, ExportArgs, FilterArgs, ReportArgs};
use crate::domain::{Dataset, DashboardConfig};
use crate::error::AppError;

pub mod pipeline;

/// Environment variable naming the trip CSV.
pub const DATA_ENV: &str = "TRIPS_DATA";
/// Used when neither `--data` nor `TRIPS_DATA` is set.
pub const DEFAULT_DATA_PATH: &str = "data/Uber-Jan-Feb-FOIL.csv";

/// Entry point for the `trips` binary.
pub fn run() -> Result<(), AppError> {
    // `trips` and `trips -m January` behave like `trips tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Report(args) => handle_report(args),
        Command::Export(args) => handle_export(args),
        Command::Charts(args) => handle_charts(args),
    }
}

fn handle_tui(args: FilterArgs) -> Result<(), AppError> {
    // The TUI owns the terminal; keep stderr quiet unless asked.
    crate::logging::init("warn");
    let config = config_from_args(&args)?;
    let dataset = load(&config)?;
    crate::tui::run(dataset, &config)
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    crate::logging::init("info");
    let config = config_from_args(&args.filter)?;
    let dataset = load(&config)?;
    let dashboard = pipeline::build_dashboard(&dataset, &config.selection(&dataset));

    println!("{}", crate::report::format_report(&dashboard));

    if args.plot {
        let charts = [
            crate::chart::trend_chart(&dashboard.daily),
            crate::chart::forecast_chart(&dashboard.daily, dashboard.forecast.as_ref().ok()),
            crate::chart::anomaly_chart(&dashboard.daily, &dashboard.spikes),
        ];
        for chart in &charts {
            println!("{}", crate::plot::render_ascii_chart(chart, args.width, args.height));
        }
    }
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    crate::logging::init("info");
    let config = config_from_args(&args.filter)?;
    let dataset = load(&config)?;
    let view = crate::filter::filter(&dataset, &config.selection(&dataset));

    let rows = crate::io::write_filtered_csv(&args.out, &view)?;
    println!("Wrote {rows} row(s) to {} ({})", args.out.display(), crate::io::EXPORT_MIME);
    Ok(())
}

fn handle_charts(args: ChartsArgs) -> Result<(), AppError> {
    crate::logging::init("info");
    let config = config_from_args(&args.filter)?;
    let dataset = load(&config)?;
    let dashboard = pipeline::build_dashboard(&dataset, &config.selection(&dataset));

    let charts = crate::chart::dashboard_charts(&dashboard);
    crate::io::write_charts_json(&args.out, &charts)?;
    println!("Wrote {} chart(s) to {}", charts.len(), args.out.display());
    Ok(())
}

fn load(config: &DashboardConfig) -> Result<Arc<Dataset>, AppError> {
    let dataset = crate::io::shared_cache(&config.data_path).get()?;
    if !dataset.row_errors.is_empty() {
        info!(skipped = dataset.row_errors.len(), "some rows were skipped during load");
    }
    Ok(dataset)
}

/// Resolve flags and environment into a run configuration.
pub fn config_from_args(args: &FilterArgs) -> Result<DashboardConfig, AppError> {
    dotenvy::dotenv().ok();
    let env_path = std::env::var(DATA_ENV).ok().filter(|s| !s.trim().is_empty());
    let data_path = resolve_data_path(args.data.clone(), env_path);

    let months = if args.months.is_empty() {
        None
    } else {
        let parsed = args
            .months
            .iter()
            .map(|m| {
                m.trim().parse::<Month>().map_err(|_| {
                    AppError::new(2, format!("Unknown month '{m}'. Use a month name such as `January` or `Feb`."))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Some(parsed)
    };

    let bases = if args.bases.is_empty() {
        None
    } else {
        Some(args.bases.iter().map(|b| b.trim().to_string()).collect())
    };

    Ok(DashboardConfig {
        data_path,
        months,
        bases,
    })
}

fn resolve_data_path(flag: Option<PathBuf>, env: Option<String>) -> PathBuf {
    flag.or_else(|| env.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
}

/// Rewrite argv so `trips` defaults to `trips tui`.
///
/// Rules:
/// - `trips`                      -> `trips tui`
/// - `trips -m January ...`       -> `trips tui -m January ...`
/// - `trips --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "report" | "export" | "charts");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
