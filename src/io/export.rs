//! Filtered-data CSV export and chart-spec JSON export.
//!
//! The CSV export keeps the input schema (the four source columns, no derived
//! fields) so the file can be fed straight back into the loader.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::chart::ChartSpec;
use crate::error::AppError;
use crate::filter::FilteredView;
use crate::io::ingest::{COL_BASE, COL_DATE, COL_TRIPS, COL_VEHICLES};

/// File name offered for the filtered download.
pub const EXPORT_FILE_NAME: &str = "uber_filtered_data.csv";
/// MIME type of the filtered download.
pub const EXPORT_MIME: &str = "text/csv";

const HEADER: [&str; 4] = [COL_BASE, COL_DATE, COL_VEHICLES, COL_TRIPS];

/// Write the view's rows as CSV to any writer. Returns the number of rows written.
pub fn write_filtered<W: Write>(writer: W, view: &FilteredView<'_>) -> Result<usize, AppError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in view.iter() {
        csv.write_record([
            r.dispatching_base_number.clone(),
            r.date.format("%Y-%m-%d").to_string(),
            r.active_vehicles.to_string(),
            r.trips.to_string(),
        ])
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    csv.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(view.len())
}

/// Write the view's rows to a CSV file.
pub fn write_filtered_csv(path: &Path, view: &FilteredView<'_>) -> Result<usize, AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let rows = write_filtered(file, view)?;
    info!(path = %path.display(), rows, "exported filtered trips");
    Ok(rows)
}

/// Write chart specs as pretty JSON.
pub fn write_charts_json(path: &Path, charts: &[ChartSpec]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create chart JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, charts)
        .map_err(|e| AppError::new(2, format!("Failed to write chart JSON: {e}")))?;

    info!(path = %path.display(), charts = charts.len(), "exported chart specs");
    Ok(())
}
