//! CSV ingest and the process-wide dataset cache.
//!
//! This module turns the trip CSV into an immutable `Dataset`:
//! - **Strict schema** for required columns (missing ones abort the load)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Load once**: `DatasetCache` reads the file on first access only

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::{Dataset, RowError, TripRecord};
use crate::error::LoadError;

pub const COL_DATE: &str = "date";
pub const COL_BASE: &str = "dispatching_base_number";
pub const COL_TRIPS: &str = "trips";
pub const COL_VEHICLES: &str = "active_vehicles";

const REQUIRED_COLUMNS: [&str; 4] = [COL_DATE, COL_BASE, COL_TRIPS, COL_VEHICLES];

/// Largest per-row count accepted; larger values are reported as row errors.
///
/// Keeps every sum over the dataset well inside `u64`.
pub const MAX_COUNT: u64 = u32::MAX as u64;

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    base: usize,
    trips: usize,
    vehicles: usize,
}

/// Read and parse the trip CSV at `path`.
pub fn load_dataset(path: &Path) -> Result<Dataset, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = parse_trips(file)?;

    info!(
        path = %path.display(),
        rows_read = dataset.rows_read,
        rows_used = dataset.len(),
        skipped = dataset.row_errors.len(),
        "loaded trip data"
    );
    Ok(dataset)
}

/// Parse trip CSV from any reader.
pub fn parse_trips<R: Read>(reader: R) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(LoadError::Header)?.clone();
    let columns = resolve_columns(&build_header_map(&headers))?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based lines, and the header occupies line 1.
        let line = idx + 2;
        rows_read += 1;

        let parsed = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, columns));

        match parsed {
            Ok(record) => records.push(record),
            Err(message) => {
                warn!(line, %message, "skipping trip row");
                row_errors.push(RowError { line, message });
            }
        }
    }

    Ok(Dataset {
        records,
        rows_read,
        row_errors,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<Columns, LoadError> {
    for name in REQUIRED_COLUMNS {
        if !header_map.contains_key(name) {
            return Err(LoadError::MissingColumn(name));
        }
    }
    let at = |name: &str| header_map.get(name).copied().unwrap_or_default();
    Ok(Columns {
        date: at(COL_DATE),
        base: at(COL_BASE),
        trips: at(COL_TRIPS),
        vehicles: at(COL_VEHICLES),
    })
}

fn parse_row(record: &StringRecord, columns: Columns) -> Result<TripRecord, String> {
    let date = parse_date(get_required(record, columns.date, COL_DATE)?)?;
    let base = get_required(record, columns.base, COL_BASE)?;
    let trips = parse_count(get_required(record, columns.trips, COL_TRIPS)?, COL_TRIPS)?;
    let vehicles = parse_count(get_required(record, columns.vehicles, COL_VEHICLES)?, COL_VEHICLES)?;

    Ok(TripRecord::new(date, base, trips, vehicles))
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_count(s: &str, name: &str) -> Result<u64, String> {
    let n = s
        .parse::<u64>()
        .map_err(|_| format!("Invalid `{name}` '{s}' (expected a non-negative integer)."))?;
    if n > MAX_COUNT {
        return Err(format!("`{name}` {n} exceeds the maximum of {MAX_COUNT}."));
    }
    Ok(n)
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // The FOIL export uses `M/D/YYYY`; our own exports use ISO dates.
    const FMTS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, M/D/YYYY, YYYY/MM/DD."
    ))
}

/// Load-once cache for a single dataset path.
///
/// The first successful `get` reads the file; every later call returns the same
/// `Arc` without touching the filesystem. Concurrent first accesses are
/// serialized on `init`; reads after population take no lock. A failed load
/// leaves the cache empty so the next call retries.
#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    cell: OnceLock<Arc<Dataset>>,
    init: Mutex<()>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Result<Arc<Dataset>, LoadError> {
        if let Some(dataset) = self.cell.get() {
            return Ok(Arc::clone(dataset));
        }

        // A poisoned guard only means another loader panicked; the cell is
        // still consistent, so carry on.
        let _guard = self.init.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(dataset) = self.cell.get() {
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(load_dataset(&self.path)?);
        debug!(path = %self.path.display(), "dataset cache populated");
        Ok(Arc::clone(self.cell.get_or_init(|| dataset)))
    }
}

static SHARED: OnceLock<DatasetCache> = OnceLock::new();

/// The process-wide cache. The first configured path wins.
pub fn shared_cache(path: &Path) -> &'static DatasetCache {
    let cache = SHARED.get_or_init(|| DatasetCache::new(path));
    if cache.path() != path {
        warn!(
            requested = %path.display(),
            cached = %cache.path().display(),
            "dataset cache already bound to another path"
        );
    }
    cache
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::{Month, Weekday};

    use super::*;

    const FOIL_SAMPLE: &str = "\
dispatching_base_number,date,active_vehicles,trips
B02512,1/1/2015,190,1132
B02765,1/1/2015,225,1765
B02512,2/1/2015,175,875
";

    #[test]
    fn parses_foil_format_and_derives_fields() {
        let ds = parse_trips(FOIL_SAMPLE.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.rows_read, 3);
        assert!(ds.row_errors.is_empty());

        let first = &ds.records[0];
        assert_eq!(first.dispatching_base_number, "B02512");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert_eq!(first.trips, 1132);
        assert_eq!(first.active_vehicles, 190);
        assert_eq!(first.day_name, Weekday::Thu);
        assert_eq!(ds.records[2].month, Month::February);
    }

    #[test]
    fn header_is_case_and_bom_insensitive() {
        let csv = "\u{feff}Date, TRIPS ,Active_Vehicles,dispatching_base_number,extra\n2015-01-03,10,2,B1,x\n";
        let ds = parse_trips(csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].trips, 10);
        assert_eq!(ds.records[0].active_vehicles, 2);
        assert_eq!(ds.records[0].dispatching_base_number, "B1");
    }

    #[test]
    fn missing_column_is_a_load_error() {
        let csv = "date,dispatching_base_number,trips\n2015-01-01,B1,5\n";
        let err = parse_trips(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("active_vehicles")));
    }

    #[test]
    fn bad_rows_are_skipped_and_reported() {
        let csv = "\
date,dispatching_base_number,trips,active_vehicles
2015-01-01,B1,5,1
not-a-date,B1,5,1
2015-01-02,B1,-4,1
2015-01-03,,5,1
2015-01-04,B1,7,2
";
        let ds = parse_trips(csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows_read, 5);
        let lines: Vec<usize> = ds.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
    }

    #[test]
    fn oversized_counts_are_row_errors() {
        let csv = format!(
            "date,dispatching_base_number,trips,active_vehicles\n\
             2015-01-01,B1,{},1\n\
             2015-01-02,B1,1,{}\n\
             2015-01-03,B1,{MAX_COUNT},{MAX_COUNT}\n",
            u64::MAX,
            MAX_COUNT + 1,
        );
        let ds = parse_trips(csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].trips, MAX_COUNT);
        let lines: Vec<usize> = ds.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 3]);
        assert!(ds.row_errors[0].message.contains("exceeds"));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }

    #[test]
    fn cache_reads_the_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(FOIL_SAMPLE.as_bytes()).unwrap();
        drop(file);

        let cache = DatasetCache::new(&path);
        let first = cache.get().unwrap();

        // Later calls must not touch the file.
        std::fs::remove_file(&path).unwrap();
        let second = cache.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn cache_does_not_remember_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.csv");
        let cache = DatasetCache::new(&path);
        assert!(cache.get().is_err());

        std::fs::write(&path, FOIL_SAMPLE).unwrap();
        assert_eq!(cache.get().unwrap().len(), 3);
    }
}
