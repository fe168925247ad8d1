//! Shared domain types.
//!
//! Records are parsed once by the loader and are read-only afterwards. All
//! derived values (views, series, forecasts) are rebuilt on every filter change
//! and carry no identity between recomputations.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{Datelike, Month, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Weekdays in display order (Monday first).
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// One row of the trip dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRecord {
    pub date: NaiveDate,
    pub dispatching_base_number: String,
    pub trips: u64,
    pub active_vehicles: u64,

    /// Derived from `date` at load time.
    pub day_name: Weekday,
    /// Derived from `date` at load time.
    pub month: Month,
}

impl TripRecord {
    pub fn new(date: NaiveDate, base: impl Into<String>, trips: u64, active_vehicles: u64) -> Self {
        Self {
            date,
            dispatching_base_number: base.into(),
            trips,
            active_vehicles,
            day_name: date.weekday(),
            month: month_of(date),
        }
    }
}

/// A row the loader skipped.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// The loaded dataset. Immutable after load.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<TripRecord>,
    pub rows_read: usize,
    pub row_errors: Vec<RowError>,
}

impl Dataset {
    pub fn from_records(records: Vec<TripRecord>) -> Self {
        Self {
            rows_read: records.len(),
            records,
            row_errors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct months in first-appearance order.
    pub fn months(&self) -> Vec<Month> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.month)
            .filter(|m| seen.insert(*m))
            .collect()
    }

    /// Distinct base identifiers in first-appearance order.
    pub fn bases(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for r in &self.records {
            let base = r.dispatching_base_number.as_str();
            if seen.insert(base) {
                out.push(base.to_string());
            }
        }
        out
    }
}

/// The caller's chosen months and dispatch bases.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    pub months: HashSet<Month>,
    pub bases: HashSet<String>,
}

impl FilterSelection {
    pub fn new(months: impl IntoIterator<Item = Month>, bases: impl IntoIterator<Item = String>) -> Self {
        Self {
            months: months.into_iter().collect(),
            bases: bases.into_iter().collect(),
        }
    }

    /// Every month and base present in the dataset.
    pub fn all(dataset: &Dataset) -> Self {
        Self::new(dataset.months(), dataset.bases())
    }
}

/// Trips summed over one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub trips: u64,
}

/// A predicted daily total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub trips: f64,
}

/// Headline numbers for the KPI cards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Kpis {
    pub total_trips: u64,
    pub total_vehicles: u64,
    pub peak_daily_trips: u64,
    /// `total_trips / total_vehicles` rounded to 2 decimals; 0 without vehicles.
    pub trips_per_vehicle: f64,
}

/// Resolved run configuration (CLI flags + environment).
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    /// `None` means every month present in the data.
    pub months: Option<Vec<Month>>,
    /// `None` means every base present in the data.
    pub bases: Option<Vec<String>>,
}

impl DashboardConfig {
    /// Resolve the filter against a loaded dataset.
    pub fn selection(&self, dataset: &Dataset) -> FilterSelection {
        let months = match &self.months {
            Some(months) => months.clone(),
            None => dataset.months(),
        };
        let bases = match &self.bases {
            Some(bases) => bases.clone(),
            None => dataset.bases(),
        };
        FilterSelection::new(months, bases)
    }
}

pub fn month_of(date: NaiveDate) -> Month {
    // `month()` is always 1..=12.
    Month::try_from(date.month() as u8).unwrap_or(Month::January)
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn record_derives_calendar_fields() {
        let r = TripRecord::new(date(2015, 1, 1), "B02512", 1132, 190);
        assert_eq!(r.day_name, Weekday::Thu);
        assert_eq!(r.month, Month::January);
        assert_eq!(weekday_name(r.day_name), "Thursday");
        assert_eq!(r.month.name(), "January");
    }

    #[test]
    fn month_of_covers_the_whole_year() {
        assert_eq!(month_of(date(2015, 1, 31)), Month::January);
        assert_eq!(month_of(date(2015, 12, 1)), Month::December);
    }

    #[test]
    fn distinct_values_keep_first_appearance_order() {
        let ds = Dataset::from_records(vec![
            TripRecord::new(date(2015, 2, 1), "B2", 1, 1),
            TripRecord::new(date(2015, 1, 1), "B1", 1, 1),
            TripRecord::new(date(2015, 2, 2), "B2", 1, 1),
        ]);
        assert_eq!(ds.months(), vec![Month::February, Month::January]);
        assert_eq!(ds.bases(), vec!["B2".to_string(), "B1".to_string()]);
    }
}
