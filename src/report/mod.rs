//! Aggregations over a filtered view, plus formatted terminal output.
//!
//! Every function here is pure: it reads the view and returns an owned value.

use std::collections::{BTreeMap, HashMap};

use chrono::Weekday;
use serde::Serialize;

use crate::domain::{DailyTotal, Kpis, WEEKDAYS};
use crate::filter::FilteredView;
use crate::math::{LinearFit, fit_line, pearson, round_to};

pub mod format;

pub use format::*;

/// Trips summed per weekday, Monday first. Weekdays absent from the view are omitted.
pub type WeekdayTotals = Vec<(Weekday, u64)>;

/// Trips per (base, weekday). Rows are bases sorted by id; columns follow `WEEKDAYS`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BaseDayPivot {
    pub bases: Vec<String>,
    /// `None` where a base has no rows on that weekday.
    pub cells: Vec<[Option<u64>; 7]>,
}

impl BaseDayPivot {
    pub fn get(&self, base: &str, day: Weekday) -> Option<u64> {
        let row = self.bases.iter().position(|b| b == base)?;
        self.cells[row][day.num_days_from_monday() as usize]
    }

    /// Largest cell value, for colour scaling.
    pub fn max_cell(&self) -> u64 {
        self.cells
            .iter()
            .flat_map(|row| row.iter().flatten())
            .copied()
            .max()
            .unwrap_or(0)
    }
}

/// Headline sums over the view. Totals saturate at `u64::MAX`.
pub fn kpis(view: &FilteredView<'_>) -> Kpis {
    let mut total_trips = 0u64;
    let mut total_vehicles = 0u64;
    let mut peak = 0u64;
    for r in view.iter() {
        total_trips = total_trips.saturating_add(r.trips);
        total_vehicles = total_vehicles.saturating_add(r.active_vehicles);
        peak = peak.max(r.trips);
    }

    let trips_per_vehicle = if total_vehicles == 0 {
        0.0
    } else {
        round_to(total_trips as f64 / total_vehicles as f64, 2)
    };

    Kpis {
        total_trips,
        total_vehicles,
        peak_daily_trips: peak,
        trips_per_vehicle,
    }
}

/// Percent change from `previous` to `current`; 0 when `previous` is 0.
pub fn growth(current: u64, previous: u64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    (current as f64 - previous as f64) / previous as f64 * 100.0
}

/// Trips summed per date, oldest first.
pub fn daily_series(view: &FilteredView<'_>) -> Vec<DailyTotal> {
    let mut by_date = BTreeMap::new();
    for r in view.iter() {
        let sum = by_date.entry(r.date).or_insert(0u64);
        *sum = sum.saturating_add(r.trips);
    }
    by_date
        .into_iter()
        .map(|(date, trips)| DailyTotal { date, trips })
        .collect()
}

/// Trips summed per weekday, Monday through Sunday.
pub fn weekday_totals(view: &FilteredView<'_>) -> WeekdayTotals {
    let mut sums: [Option<u64>; 7] = [None; 7];
    for r in view.iter() {
        let slot = &mut sums[r.day_name.num_days_from_monday() as usize];
        *slot = Some(slot.unwrap_or(0).saturating_add(r.trips));
    }
    WEEKDAYS
        .into_iter()
        .zip(sums)
        .filter_map(|(day, sum)| sum.map(|s| (day, s)))
        .collect()
}

/// Base x weekday pivot of summed trips.
pub fn base_day_pivot(view: &FilteredView<'_>) -> BaseDayPivot {
    let mut rows: BTreeMap<&str, [Option<u64>; 7]> = BTreeMap::new();
    for r in view.iter() {
        let row = rows.entry(r.dispatching_base_number.as_str()).or_insert([None; 7]);
        let cell = &mut row[r.day_name.num_days_from_monday() as usize];
        *cell = Some(cell.unwrap_or(0).saturating_add(r.trips));
    }
    BaseDayPivot {
        bases: rows.keys().map(|b| b.to_string()).collect(),
        cells: rows.into_values().collect(),
    }
}

/// Busiest and quietest weekday.
///
/// Ties go to the earlier weekday (Monday first). `None` for an empty view.
pub fn top_bottom(totals: &WeekdayTotals) -> Option<(Weekday, Weekday)> {
    let mut best = *totals.first()?;
    let mut worst = best;
    for &(day, trips) in &totals[1..] {
        if trips > best.1 {
            best = (day, trips);
        }
        if trips < worst.1 {
            worst = (day, trips);
        }
    }
    Some((best.0, worst.0))
}

/// Base with the most trips; ties go to the lexicographically smallest id.
pub fn peak_base(view: &FilteredView<'_>) -> Option<String> {
    let mut sums: HashMap<&str, u64> = HashMap::new();
    for r in view.iter() {
        let sum = sums.entry(r.dispatching_base_number.as_str()).or_insert(0u64);
        *sum = sum.saturating_add(r.trips);
    }
    sums.into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(base, _)| base.to_string())
}

/// Direction of the fitted daily trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

impl TrendDirection {
    /// Slopes within `FLAT_SLOPE` trips/day of zero count as flat.
    pub const FLAT_SLOPE: f64 = 1e-6;

    pub fn from_slope(slope: f64) -> Self {
        if slope > Self::FLAT_SLOPE {
            TrendDirection::Rising
        } else if slope < -Self::FLAT_SLOPE {
            TrendDirection::Falling
        } else {
            TrendDirection::Flat
        }
    }
}

/// The computed statements behind the insights panel.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Insights {
    pub best_day: Option<Weekday>,
    pub worst_day: Option<Weekday>,
    pub peak_base: Option<String>,
    pub vehicle_correlation: Option<f64>,
    pub trend: Option<TrendDirection>,
}

pub fn insights(
    view: &FilteredView<'_>,
    weekdays: &WeekdayTotals,
    scatter: &[(f64, f64)],
    daily_slope: Option<f64>,
) -> Insights {
    let (best_day, worst_day) = match top_bottom(weekdays) {
        Some((best, worst)) => (Some(best), Some(worst)),
        None => (None, None),
    };
    Insights {
        best_day,
        worst_day,
        peak_base: peak_base(view),
        vehicle_correlation: vehicle_correlation(scatter),
        trend: daily_slope.map(TrendDirection::from_slope),
    }
}

/// `(active_vehicles, trips)` per row, for the scatter chart.
pub fn vehicle_trip_points(view: &FilteredView<'_>) -> Vec<(f64, f64)> {
    view.iter()
        .map(|r| (r.active_vehicles as f64, r.trips as f64))
        .collect()
}

/// OLS trend of trips on active vehicles across rows.
pub fn vehicle_trend(points: &[(f64, f64)]) -> Option<LinearFit> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
    fit_line(&xs, &ys)
}

/// Pearson correlation between active vehicles and trips.
pub fn vehicle_correlation(points: &[(f64, f64)]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
    pearson(&xs, &ys)
}
