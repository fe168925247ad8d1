//! Shared dashboard pipeline used by both CLI and TUI front-ends.
//!
//! One pass per filter change:
//! filter -> {aggregations, forecast, spikes} -> insights
//!
//! The result owns all of its data so front-ends can keep it across frames
//! without borrowing the dataset.

use serde::Serialize;
use tracing::{debug, info};

use crate::anomaly::{Spikes, detect_spikes};
use crate::domain::{DailyTotal, Dataset, FilterSelection, Kpis};
use crate::error::InsufficientDataError;
use crate::filter::{complement, filter};
use crate::forecast::{Forecast, forecast};
use crate::math::LinearFit;
use crate::report::{self, BaseDayPivot, Insights, WeekdayTotals};

/// Every computed output for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Rows in the filtered view.
    pub rows: usize,
    pub kpis: Kpis,
    /// Trips in the complement view ("previous period").
    pub previous_trips: u64,
    /// Percent change of `kpis.total_trips` over `previous_trips`.
    pub growth: f64,
    pub daily: Vec<DailyTotal>,
    pub weekdays: WeekdayTotals,
    pub pivot: BaseDayPivot,
    /// `(active_vehicles, trips)` per row.
    pub scatter: Vec<(f64, f64)>,
    pub vehicle_trend: Option<LinearFit>,
    #[serde(serialize_with = "serialize_forecast")]
    pub forecast: Result<Forecast, InsufficientDataError>,
    pub spikes: Spikes,
    pub insights: Insights,
}

/// Run the full pipeline for `selection`.
pub fn build_dashboard(dataset: &Dataset, selection: &FilterSelection) -> Dashboard {
    let view = filter(dataset, selection);
    let previous = complement(dataset, selection);

    let kpis = report::kpis(&view);
    let previous_trips = previous.total_trips();
    let growth = report::growth(kpis.total_trips, previous_trips);

    let daily = report::daily_series(&view);
    let weekdays = report::weekday_totals(&view);
    let pivot = report::base_day_pivot(&view);
    let scatter = report::vehicle_trip_points(&view);
    let vehicle_trend = report::vehicle_trend(&scatter);

    let forecast = forecast(&daily);
    if let Err(err) = &forecast {
        debug!(%err, "forecast unavailable");
    }
    let spikes = detect_spikes(&daily);

    let slope = forecast.as_ref().ok().map(|f| f.fit.slope);
    let insights = report::insights(&view, &weekdays, &scatter, slope);

    info!(
        rows = view.len(),
        days = daily.len(),
        spikes = spikes.days.len(),
        total_trips = kpis.total_trips,
        "dashboard recomputed"
    );

    Dashboard {
        rows: view.len(),
        kpis,
        previous_trips,
        growth,
        daily,
        weekdays,
        pivot,
        scatter,
        vehicle_trend,
        forecast,
        spikes,
        insights,
    }
}

fn serialize_forecast<S: serde::Serializer>(
    forecast: &Result<Forecast, InsufficientDataError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    forecast.as_ref().ok().serialize(serializer)
}
