use chrono::{Month, NaiveDate, Weekday};

use trip_analytics::app::pipeline::build_dashboard;
use trip_analytics::chart::{ChartSpec, dashboard_charts};
use trip_analytics::domain::FilterSelection;
use trip_analytics::filter::filter;
use trip_analytics::io::{DatasetCache, MAX_COUNT, load_dataset, parse_trips, write_filtered_csv};
use trip_analytics::report::{TrendDirection, format_report};

const THREE_DAYS: &str = "\
dispatching_base_number,date,active_vehicles,trips
B01,1/1/2015,10,100
B01,1/2/2015,15,150
B01,1/3/2015,20,200
";

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, m, day).unwrap()
}

#[test]
fn three_day_scenario_end_to_end() {
    let ds = parse_trips(THREE_DAYS.as_bytes()).unwrap();
    assert_eq!(ds.len(), 3);

    let dashboard = build_dashboard(&ds, &FilterSelection::all(&ds));

    assert_eq!(dashboard.kpis.total_trips, 450);
    assert_eq!(dashboard.kpis.total_vehicles, 45);
    assert_eq!(dashboard.kpis.peak_daily_trips, 200);
    assert_eq!(dashboard.kpis.trips_per_vehicle, 10.0);
    assert_eq!(dashboard.previous_trips, 0);
    assert_eq!(dashboard.growth, 0.0);

    assert_eq!(
        dashboard.weekdays,
        vec![(Weekday::Thu, 100), (Weekday::Fri, 150), (Weekday::Sat, 200)]
    );

    let fc = dashboard.forecast.as_ref().unwrap();
    assert!((fc.fit.slope - 50.0).abs() < 1e-6);
    assert_eq!(fc.points.len(), 7);
    assert_eq!(fc.points[0].date, d(1, 4));
    assert_eq!(fc.points[6].date, d(1, 10));
    for (k, p) in fc.points.iter().enumerate() {
        let expected = 250.0 + 50.0 * k as f64;
        assert!((p.trips - expected).abs() < 1e-6, "day {k}: {}", p.trips);
    }

    assert!(dashboard.spikes.days.is_empty());
    assert_eq!(dashboard.insights.best_day, Some(Weekday::Sat));
    assert_eq!(dashboard.insights.worst_day, Some(Weekday::Thu));
    assert_eq!(dashboard.insights.peak_base.as_deref(), Some("B01"));
    assert_eq!(dashboard.insights.trend, Some(TrendDirection::Rising));
    let r = dashboard.insights.vehicle_correlation.unwrap();
    assert!((r - 1.0).abs() < 1e-9);

    let report = format_report(&dashboard);
    assert!(report.contains("Highest demand occurs on Saturday"));
    assert!(report.contains("Top performing dispatch base: B01"));
}

#[test]
fn single_day_selection_has_no_forecast_but_still_charts() {
    let ds = parse_trips(THREE_DAYS.as_bytes()).unwrap();
    let mut sel = FilterSelection::all(&ds);
    sel.months.clear();
    sel.months.insert(Month::February);

    let dashboard = build_dashboard(&ds, &sel);
    assert_eq!(dashboard.rows, 0);
    assert_eq!(dashboard.forecast.as_ref().unwrap_err().points, 0);
    assert_eq!(dashboard.previous_trips, 450);
    assert_eq!(dashboard.growth, -100.0);

    let charts = dashboard_charts(&dashboard);
    assert_eq!(charts.len(), 6);
    let ChartSpec::Xy(forecast) = &charts[3] else {
        panic!("forecast chart should be an xy chart");
    };
    assert_eq!(forecast.series.len(), 1);
    assert!(forecast.is_empty());
}

#[test]
fn exported_view_reloads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("trips.csv");
    std::fs::write(&source, THREE_DAYS).unwrap();

    let cache = DatasetCache::new(&source);
    let ds = cache.get().unwrap();
    let view = filter(&ds, &FilterSelection::all(&ds));

    let out = dir.path().join("filtered.csv");
    assert_eq!(write_filtered_csv(&out, &view).unwrap(), 3);

    let reloaded = load_dataset(&out).unwrap();
    assert_eq!(reloaded.records, ds.records);
    assert_eq!(
        build_dashboard(&reloaded, &FilterSelection::all(&reloaded)).kpis,
        build_dashboard(&ds, &FilterSelection::all(&ds)).kpis
    );
}

#[test]
fn oversized_counts_are_skipped_before_aggregation() {
    let csv = format!(
        "dispatching_base_number,date,active_vehicles,trips\n\
         B1,1/1/2015,1,{}\n\
         B1,1/2/2015,1,1\n\
         B1,1/3/2015,{MAX_COUNT},{MAX_COUNT}\n\
         B1,1/4/2015,{MAX_COUNT},{MAX_COUNT}\n",
        u64::MAX
    );
    let ds = parse_trips(csv.as_bytes()).unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.row_errors.len(), 1);
    assert_eq!(ds.row_errors[0].line, 2);

    let dashboard = build_dashboard(&ds, &FilterSelection::all(&ds));
    assert_eq!(dashboard.kpis.total_trips, 2 * MAX_COUNT + 1);
    assert_eq!(dashboard.kpis.total_vehicles, 2 * MAX_COUNT + 1);
    assert_eq!(dashboard.kpis.peak_daily_trips, MAX_COUNT);
}
