//! Formatted terminal output for `trips report`.
//!
//! We keep formatting code in one place so:
//! - the aggregation code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::Dashboard;
use crate::domain::{WEEKDAYS, weekday_name};
use crate::report::{Insights, TrendDirection};

/// KPI cards plus the growth delta on total trips.
pub fn format_kpis(dashboard: &Dashboard) -> String {
    let k = &dashboard.kpis;
    let mut out = String::new();
    out.push_str(&format!(
        "Total Trips       {:>14}  ({})\n",
        thousands(k.total_trips),
        growth_label(dashboard.growth)
    ));
    out.push_str(&format!("Active Vehicles   {:>14}\n", thousands(k.total_vehicles)));
    out.push_str(&format!("Peak Daily Trips  {:>14}\n", thousands(k.peak_daily_trips)));
    out.push_str(&format!("Trips per Vehicle {:>14}\n", k.trips_per_vehicle));
    out
}

pub fn growth_label(growth: f64) -> String {
    format!("{growth:.1}% vs prev")
}

pub fn format_weekdays(dashboard: &Dashboard) -> String {
    let mut out = String::from("Trips by day:\n");
    if dashboard.weekdays.is_empty() {
        out.push_str("  (no data)\n");
        return out;
    }
    for &(day, trips) in &dashboard.weekdays {
        out.push_str(&format!("  {:<10} {:>12}\n", weekday_name(day), thousands(trips)));
    }
    out
}

/// Base x weekday table; pairs without rows print `-`.
pub fn format_pivot(dashboard: &Dashboard) -> String {
    let pivot = &dashboard.pivot;
    let mut out = String::from("Base performance:\n");
    if pivot.bases.is_empty() {
        out.push_str("  (no data)\n");
        return out;
    }

    let mut header = format!("  {:<8}", "base");
    for day in WEEKDAYS {
        header.push_str(&format!(" {:>9}", &weekday_name(day)[..3]));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    for (base, row) in pivot.bases.iter().zip(&pivot.cells) {
        let mut line = format!("  {:<8}", truncate(base, 8));
        for cell in row {
            let txt = cell.map(thousands).unwrap_or_else(|| "-".to_string());
            line.push_str(&format!(" {txt:>9}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

pub fn format_forecast(dashboard: &Dashboard) -> String {
    let mut out = String::from("7 day forecast:\n");
    match &dashboard.forecast {
        Ok(fc) => {
            for p in &fc.points {
                out.push_str(&format!("  {}  {:>12.0}\n", p.date, p.trips));
            }
            out.push_str(&format!(
                "  trend: {:+.1} trips/day (intercept {:.1})\n",
                fc.fit.slope, fc.fit.intercept
            ));
        }
        Err(err) => {
            out.push_str(&format!("  unavailable: {err}\n"));
        }
    }
    out
}

pub fn format_spikes(dashboard: &Dashboard) -> String {
    let spikes = &dashboard.spikes;
    let mut out = String::from("Trip spikes:\n");
    match spikes.threshold {
        Some(t) => out.push_str(&format!("  threshold: {t:.1} trips/day (mean + 2 sd)\n")),
        None => out.push_str("  threshold: n/a (fewer than 2 days)\n"),
    }
    if spikes.days.is_empty() {
        out.push_str("  none\n");
    }
    for p in &spikes.days {
        out.push_str(&format!("  {}  {:>12}\n", p.date, thousands(p.trips)));
    }
    out
}

/// Insight bullets; statements that can't be computed are left out.
pub fn insight_lines(insights: &Insights) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(day) = insights.best_day {
        lines.push(format!("Highest demand occurs on {}", weekday_name(day)));
    }
    if let Some(day) = insights.worst_day {
        lines.push(format!("Lowest demand occurs on {}", weekday_name(day)));
    }
    if let Some(base) = &insights.peak_base {
        lines.push(format!("Top performing dispatch base: {base}"));
    }
    if let Some(r) = insights.vehicle_correlation {
        lines.push(format!(
            "{} correlation between vehicles & trips (r = {r:.2})",
            correlation_strength(r)
        ));
    }
    if let Some(trend) = insights.trend {
        lines.push(
            match trend {
                TrendDirection::Rising => "Demand trend indicates steady growth",
                TrendDirection::Falling => "Demand trend indicates a decline",
                TrendDirection::Flat => "Demand trend is flat",
            }
            .to_string(),
        );
    }
    lines
}

fn correlation_strength(r: f64) -> &'static str {
    let positive = r >= 0.0;
    if r.abs() >= 0.7 {
        if positive { "Strong positive" } else { "Strong negative" }
    } else if r.abs() >= 0.3 {
        if positive { "Moderate positive" } else { "Moderate negative" }
    } else {
        "Weak"
    }
}

/// The full plain-text report.
pub fn format_report(dashboard: &Dashboard) -> String {
    let mut out = String::from("=== Trip Analytics ===\n");
    out.push_str(&format!("Rows: {} | days: {}\n\n", dashboard.rows, dashboard.daily.len()));
    out.push_str(&format_kpis(dashboard));
    out.push('\n');
    out.push_str(&format_weekdays(dashboard));
    out.push('\n');
    out.push_str(&format_pivot(dashboard));
    out.push('\n');
    out.push_str(&format_forecast(dashboard));
    out.push('\n');
    out.push_str(&format_spikes(dashboard));
    out.push('\n');
    out.push_str("Key insights:\n");
    let lines = insight_lines(&dashboard.insights);
    if lines.is_empty() {
        out.push_str("  (no data)\n");
    }
    for line in lines {
        out.push_str(&format!("  - {line}\n"));
    }
    out
}

/// `1234567` -> `1,234,567`.
pub fn thousands(v: u64) -> String {
    let digits = v.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
