//! Declarative chart descriptions.
//!
//! Each builder turns already-computed data into a plain `ChartSpec` value:
//! series, colours and axis kinds, but no drawing. The TUI renders these
//! through Plotters/Ratatui and `trips charts` writes them out as JSON, so
//! neither front-end owns any computation.

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::anomaly::Spikes;
use crate::app::pipeline::Dashboard;
use crate::domain::{DailyTotal, WEEKDAYS, weekday_name};
use crate::forecast::Forecast;
use crate::math::LinearFit;
use crate::report::{BaseDayPivot, WeekdayTotals};

/// An sRGB colour, serialized as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

pub const PRIMARY_BLUE: Rgb = Rgb(0x1D, 0x4E, 0xD8);
pub const MID_BLUE: Rgb = Rgb(0x3B, 0x82, 0xF6);
pub const LIGHT_BLUE: Rgb = Rgb(0x93, 0xC5, 0xFD);
pub const PALE_BLUE: Rgb = Rgb(0xDB, 0xEA, 0xFE);
pub const ACCENT_ORANGE: Rgb = Rgb(0xF5, 0x9E, 0x0B);
pub const FORECAST_GREEN: Rgb = Rgb(0x16, 0xA3, 0x4A);
pub const SPIKE_RED: Rgb = Rgb(0xFF, 0x00, 0x00);

/// Low-to-high colour ramp for bar and heatmap intensity.
pub const BLUES: [Rgb; 4] = [PALE_BLUE, LIGHT_BLUE, MID_BLUE, PRIMARY_BLUE];

/// Linear interpolation along a colour ramp; `t` is clamped to `[0, 1]`.
pub fn ramp(scale: &[Rgb], t: f64) -> Rgb {
    match scale {
        [] => Rgb(0, 0, 0),
        [only] => *only,
        _ => {
            let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
            let pos = t * (scale.len() - 1) as f64;
            let i = (pos.floor() as usize).min(scale.len() - 2);
            let f = pos - i as f64;
            let (a, b) = (scale[i], scale[i + 1]);
            let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
            Rgb(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
        }
    }
}

/// How x values should be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisKind {
    /// x is a day number (`NaiveDate::num_days_from_ce`).
    Date,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesStyle {
    Line,
    Markers,
    LineMarkers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub color: Rgb,
    pub style: SeriesStyle,
    pub dashed: bool,
    /// Shade the area under a line down to zero.
    pub fill: bool,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    fn line(name: &str, color: Rgb, points: Vec<(f64, f64)>) -> Self {
        Self {
            name: name.to_string(),
            color,
            style: SeriesStyle::Line,
            dashed: false,
            fill: false,
            points,
        }
    }

    fn markers(name: &str, color: Rgb, points: Vec<(f64, f64)>) -> Self {
        Self {
            style: SeriesStyle::Markers,
            ..Self::line(name, color, points)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XyChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_axis: AxisKind,
    pub series: Vec<Series>,
}

impl XyChart {
    /// Padded data bounds `([x0, x1], [y0, y1])`; `None` when there are no points.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let (mut x0, mut x1) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut y0, mut y1) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(x, y) in self.series.iter().flat_map(|s| s.points.iter()) {
            x0 = x0.min(x);
            x1 = x1.max(x);
            y0 = y0.min(y);
            y1 = y1.max(y);
        }
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) {
            return None;
        }
        if x1 <= x0 {
            x0 -= 1.0;
            x1 += 1.0;
        }
        if y1 <= y0 {
            y0 -= 1.0;
            y1 += 1.0;
        }
        let pad = (y1 - y0) * 0.05;
        Some(([x0, x1], [y0 - pad, y1 + pad]))
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
    /// Bars are coloured by value along this ramp.
    pub color_scale: Vec<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapChart {
    pub title: String,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<Option<u64>>>,
    pub color_scale: Vec<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Xy(XyChart),
    Bar(BarChart),
    Heatmap(HeatmapChart),
}

pub fn date_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

fn daily_points(series: &[DailyTotal]) -> Vec<(f64, f64)> {
    series
        .iter()
        .map(|p| (date_to_x(p.date), p.trips as f64))
        .collect()
}

/// Daily trip totals as a filled line.
pub fn trend_chart(series: &[DailyTotal]) -> XyChart {
    let mut line = Series::line("Trips", PRIMARY_BLUE, daily_points(series));
    line.fill = true;
    XyChart {
        title: "Trip Demand Trend".to_string(),
        x_label: "date".to_string(),
        y_label: "trips".to_string(),
        x_axis: AxisKind::Date,
        series: vec![line],
    }
}

/// Per-row vehicles vs trips with the OLS trend overlaid.
pub fn scatter_chart(points: &[(f64, f64)], trend: Option<&LinearFit>) -> XyChart {
    let mut series = vec![Series::markers("Rows", PRIMARY_BLUE, points.to_vec())];

    if let Some(fit) = trend {
        let (lo, hi) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(x, _)| {
                (lo.min(x), hi.max(x))
            });
        if lo.is_finite() && hi.is_finite() {
            series.push(Series::line(
                "OLS trend",
                ACCENT_ORANGE,
                vec![(lo, fit.predict(lo)), (hi, fit.predict(hi))],
            ));
        }
    }

    XyChart {
        title: "Vehicles vs Trips".to_string(),
        x_label: "active vehicles".to_string(),
        y_label: "trips".to_string(),
        x_axis: AxisKind::Linear,
        series,
    }
}

pub fn weekday_chart(totals: &WeekdayTotals) -> BarChart {
    BarChart {
        title: "Trips by Day".to_string(),
        x_label: "day".to_string(),
        y_label: "trips".to_string(),
        bars: totals
            .iter()
            .map(|&(day, value)| Bar {
                label: weekday_name(day).to_string(),
                value,
            })
            .collect(),
        color_scale: BLUES.to_vec(),
    }
}

/// Actual series followed by a dashed forecast continuation.
pub fn forecast_chart(series: &[DailyTotal], forecast: Option<&Forecast>) -> XyChart {
    let mut out = vec![Series::line("Actual", PRIMARY_BLUE, daily_points(series))];
    if let Some(fc) = forecast {
        out.push(Series {
            style: SeriesStyle::LineMarkers,
            dashed: true,
            ..Series::line(
                "Forecast",
                FORECAST_GREEN,
                fc.points.iter().map(|p| (date_to_x(p.date), p.trips)).collect(),
            )
        });
    }
    XyChart {
        title: "7 Day Forecast".to_string(),
        x_label: "date".to_string(),
        y_label: "trips".to_string(),
        x_axis: AxisKind::Date,
        series: out,
    }
}

pub fn heatmap_chart(pivot: &BaseDayPivot) -> HeatmapChart {
    HeatmapChart {
        title: "Base Performance Heatmap".to_string(),
        rows: pivot.bases.clone(),
        columns: WEEKDAYS.iter().map(|d| weekday_name(*d).to_string()).collect(),
        cells: pivot.cells.iter().map(|row| row.to_vec()).collect(),
        color_scale: BLUES.to_vec(),
    }
}

/// Daily line with spike days marked.
pub fn anomaly_chart(series: &[DailyTotal], spikes: &Spikes) -> XyChart {
    XyChart {
        title: "Trip Spike Detection".to_string(),
        x_label: "date".to_string(),
        y_label: "trips".to_string(),
        x_axis: AxisKind::Date,
        series: vec![
            Series::line("Trips", PRIMARY_BLUE, daily_points(series)),
            Series::markers("Spike", SPIKE_RED, daily_points(&spikes.days)),
        ],
    }
}

/// Every chart on the dashboard, in display order.
pub fn dashboard_charts(dashboard: &Dashboard) -> Vec<ChartSpec> {
    vec![
        ChartSpec::Xy(trend_chart(&dashboard.daily)),
        ChartSpec::Xy(scatter_chart(&dashboard.scatter, dashboard.vehicle_trend.as_ref())),
        ChartSpec::Bar(weekday_chart(&dashboard.weekdays)),
        ChartSpec::Xy(forecast_chart(&dashboard.daily, dashboard.forecast.as_ref().ok())),
        ChartSpec::Heatmap(heatmap_chart(&dashboard.pivot)),
        ChartSpec::Xy(anomaly_chart(&dashboard.daily, &dashboard.spikes)),
    ]
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2015, 1, day).unwrap()
    }

    #[test]
    fn dates_survive_the_axis_encoding() {
        let date = d(17);
        assert_eq!(x_to_date(date_to_x(date)), Some(date));
        assert_eq!(x_to_date(f64::NAN), None);
    }

    #[test]
    fn ramp_hits_endpoints_and_clamps() {
        assert_eq!(ramp(&BLUES, 0.0), PALE_BLUE);
        assert_eq!(ramp(&BLUES, 1.0), PRIMARY_BLUE);
        assert_eq!(ramp(&BLUES, 7.0), PRIMARY_BLUE);
        assert_eq!(ramp(&BLUES, -1.0), PALE_BLUE);
        assert_eq!(ramp(&[SPIKE_RED], 0.4), SPIKE_RED);
    }

    #[test]
    fn colours_serialize_as_hex() {
        assert_eq!(serde_json::to_string(&PRIMARY_BLUE).unwrap(), "\"#1D4ED8\"");
    }

    #[test]
    fn scatter_trend_spans_observed_vehicles() {
        let points = vec![(1.0, 10.0), (4.0, 40.0)];
        let fit = LinearFit { intercept: 0.0, slope: 10.0 };
        let chart = scatter_chart(&points, Some(&fit));
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[1].points, vec![(1.0, 10.0), (4.0, 40.0)]);

        let bare = scatter_chart(&points, None);
        assert_eq!(bare.series.len(), 1);
    }

    #[test]
    fn heatmap_keeps_missing_cells() {
        let pivot = BaseDayPivot {
            bases: vec!["B1".to_string()],
            cells: vec![[Some(3), None, None, None, None, None, Some(9)]],
        };
        let chart = heatmap_chart(&pivot);
        assert_eq!(chart.columns.first().map(String::as_str), Some("Monday"));
        assert_eq!(chart.columns.len(), 7);
        assert_eq!(chart.cells[0][1], None);
        assert_eq!(chart.cells[0][6], Some(9));
    }

    #[test]
    fn bounds_pad_flat_series() {
        let series = vec![DailyTotal { date: d(1), trips: 5 }];
        let chart = trend_chart(&series);
        let (x, y) = chart.bounds().unwrap();
        assert!(x[0] < x[1]);
        assert!(y[0] < 5.0 && y[1] > 5.0);
        assert!(trend_chart(&[]).bounds().is_none());
        assert!(trend_chart(&[]).is_empty());
    }

    #[test]
    fn weekday_bars_use_full_names() {
        let chart = weekday_chart(&vec![(Weekday::Mon, 3), (Weekday::Sun, 1)]);
        let labels: Vec<&str> = chart.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Monday", "Sunday"]);
    }
}
