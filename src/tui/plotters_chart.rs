//! Plotters-powered line/scatter widget for Ratatui.
//!
//! Renders any `XyChart` description: trend, vehicles-vs-trips, forecast and
//! spike views all go through this one widget.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::chart::{AxisKind, Rgb, SeriesStyle, XyChart, x_to_date};

/// Render-only view over a chart description and its precomputed bounds.
pub struct XyChartWidget<'a> {
    pub chart: &'a XyChart,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl<'a> Widget for XyChartWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out a chart in a tiny area; show a hint instead.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let chart_spec = self.chart;

        // `plotters-ratatui-backend` draws Plotters primitives onto a Ratatui
        // `Canvas`; `widget_fn` hides its backend types from this module.
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                // A one-cell margin keeps the axes off the block border.
                .margin(1)
                // Terminal cells are coarse, so label areas stay narrow.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Axes and tick labels only. Mesh lines turn into noise at
            // terminal resolution.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(chart_spec.x_label.as_str())
                .y_desc(chart_spec.y_label.as_str())
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| fmt_x(chart_spec.x_axis, *v))
                .y_label_formatter(&|v| fmt_y(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // Series are drawn in declaration order, so later ones (forecast,
            // spike markers) sit on top of the base trips line.
            for series in &chart_spec.series {
                let color = plotters_color(series.color);
                let points = series.points.iter().copied();

                // 1) Shaded area under the trend line.
                if series.fill {
                    chart.draw_series(AreaSeries::new(points.clone(), 0.0, color.mix(0.25)))?;
                }

                // 2) The line itself. Terminal cells are too coarse for a dash
                // pattern; dashed series get pixel markers on top instead.
                if matches!(series.style, SeriesStyle::Line | SeriesStyle::LineMarkers) {
                    chart.draw_series(LineSeries::new(points.clone(), &color))?;
                }

                // 3) Markers. `Circle` radii come out far too large through the
                // ratatui backend (pixel radius read as canvas units), so a
                // coloured `Pixel` stands in for a dot.
                if matches!(series.style, SeriesStyle::Markers | SeriesStyle::LineMarkers) || series.dashed {
                    chart.draw_series(points.map(|(x, y)| Pixel::new((x, y), color)))?;
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

fn plotters_color(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

/// Tick label for an x value; date axes print `MM-DD`.
pub fn fmt_x(kind: AxisKind, v: f64) -> String {
    match kind {
        AxisKind::Date => x_to_date(v)
            .map(|d| d.format("%m-%d").to_string())
            .unwrap_or_default(),
        AxisKind::Linear => format!("{v:.0}"),
    }
}

pub fn fmt_y(v: f64) -> String {
    format!("{v:.0}")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::chart::date_to_x;

    #[test]
    fn date_ticks_print_month_and_day() {
        let x = date_to_x(NaiveDate::from_ymd_opt(2015, 2, 7).unwrap());
        assert_eq!(fmt_x(AxisKind::Date, x), "02-07");
        assert_eq!(fmt_x(AxisKind::Linear, 12.4), "12");
        assert_eq!(fmt_x(AxisKind::Date, f64::NAN), "");
    }
}
