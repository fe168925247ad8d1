//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Glyphs:
//! - solid line series: `-`
//! - dashed line series: `.`
//! - points on a line-with-markers series: `+`
//! - marker-only series: `o` when it is the chart's first series, else `!`

use crate::chart::{AxisKind, SeriesStyle, XyChart, x_to_date};

/// Render an x/y chart spec into a `width` x `height` character grid.
pub fn render_ascii_chart(chart: &XyChart, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mut out = format!("{}\n", chart.title);
    let Some(([x_min, x_max], [y_min, y_max])) = chart.bounds() else {
        out.push_str("(no data)\n");
        return out;
    };

    let mut grid = vec![vec![' '; width]; height];

    // Lines first so markers overlay them.
    for series in chart.series.iter().filter(|s| s.style != SeriesStyle::Markers) {
        let ch = if series.dashed { '.' } else { '-' };
        let mut prev = None;
        for &(x, y) in &series.points {
            let cell = (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height));
            match prev {
                Some((x0, y0)) => draw_line(&mut grid, x0, y0, cell.0, cell.1, ch),
                None => grid[cell.1][cell.0] = ch,
            }
            prev = Some(cell);
        }
    }

    for (idx, series) in chart.series.iter().enumerate() {
        let ch = match series.style {
            SeriesStyle::Line => continue,
            SeriesStyle::LineMarkers => '+',
            SeriesStyle::Markers if idx == 0 => 'o',
            SeriesStyle::Markers => '!',
        };
        for &(x, y) in &series.points {
            grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = ch;
        }
    }

    out.push_str(&format!(
        "x=[{}, {}] {} | y=[{y_min:.1}, {y_max:.1}] {}\n",
        fmt_x(x_min, chart.x_axis),
        fmt_x(x_max, chart.x_axis),
        chart.x_label,
        chart.y_label,
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

fn fmt_x(x: f64, axis: AxisKind) -> String {
    match axis {
        AxisKind::Date => x_to_date(x)
            .map(|d| d.to_string())
            .unwrap_or_else(|| format!("{x:.0}")),
        AxisKind::Linear => format!("{x:.1}"),
    }
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
