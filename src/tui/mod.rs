//! Ratatui-based terminal dashboard.
//!
//! A sidebar of month and base toggles drives the filter; the header shows the
//! KPI cards, the main panel switches between chart tabs and the bottom panel
//! lists the insights. Every toggle reruns the pipeline on the cached dataset.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Month;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Bar as BarItem, BarChart as BarWidget, BarGroup, Block, Borders, Cell, Clear, List, ListItem, ListState,
        Paragraph, Row, Table, Tabs,
    },
};
use tracing::debug;

use crate::app::pipeline::{Dashboard, build_dashboard};
use crate::chart::{self, BarChart, HeatmapChart, Rgb, XyChart};
use crate::domain::{Dataset, DashboardConfig, FilterSelection};
use crate::error::AppError;
use crate::io::{EXPORT_FILE_NAME, EXPORT_MIME, write_filtered_csv};
use crate::report::{growth_label, insight_lines, thousands};

mod plotters_chart;

use plotters_chart::{XyChartWidget, fmt_x, fmt_y};

const TABS: [&str; 6] = ["Trend", "Vehicles vs Trips", "Weekday", "Forecast", "Heatmap", "Spikes"];

/// Start the TUI.
pub fn run(dataset: Arc<Dataset>, config: &DashboardConfig) -> Result<(), AppError> {
    let selection = config.selection(&dataset);
    let mut app = App::new(dataset, selection);

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// One selectable sidebar row.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Toggle {
    Month(Month),
    Base(String),
}

struct App {
    dataset: Arc<Dataset>,
    months: Vec<Month>,
    bases: Vec<String>,
    selection: FilterSelection,
    cursor: usize,
    tab: usize,
    status: String,
    dashboard: Dashboard,
}

impl App {
    fn new(dataset: Arc<Dataset>, selection: FilterSelection) -> Self {
        let dashboard = build_dashboard(&dataset, &selection);
        let status = format!("Loaded {} row(s).", dataset.len());
        Self {
            months: dataset.months(),
            bases: dataset.bases(),
            dataset,
            selection,
            cursor: 0,
            tab: 0,
            status,
            dashboard,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.tab = (self.tab + 1) % TABS.len(),
            KeyCode::BackTab => self.tab = (self.tab + TABS.len() - 1) % TABS.len(),
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.cursor + 1 < self.toggle_count() {
                    self.cursor += 1;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current(),
            KeyCode::Char('a') => self.toggle_group(),
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
        false
    }

    fn toggle_count(&self) -> usize {
        self.months.len() + self.bases.len()
    }

    fn toggle_at(&self, index: usize) -> Option<Toggle> {
        if let Some(m) = self.months.get(index) {
            return Some(Toggle::Month(*m));
        }
        self.bases
            .get(index - self.months.len())
            .map(|b| Toggle::Base(b.clone()))
    }

    fn is_selected(&self, toggle: &Toggle) -> bool {
        match toggle {
            Toggle::Month(m) => self.selection.months.contains(m),
            Toggle::Base(b) => self.selection.bases.contains(b),
        }
    }

    fn toggle_current(&mut self) {
        let Some(toggle) = self.toggle_at(self.cursor) else {
            return;
        };
        match toggle {
            Toggle::Month(m) => {
                if !self.selection.months.remove(&m) {
                    self.selection.months.insert(m);
                }
            }
            Toggle::Base(b) => {
                if !self.selection.bases.remove(&b) {
                    self.selection.bases.insert(b);
                }
            }
        }
        self.refresh();
    }

    /// Select every entry of the cursor's group, or clear it if all are already on.
    fn toggle_group(&mut self) {
        if self.cursor < self.months.len() {
            if self.months.iter().all(|m| self.selection.months.contains(m)) {
                self.selection.months.clear();
            } else {
                self.selection.months.extend(self.months.iter().copied());
            }
        } else if self.bases.iter().all(|b| self.selection.bases.contains(b)) {
            self.selection.bases.clear();
        } else {
            self.selection.bases.extend(self.bases.iter().cloned());
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        self.dashboard = build_dashboard(&self.dataset, &self.selection);
        self.status = format!("{} row(s) selected.", self.dashboard.rows);
    }

    fn export(&mut self) {
        self.export_to(Path::new(EXPORT_FILE_NAME));
    }

    /// Reports through the status line; logging stays at `debug` while the
    /// alternate screen is up.
    fn export_to(&mut self, path: &Path) {
        let view = crate::filter::filter(&self.dataset, &self.selection);
        match write_filtered_csv(path, &view) {
            Ok(rows) => {
                debug!(rows, "tui export");
                self.status = format!("Exported {rows} row(s) to {} ({EXPORT_MIME})", path.display());
            }
            Err(err) => {
                debug!(%err, "tui export failed");
                self.status = format!("Export failed: {err}");
            }
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    /// KPI cards. Growth rides on the trips card, green for gains and red
    /// for losses against the complement months.
    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let k = &self.dashboard.kpis;
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(area);

        let growth_color = if self.dashboard.growth >= 0.0 { Color::Green } else { Color::Red };
        let value_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

        let total = Paragraph::new(vec![
            Line::from(Span::styled(thousands(k.total_trips), value_style)),
            Line::from(Span::styled(growth_label(self.dashboard.growth), Style::default().fg(growth_color))),
        ]);
        let rest = [
            ("Active Vehicles", thousands(k.total_vehicles)),
            ("Peak Daily Trips", thousands(k.peak_daily_trips)),
            ("Trips per Vehicle", format!("{}", k.trips_per_vehicle)),
        ];

        frame.render_widget(total.block(card_block("Total Trips")), cards[0]);
        for (rect, (title, value)) in cards.iter().skip(1).zip(rest) {
            let p = Paragraph::new(Line::from(Span::styled(value, value_style))).block(card_block(title));
            frame.render_widget(p, *rect);
        }
    }

    /// Sidebar on the left; tabs, the active chart and insights stacked on the right.
    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        // 26 columns fit "» [x] September" and a six-character base id.
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(26), Constraint::Min(0)])
            .split(area);
        self.draw_sidebar(frame, columns[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(8)])
            .split(columns[1]);

        let tabs = Tabs::new(TABS.to_vec())
            .select(self.tab)
            .block(Block::default().borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, rows[0]);

        self.draw_chart(frame, rows[1]);
        self.draw_insights(frame, rows[2]);
    }

    fn draw_sidebar(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = (0..self.toggle_count())
            .filter_map(|i| self.toggle_at(i))
            .map(|t| {
                let mark = if self.is_selected(&t) { "[x]" } else { "[ ]" };
                let label = match &t {
                    Toggle::Month(m) => format!("{mark} {}", m.name()),
                    Toggle::Base(b) => format!("{mark} {b}"),
                };
                let color = match t {
                    Toggle::Month(_) => Color::Cyan,
                    Toggle::Base(_) => Color::Gray,
                };
                ListItem::new(label).style(Style::default().fg(color))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Months / Bases").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        // Months and bases share one cursor: months come first, bases follow.
        let mut state = ListState::default();
        if self.toggle_count() > 0 {
            state.select(Some(self.cursor));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let d = &self.dashboard;
        let block = Block::default().title(TABS[self.tab]).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        // Canvas output from the previous tab can linger without an explicit clear.
        frame.render_widget(Clear, inner);

        // Chart specs are rebuilt from the dashboard on every frame.
        match self.tab {
            0 => draw_xy(frame, inner, &chart::trend_chart(&d.daily)),
            1 => draw_xy(frame, inner, &chart::scatter_chart(&d.scatter, d.vehicle_trend.as_ref())),
            2 => draw_bars(frame, inner, &chart::weekday_chart(&d.weekdays)),
            // An empty or single-day view has no forecast; say so instead of
            // drawing the actual series alone.
            3 => match &d.forecast {
                Ok(fc) => draw_xy(frame, inner, &chart::forecast_chart(&d.daily, Some(fc))),
                Err(err) => draw_message(frame, inner, &format!("Not enough data to forecast. {err}.")),
            },
            4 => draw_heatmap(frame, inner, &chart::heatmap_chart(&d.pivot)),
            _ => {
                draw_xy(frame, inner, &chart::anomaly_chart(&d.daily, &d.spikes));
                // Threshold note in the chart's top row, right-aligned.
                if let Some(t) = d.spikes.threshold {
                    let note = format!("threshold {t:.0} | {} spike day(s)", d.spikes.days.len());
                    let rect = Rect {
                        height: 1,
                        ..inner
                    };
                    frame.render_widget(
                        Paragraph::new(note)
                            .alignment(Alignment::Right)
                            .style(Style::default().fg(Color::Red)),
                        rect,
                    );
                }
            }
        }
    }

    fn draw_insights(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = insight_lines(&self.dashboard.insights);
        let items: Vec<ListItem> = if lines.is_empty() {
            vec![ListItem::new("No rows match the current selection.").style(Style::default().fg(Color::Yellow))]
        } else {
            lines.into_iter().map(|l| ListItem::new(format!("• {l}"))).collect()
        };
        let list = List::new(items).block(Block::default().title("Key Insights").borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  Space toggle  a all/none  Tab/Shift-Tab chart  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn card_block(title: &str) -> Block<'_> {
    Block::default()
        .title(Span::styled(title, Style::default().fg(Color::Gray)))
        .borders(Borders::ALL)
}

fn short_label(s: &str) -> String {
    s.chars().take(3).collect()
}

fn tui_color(c: Rgb) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

fn draw_message(frame: &mut ratatui::Frame<'_>, area: Rect, msg: &str) {
    let p = Paragraph::new(msg.to_string()).style(Style::default().fg(Color::Yellow));
    frame.render_widget(p, area);
}

fn draw_xy(frame: &mut ratatui::Frame<'_>, inner: Rect, chart: &XyChart) {
    let Some((x_bounds, y_bounds)) = chart.bounds() else {
        draw_message(frame, inner, "No data for the current selection.");
        return;
    };

    // Plotters draws inside the inset rect; tick labels go in the margins
    // around it, where Ratatui text renders crisper than canvas text.
    let (chart_rect, insets) = chart_layout(inner);
    frame.render_widget(
        XyChartWidget {
            chart,
            x_bounds,
            y_bounds,
        },
        chart_rect,
    );
    if let Some(insets) = insets {
        draw_axis_ticks(frame, inner, chart_rect, insets, chart, x_bounds, y_bounds);
    }
}

fn draw_bars(frame: &mut ratatui::Frame<'_>, area: Rect, chart: &BarChart) {
    if chart.bars.is_empty() {
        draw_message(frame, area, "No data for the current selection.");
        return;
    }
    // Bars are shaded along the blue ramp by their share of the busiest day.
    let max = chart.bars.iter().map(|b| b.value).max().unwrap_or(0).max(1);
    let bars: Vec<BarItem> = chart
        .bars
        .iter()
        .map(|b| {
            let color = tui_color(chart::ramp(&chart.color_scale, b.value as f64 / max as f64));
            BarItem::default()
                .value(b.value)
                .text_value(thousands(b.value))
                .label(Line::from(short_label(&b.label)))
                .style(Style::default().fg(color))
        })
        .collect();

    // Spread the bars over the pane, within readable limits.
    let width = (area.width / chart.bars.len().max(1) as u16).saturating_sub(1).clamp(3, 12);
    let widget = BarWidget::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(width)
        .bar_gap(1)
        .value_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
    frame.render_widget(widget, area);
}

fn draw_heatmap(frame: &mut ratatui::Frame<'_>, area: Rect, chart: &HeatmapChart) {
    if chart.rows.is_empty() {
        draw_message(frame, area, "No data for the current selection.");
        return;
    }
    let max = chart
        .cells
        .iter()
        .flatten()
        .flatten()
        .copied()
        .max()
        .unwrap_or(0)
        .max(1);

    let header = Row::new(
        std::iter::once(Cell::from("base")).chain(chart.columns.iter().map(|c| Cell::from(short_label(c)))),
    )
    .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));

    // Cell background follows the ramp; the text flips to white once the
    // background gets dark enough. Missing base/day pairs print `-`.
    let rows = chart.rows.iter().zip(&chart.cells).map(|(base, cells)| {
        let mut row = vec![Cell::from(base.clone())];
        for cell in cells {
            row.push(match cell {
                Some(v) => {
                    let t = *v as f64 / max as f64;
                    let bg = chart::ramp(&chart.color_scale, t);
                    let fg = if t > 0.5 { Color::White } else { Color::Black };
                    Cell::from(thousands(*v)).style(Style::default().bg(tui_color(bg)).fg(fg))
                }
                None => Cell::from("-").style(Style::default().fg(Color::DarkGray)),
            });
        }
        Row::new(row)
    });

    let mut widths = vec![Constraint::Length(9)];
    widths.extend(std::iter::repeat(Constraint::Length(9)).take(chart.columns.len()));
    let table = Table::new(rows, widths).header(header).column_spacing(1);
    frame.render_widget(table, area);
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

/// Reserve margins for tick labels; tiny panes get the whole area and no ticks.
fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    plot: Rect,
    insets: AxisInsets,
    chart: &XyChart,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    // X ticks: evenly spaced along the bottom edge, centred on their position.
    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = plot.x + ((plot.width - 1) as f64 * u).round() as u16;
        let label = fmt_x(chart.x_axis, x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = plot.y + plot.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    // Y ticks: right-aligned against the plot's left edge, bottom to top.
    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = plot.y + (plot.height - 1) - ((plot.height - 1) as f64 * u).round() as u16;
        let label = fmt_y(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    // Axis titles: x centred under the ticks, y in the top-left corner.
    let x_label = Paragraph::new(chart.x_label.clone())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: plot.x,
        y: plot.y + plot.height + 1,
        width: plot.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(chart.y_label.clone()).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
