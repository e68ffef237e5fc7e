//! Ratatui-based terminal dashboard.
//!
//! Left: the owner's crops. Right: the selected crop's prediction with tips,
//! and a chart of the history behind it (per-acre samples by planting month,
//! the fitted trend, and the seasonal baseline).

use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Terminal,
};

use crate::app::pipeline::{predict_all, CropPrediction};
use crate::config::AppConfig;
use crate::domain::{profile_for, YieldCategory};
use crate::error::AppError;
use crate::fit::{fit_month_model, prepare_observations, YieldEstimator};
use crate::models::{predict, seasonal_baseline};

mod plotters_chart;

use plotters_chart::YieldChart;

/// Export target for the `e` key, relative to the working directory.
const EXPORT_PATH: &str = "farm-predictions.csv";

/// Start the dashboard.
pub fn run(config: &AppConfig) -> Result<(), AppError> {
    let mut app = App::new(config.clone());
    app.reload();

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

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

struct App {
    config: AppConfig,
    estimator: YieldEstimator,
    predictions: Vec<CropPrediction>,
    selected: usize,
    status: String,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            estimator: YieldEstimator::default(),
            predictions: Vec::new(),
            selected: 0,
            status: String::new(),
        }
    }

    /// Re-read the store and recompute every prediction.
    ///
    /// Failures land in the status line; the dashboard keeps running.
    fn reload(&mut self) {
        let loaded = self
            .config
            .open_store()
            .and_then(|store| predict_all(&store, self.config.user, &self.estimator));

        match loaded {
            Ok(predictions) => {
                self.status = format!("Loaded {} crop(s).", predictions.len());
                self.predictions = predictions;
            }
            Err(err) if err.exit_code() == 3 => {
                self.predictions.clear();
                self.status = "No crops yet. Add some with `farm crop add` or `farm seed`.".to_string();
            }
            Err(err) => {
                self.predictions.clear();
                self.status = err.to_string();
            }
        }
        self.selected = self.selected.min(self.predictions.len().saturating_sub(1));
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

    /// Returns `true` when the dashboard should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected + 1 < self.predictions.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
        false
    }

    fn export(&mut self) {
        if self.predictions.is_empty() {
            self.status = "Nothing to export.".to_string();
            return;
        }
        self.status = match crate::io::export::export_predictions(Path::new(EXPORT_PATH), &self.predictions) {
            Ok(()) => format!("Wrote {} prediction(s) to {EXPORT_PATH}.", self.predictions.len()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn current(&self) -> Option<&CropPrediction> {
        self.predictions.get(self.selected)
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let line = Line::from(vec![
            Span::styled("farm", Style::default().fg(Color::Cyan)),
            Span::raw(" yield dashboard"),
            Span::styled(
                format!(
                    " | user {} | store {} | crops: {}",
                    self.config.user,
                    self.config.store_path.display(),
                    self.predictions.len()
                ),
                Style::default().fg(Color::Gray),
            ),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(32), Constraint::Min(0)])
            .split(area);
        self.draw_crop_list(frame, columns[0]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(11), Constraint::Min(0)])
            .split(columns[1]);
        self.draw_prediction(frame, right[0]);
        self.draw_chart(frame, right[1]);
    }

    fn draw_crop_list(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .predictions
            .iter()
            .map(|p| {
                ListItem::new(format!(
                    "#{:<4} {:<12} {}",
                    p.crop.id,
                    crate::report::truncate(&p.crop.name, 12),
                    p.crop.planting_date
                ))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Crops").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        if !self.predictions.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_prediction(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Prediction").borders(Borders::ALL);
        let Some(p) = self.current() else {
            frame.render_widget(Paragraph::new("Select a crop.").block(block), area);
            return;
        };
        let r = &p.result;

        let gray = Style::default().fg(Color::Gray);
        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    format!("{:.1} kg", r.predicted_yield),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    "  ({:.1} kg/acre on {:.2} acres)",
                    r.predicted_yield_per_area, r.area
                )),
            ]),
            Line::from(vec![
                Span::raw("category: "),
                Span::styled(
                    r.yield_category.display_name(),
                    Style::default().fg(category_color(r.yield_category)),
                ),
                Span::styled(
                    format!(
                        " | season: {} | confidence: {} | n={}{}",
                        r.season.display_name(),
                        r.confidence.display_name(),
                        r.training_points,
                        if r.used_regression_model { "" } else { " (baseline only)" }
                    ),
                    gray,
                ),
            ]),
            Line::from(Span::styled(
                format!("baseline: {:.1} kg/acre", r.baseline_yield_per_area),
                gray,
            )),
            Line::raw(""),
        ];
        lines.extend(r.tips.iter().map(|t| Line::raw(format!("• {t}"))));

        let p = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title("History by planting month (white) · trend (cyan) · baseline (yellow)")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(p) = self.current() else {
            let msg = Paragraph::new("No data.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let series = chart_series(p, &self.estimator);
        let (chart_rect, insets) = chart_layout(inner);
        let widget = YieldChart {
            observations: &series.observations,
            fitted: &series.fitted,
            baseline: &series.baseline,
            target: Some(series.target),
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: "month",
            y_label: "kg/acre",
            fmt_x: fmt_axis_month,
            fmt_y: fmt_axis_kg,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, series.x_bounds, series.y_bounds);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  r reload  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn category_color(category: YieldCategory) -> Color {
    match category {
        YieldCategory::Low => Color::Red,
        YieldCategory::Medium => Color::Yellow,
        YieldCategory::High => Color::Green,
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ChartSeries {
    observations: Vec<(f64, f64)>,
    fitted: Vec<(f64, f64)>,
    baseline: Vec<(f64, f64)>,
    target: (f64, f64),
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build chart series for one prediction.
///
/// Samples and the trend are recomputed from the stored history with the same
/// preparation the estimator uses.
fn chart_series(p: &CropPrediction, estimator: &YieldEstimator) -> ChartSeries {
    let profile = profile_for(&p.result.crop_name);
    let samples = prepare_observations(&p.history, &profile);

    let observations: Vec<(f64, f64)> = samples
        .iter()
        .map(|s| (s.month as f64, s.yield_per_area))
        .collect();

    let fitted: Vec<(f64, f64)> = fit_month_model(&samples, estimator.ridge_lambda())
        .map(|model| (1..=12).map(|m| (m as f64, predict(&model, m))).collect())
        .unwrap_or_default();

    let baseline: Vec<(f64, f64)> = (1..=12)
        .map(|m| (m as f64, seasonal_baseline(&profile, m)))
        .collect();

    let target = (p.result.month as f64, p.result.predicted_yield_per_area);

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in observations
        .iter()
        .chain(&fitted)
        .chain(&baseline)
        .chain(std::iter::once(&target))
    {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = profile.min;
        y_max = profile.max;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1.0);

    ChartSeries {
        observations,
        fitted,
        baseline,
        target,
        x_bounds: [0.5, 12.5],
        y_bounds: [(y_min - pad).max(0.0), y_max + pad],
    }
}

fn fmt_axis_month(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_kg(v: f64) -> String {
    format!("{v:.0}")
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
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

/// Month ticks along the bottom, kg/acre ticks on the left.
fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let style = Style::default().fg(Color::Gray);
    let y = chart.y + chart.height;

    if y < inner.y + inner.height - 1 {
        for month in 1..=12u32 {
            let u = (month as f64 - x_bounds[0]) / (x_bounds[1] - x_bounds[0]);
            let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
            let label = month.to_string();
            let start = x.saturating_sub((label.len() / 2) as u16);
            frame.render_widget(
                Paragraph::new(label.clone()).style(style),
                Rect {
                    x: start,
                    y,
                    width: label.len() as u16,
                    height: 1,
                },
            );
        }
    }

    let ticks = 5usize;
    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.0}");
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label.clone()).style(style),
            Rect {
                x: start,
                y,
                width: label.len() as u16,
                height: 1,
            },
        );
    }

    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        let x_label = Paragraph::new("planting month")
            .alignment(Alignment::Center)
            .style(style);
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("kg/acre").style(style.add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
