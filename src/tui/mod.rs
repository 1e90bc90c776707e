//! Ratatui-based terminal UI.
//!
//! Shows a finished run (or a saved curve file): the overlay chart, the
//! parameter table and goodness of fit. Error bars and the ±σ band can be
//! toggled while viewing.

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::pipeline::RunOutput;
use crate::domain::{CurveFile, GridPoint, NamedMeasurement, Sample, Unit};
use crate::error::AppError;
use crate::math::Uncertain;
use crate::report::fmt_r_squared;

mod plotters_chart;

use plotters_chart::CatenaryPlottersChart;

/// Everything the TUI displays, detached from the pipeline types.
#[derive(Debug, Clone)]
pub struct TuiView {
    pub heading: String,
    pub formula: String,
    pub unit: Unit,
    pub params: Vec<String>,
    pub r_squared: Option<f64>,
    pub solver_note: Option<String>,
    pub samples: Vec<Sample>,
    pub grid: Vec<GridPoint>,
}

impl TuiView {
    pub fn from_run(run: &RunOutput) -> Self {
        Self {
            heading: format!("catenary {} - {}", run.kind.name(), run.model.kind.display_name()),
            formula: run.model.kind.formula().to_string(),
            unit: run.unit,
            params: run
                .model
                .kind
                .param_names()
                .iter()
                .zip(&run.model.params)
                .map(|(name, p)| format!("{name:<2} = {p}"))
                .collect(),
            r_squared: run.evaluation.quality.and_then(|q| q.r_squared),
            solver_note: run
                .solve
                .as_ref()
                .map(|s| format!("success={} nfev={} | {}", s.success, s.nfev, s.message)),
            samples: run.dataset.as_ref().map(|d| d.samples.clone()).unwrap_or_default(),
            grid: run.evaluation.grid.clone(),
        }
    }

    pub fn from_curve(curve: &CurveFile) -> Self {
        Self {
            heading: format!("{} {} (saved {})", curve.tool, curve.command, curve.generated_at.format("%Y-%m-%d %H:%M")),
            formula: curve.model.formula().to_string(),
            unit: curve.unit,
            params: curve.params.iter().map(fmt_named).collect(),
            r_squared: curve.quality.and_then(|q| q.r_squared),
            solver_note: None,
            samples: Vec::new(),
            grid: curve.grid.clone(),
        }
    }
}

fn fmt_named(p: &NamedMeasurement) -> String {
    // Re-wrap so saved values print in the same significant-digit form.
    format!("{:<2} = {}", p.name, Uncertain::new(p.value, p.std_dev))
}

/// Start the TUI.
pub fn run(view: TuiView) -> Result<(), AppError> {
    let mut session = TerminalSession::enter()?;
    App::new(view).event_loop(&mut session.terminal)
}

type CrosstermTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Raw mode plus the alternate screen for as long as the session lives.
struct TerminalSession {
    terminal: CrosstermTerminal,
}

impl TerminalSession {
    fn enter() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        let terminal = execute!(stdout, EnterAlternateScreen)
            .and_then(|()| Terminal::new(CrosstermBackend::new(stdout)));
        match terminal {
            Ok(terminal) => Ok(Self { terminal }),
            Err(e) => {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                let _ = disable_raw_mode();
                Err(AppError::runtime(format!("Failed to initialize terminal: {e}")))
            }
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

struct App {
    view: TuiView,
    show_bars: bool,
    show_band: bool,
    status: String,
}

impl App {
    fn new(view: TuiView) -> Self {
        let status = format!("{} samples, {} grid points", view.samples.len(), view.grid.len());
        Self {
            view,
            show_bars: true,
            show_band: false,
            status,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
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

    /// Returns `true` when the UI should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('b') => {
                self.show_bars = !self.show_bars;
                self.status = format!("error bars: {}", on_off(self.show_bars));
            }
            KeyCode::Char('u') => {
                if self.view.grid.iter().any(|g| g.std_dev > 0.0) {
                    self.show_band = !self.show_band;
                    self.status = format!("uncertainty band: {}", on_off(self.show_band));
                } else {
                    self.status = "No propagated uncertainty to show.".to_string();
                }
            }
            _ => {}
        }
        false
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("catenary", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" | {}", self.view.heading)),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "{} | R^2 = {}",
                self.view.formula,
                fmt_r_squared(self.view.r_squared)
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(34)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_params(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Catenary").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if self.view.grid.is_empty() {
            let msg = Paragraph::new("Nothing to plot.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let series = chart_series(&self.view, self.show_bars, self.show_band);
        let unit = self.view.unit.label();

        let widget = CatenaryPlottersChart {
            curve: &series.curve,
            band_upper: &series.band_upper,
            band_lower: &series.band_lower,
            points: &series.points,
            bars: &series.bars,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: format!("x ({unit})"),
            y_label: format!("y ({unit})"),
        };

        frame.render_widget(widget, inner);
    }

    fn draw_params(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut items: Vec<ListItem> = self.view.params.iter().map(|p| ListItem::new(p.clone())).collect();
        if let Some(note) = &self.view.solver_note {
            items.push(ListItem::new(""));
            items.push(ListItem::new(note.clone()).style(Style::default().fg(Color::Gray)));
        }

        let list = List::new(items).block(Block::default().title("Parameters").borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "b error bars  u uncertainty band  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}

/// Data prepared for one chart render.
#[derive(Debug, Clone, Default)]
struct ChartSeries {
    curve: Vec<(f64, f64)>,
    band_upper: Vec<(f64, f64)>,
    band_lower: Vec<(f64, f64)>,
    points: Vec<(f64, f64)>,
    bars: Vec<[(f64, f64); 2]>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn chart_series(view: &TuiView, show_bars: bool, show_band: bool) -> ChartSeries {
    let spec = crate::plot::ChartSpec {
        title: String::new(),
        unit: view.unit,
        samples: &view.samples,
        grid: &view.grid,
        error_bars: show_bars,
        band: show_band,
    };
    let (x_bounds, y_bounds) = spec.bounds();

    let finite = view.grid.iter().filter(|g| g.y.is_finite());
    let curve = finite.clone().map(|g| (g.x, g.y)).collect();
    let (band_upper, band_lower) = if show_band {
        (
            finite.clone().map(|g| (g.x, g.y + g.std_dev)).collect(),
            finite.map(|g| (g.x, g.y - g.std_dev)).collect(),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    let mut bars = Vec::new();
    if show_bars {
        for s in &view.samples {
            if let Some(sy) = s.y_sigma.filter(|v| *v > 0.0) {
                bars.push([(s.x, s.y - sy), (s.x, s.y + sy)]);
            }
            if let Some(sx) = s.x_sigma.filter(|v| *v > 0.0) {
                bars.push([(s.x - sx, s.y), (s.x + sx, s.y)]);
            }
        }
    }

    ChartSeries {
        curve,
        band_upper,
        band_lower,
        points: view.samples.iter().map(|s| (s.x, s.y)).collect(),
        bars,
        x_bounds,
        y_bounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> TuiView {
        TuiView {
            heading: "test".to_string(),
            formula: String::new(),
            unit: Unit::Cm,
            params: Vec::new(),
            r_squared: Some(0.9),
            solver_note: None,
            samples: vec![Sample::with_sigma(1.0, 1.0, 0.1, 0.2), Sample::new(2.0, 1.5)],
            grid: vec![
                GridPoint { x: 1.0, y: 1.0, std_dev: 0.05 },
                GridPoint { x: 2.0, y: 1.5, std_dev: 0.05 },
            ],
        }
    }

    #[test]
    fn toggles_control_series() {
        let v = view();
        let full = chart_series(&v, true, true);
        assert_eq!(full.bars.len(), 2);
        assert_eq!(full.band_upper.len(), 2);

        let bare = chart_series(&v, false, false);
        assert!(bare.bars.is_empty());
        assert!(bare.band_upper.is_empty());
        assert_eq!(bare.points.len(), 2);
        assert_eq!(bare.curve.len(), 2);
    }

    #[test]
    fn keys_toggle_and_quit() {
        let mut app = App::new(view());
        assert!(!app.handle_key(KeyCode::Char('b')));
        assert!(!app.show_bars);
        assert!(!app.handle_key(KeyCode::Char('u')));
        assert!(app.show_band);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn band_toggle_needs_propagated_sigma() {
        let mut v = view();
        for g in &mut v.grid {
            g.std_dev = 0.0;
        }
        let mut app = App::new(v);
        app.handle_key(KeyCode::Char('u'));
        assert!(!app.show_band);
        assert_eq!(app.status, "No propagated uncertainty to show.");
    }

    #[test]
    fn non_finite_grid_points_are_left_out_of_the_curve() {
        let mut v = view();
        v.grid.push(GridPoint { x: 3.0, y: f64::NAN, std_dev: 0.0 });
        let series = chart_series(&v, false, true);
        assert_eq!(series.curve.len(), 2);
        assert_eq!(series.band_lower.len(), 2);
        assert!(series.x_bounds[1] >= 3.0);
    }
}
