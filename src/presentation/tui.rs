// Terminal frontend - chart grid, config form panel and key handling
use super::chart::{SURFACE_H, SURFACE_W};
use super::surface::{DrawSurface, Pen};
use crate::application::dashboard::DashboardController;
use crate::application::form::SaveSignal;
use crate::domain::line::LineId;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Context, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Adapts a ratatui canvas painting context to the chart's y-down pixel
/// surface. The canvas starts each frame blank, so `clear` is a no-op.
struct CanvasSurface<'a, 'b> {
    ctx: &'a mut Context<'b>,
}

fn pen_color(pen: Pen) -> Color {
    match pen {
        Pen::Axis => Color::DarkGray,
        Pen::Rate => Color::Cyan,
        Pen::Latency => Color::Green,
        Pen::Label => Color::Gray,
    }
}

fn flip(y: f64) -> f64 {
    SURFACE_H - y
}

impl DrawSurface for CanvasSurface<'_, '_> {
    fn clear(&mut self) {}

    fn polyline(&mut self, points: &[(f64, f64)], pen: Pen) {
        let color = pen_color(pen);
        if let [only] = points {
            self.ctx.draw(&Points {
                coords: &[(only.0, flip(only.1))],
                color,
            });
            return;
        }
        for pair in points.windows(2) {
            self.ctx.draw(&CanvasLine {
                x1: pair[0].0,
                y1: flip(pair[0].1),
                x2: pair[1].0,
                y2: flip(pair[1].1),
                color,
            });
        }
    }

    fn text(&mut self, x: f64, y: f64, pen: Pen, text: &str) {
        self.ctx.print(
            x,
            flip(y),
            Line::styled(text.to_string(), Style::default().fg(pen_color(pen))),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldId {
    Enabled,
    BaseLatency,
    Jitter,
    ErrorRate,
    TimeoutRate,
    TimeoutMs,
    NightEnabled,
    NightStart,
    NightEnd,
}

const FIELDS: [FieldId; 9] = [
    FieldId::Enabled,
    FieldId::BaseLatency,
    FieldId::Jitter,
    FieldId::ErrorRate,
    FieldId::TimeoutRate,
    FieldId::TimeoutMs,
    FieldId::NightEnabled,
    FieldId::NightStart,
    FieldId::NightEnd,
];

impl FieldId {
    fn label(self) -> &'static str {
        match self {
            FieldId::Enabled => "Enabled",
            FieldId::BaseLatency => "Base latency (ms)",
            FieldId::Jitter => "Jitter (±ms)",
            FieldId::ErrorRate => "Error rate (0..1)",
            FieldId::TimeoutRate => "Timeout rate (0..1)",
            FieldId::TimeoutMs => "Timeout duration (ms)",
            FieldId::NightEnabled => "Night block",
            FieldId::NightStart => "Night start (HH:MM)",
            FieldId::NightEnd => "Night end (HH:MM)",
        }
    }
}

enum Action {
    None,
    Revert(LineId),
    Quit,
}

struct ConsoleApp {
    dashboard: DashboardController,
    selected_line: usize,
    selected_field: usize,
}

impl ConsoleApp {
    fn new(dashboard: DashboardController) -> Self {
        Self {
            dashboard,
            selected_line: 0,
            selected_field: 0,
        }
    }

    fn line(&self) -> LineId {
        LineId::ALL[self.selected_line]
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind != KeyEventKind::Press {
            return Action::None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Tab => {
                self.selected_line = (self.selected_line + 1) % LineId::ALL.len();
            }
            KeyCode::BackTab => {
                self.selected_line =
                    (self.selected_line + LineId::ALL.len() - 1) % LineId::ALL.len();
            }
            KeyCode::Up => {
                self.selected_field = (self.selected_field + FIELDS.len() - 1) % FIELDS.len();
            }
            KeyCode::Down => {
                self.selected_field = (self.selected_field + 1) % FIELDS.len();
            }
            KeyCode::Char('s') => self.dashboard.trigger_save(self.line()),
            KeyCode::Char('u') => return Action::Revert(self.line()),
            KeyCode::Char('d') => self.dashboard.form_mut(self.line()).dismiss_signal(),
            KeyCode::Char('r') => self.dashboard.trigger_reset(),
            KeyCode::Char(' ') => self.toggle_field(),
            KeyCode::Char(c) if c.is_ascii_digit() || c == ':' || c == '.' => self.edit_char(c),
            KeyCode::Backspace => self.edit_backspace(),
            _ => {}
        }
        Action::None
    }

    fn field_text_mut(&mut self, field: FieldId) -> Option<&mut String> {
        let draft = self.dashboard.form_mut(self.line()).draft_mut();
        match field {
            FieldId::BaseLatency => Some(&mut draft.base_latency_ms),
            FieldId::Jitter => Some(&mut draft.jitter_ms),
            FieldId::ErrorRate => Some(&mut draft.error_rate),
            FieldId::TimeoutRate => Some(&mut draft.timeout_rate),
            FieldId::TimeoutMs => Some(&mut draft.timeout_ms),
            FieldId::NightStart => Some(&mut draft.night_start),
            FieldId::NightEnd => Some(&mut draft.night_end),
            FieldId::Enabled | FieldId::NightEnabled => None,
        }
    }

    fn toggle_field(&mut self) {
        let field = FIELDS[self.selected_field];
        let draft = self.dashboard.form_mut(self.line()).draft_mut();
        match field {
            FieldId::Enabled => draft.enabled = !draft.enabled,
            FieldId::NightEnabled => draft.night_block_enabled = !draft.night_block_enabled,
            _ => {}
        }
    }

    fn edit_char(&mut self, c: char) {
        let field = FIELDS[self.selected_field];
        if let Some(text) = self.field_text_mut(field) {
            text.push(c);
        }
    }

    fn edit_backspace(&mut self) {
        let field = FIELDS[self.selected_field];
        if let Some(text) = self.field_text_mut(field) {
            text.pop();
        }
    }

    fn view(&self, frame: &mut Frame) {
        let [charts_area, form_area, footer] = Layout::vertical([
            Constraint::Min(8),
            Constraint::Length(13),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        self.view_charts(frame, charts_area);
        self.view_form(frame, form_area);

        let clock = chrono::Local::now().format("%H:%M:%S");
        frame.render_widget(
            Paragraph::new(format!(
                " {clock}  tab line · ↑/↓ field · space toggle · s save · u revert · d dismiss · r reset · q quit"
            ))
            .style(Style::default().fg(Color::DarkGray)),
            footer,
        );
    }

    fn view_charts(&self, frame: &mut Frame, area: Rect) {
        let [top, bottom] =
            Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
        let [tl, tr] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(top);
        let [bl, br] = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(bottom);

        for (id, rect) in LineId::ALL.into_iter().zip([tl, tr, bl, br]) {
            let selected = id == self.line();
            let border_style = if selected {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(border_style)
                        .title(self.chart_title(id)),
                )
                .x_bounds([0.0, SURFACE_W])
                .y_bounds([0.0, SURFACE_H])
                .paint(|ctx| {
                    let mut surface = CanvasSurface { ctx };
                    self.dashboard.draw_chart(id, &mut surface);
                });
            frame.render_widget(canvas, rect);
        }
    }

    fn chart_title(&self, id: LineId) -> Line<'static> {
        let mut spans = vec![Span::styled(
            format!(" {id} "),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if self.dashboard.confirmed(id).night_blocked_now() {
            spans.push(Span::styled(
                "[blocked] ",
                Style::default().fg(Color::Red),
            ));
        }
        if let Some(totals) = self
            .dashboard
            .latest_snapshot()
            .and_then(|snapshot| snapshot.totals_for(id))
        {
            spans.push(Span::styled(
                format!(
                    "req={} err={} t/o={} p95={}ms ",
                    totals.requests, totals.errors, totals.timeouts, totals.p95_ms
                ),
                Style::default().fg(Color::Gray),
            ));
        }
        Line::from(spans)
    }

    fn view_form(&self, frame: &mut Frame, area: Rect) {
        let id = self.line();
        let form = self.dashboard.form(id);
        let draft = form.draft();

        let mut rows: Vec<Line> = Vec::with_capacity(FIELDS.len() + 1);
        for (i, field) in FIELDS.into_iter().enumerate() {
            let value = match field {
                FieldId::Enabled => checkbox(draft.enabled),
                FieldId::NightEnabled => checkbox(draft.night_block_enabled),
                FieldId::BaseLatency => draft.base_latency_ms.clone(),
                FieldId::Jitter => draft.jitter_ms.clone(),
                FieldId::ErrorRate => draft.error_rate.clone(),
                FieldId::TimeoutRate => draft.timeout_rate.clone(),
                FieldId::TimeoutMs => draft.timeout_ms.clone(),
                FieldId::NightStart => draft.night_start.clone(),
                FieldId::NightEnd => draft.night_end.clone(),
            };
            let style = if i == self.selected_field {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            rows.push(Line::styled(
                format!(" {:<22} {}", field.label(), value),
                style,
            ));
        }
        rows.push(self.signal_row(form.visible_signal(Instant::now())));

        frame.render_widget(
            Paragraph::new(rows).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", form.name())),
            ),
            area,
        );
    }

    fn signal_row(&self, signal: SaveSignal) -> Line<'static> {
        match signal {
            SaveSignal::Idle => Line::from(""),
            SaveSignal::Saved { .. } => {
                Line::styled(" saved ✓", Style::default().fg(Color::Green))
            }
            SaveSignal::Failed(msg) => Line::styled(
                format!(" save failed: {msg} (d to dismiss)"),
                Style::default().fg(Color::Red),
            ),
        }
    }
}

fn spawn_input_thread(tx: mpsc::Sender<Event>) {
    std::thread::spawn(move || loop {
        match crossterm::event::poll(Duration::from_millis(200)) {
            Ok(true) => {
                let Ok(event) = crossterm::event::read() else {
                    break;
                };
                if tx.blocking_send(event).is_err() {
                    break;
                }
            }
            Ok(false) => {
                if tx.is_closed() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

/// Run the console until the operator quits. The dashboard is already
/// loaded when we get here; the poll loop starts only after the first
/// frame laid out a form and a chart per line.
pub async fn run(mut dashboard: DashboardController, cadence: Duration) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let mut outcomes = dashboard.take_save_outcomes();
    let (poller_handle, mut snapshots) = dashboard.spawn_poller(cadence);
    let (input_tx, mut inputs) = mpsc::channel(32);
    spawn_input_thread(input_tx);

    // periodic repaint so transient signals expire on screen
    let mut repaint = tokio::time::interval(Duration::from_millis(250));

    let mut app = ConsoleApp::new(dashboard);
    let result = loop {
        if let Err(err) = terminal.draw(|frame| app.view(frame)) {
            break Err(err.into());
        }

        let action = tokio::select! {
            Some(event) = inputs.recv() => match event {
                Event::Key(key) => app.handle_key(key),
                _ => Action::None,
            },
            Some(snapshot) = snapshots.recv() => {
                app.dashboard.apply_snapshot(snapshot);
                Action::None
            }
            Some(outcome) = outcomes.recv() => {
                app.dashboard.handle_save_outcome(outcome, Instant::now());
                Action::None
            }
            _ = repaint.tick() => Action::None,
        };

        match action {
            Action::None => {}
            Action::Quit => break Ok(()),
            Action::Revert(id) => {
                if let Err(err) = app.dashboard.revert_line(id).await {
                    tracing::warn!(line = %id, %err, "revert failed");
                    app.dashboard
                        .form_mut(id)
                        .complete_save(&Err(err), Instant::now());
                }
            }
        }
    };

    poller_handle.stop();
    app.dashboard.teardown();
    ratatui::restore();
    result
}

fn checkbox(on: bool) -> String {
    (if on { "[x]" } else { "[ ]" }).to_string()
}
