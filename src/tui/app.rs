//! Interactive results viewer.
//!
//! This module contains the `ResultsApp` struct which runs analyses against
//! the context, keeps the rendered [`ResultView`] and draws it as a ranked
//! list, a dependency graph and an Eisenhower matrix.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine},
        Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap,
    },
    Frame, Terminal,
};

use crate::analysis::{AnalysisJob, AnalysisState};
use crate::context::Context;
use crate::error::TriageError;
use crate::fields::{LinkStyle, PriorityTier, Quadrant, Strategy};
use crate::graph::{arrow_head, GraphLayout, Point};
use crate::render::{percent, ResultRow, ResultView};
use crate::tui::{
    colors::{CYCLE_RED, EDGE_GRAY, NODE_INDIGO, TIER_HIGH, TIER_LOW, TIER_MEDIUM},
    enums::{MessageKind, Tab},
    utils::centered_rect,
};

/// Node radius in layout units, matching the drawn circle.
const NODE_RADIUS: f64 = 25.0;
const ARROW_SIZE: f64 = 10.0;
const BAR_WIDTH: usize = 20;

struct StatusMessage {
    text: String,
    kind: MessageKind,
    shown_at: Instant,
}

/// State for the results viewer.
pub struct ResultsApp<'a> {
    ctx: &'a mut Context,
    strategy: Strategy,
    tab: Tab,
    view: Option<ResultView>,
    table_state: TableState,
    /// Analysis in flight on a worker thread.
    job: Option<AnalysisJob>,
    show_help: bool,
    message: Option<StatusMessage>,
    dismiss_after: Duration,
}

impl<'a> ResultsApp<'a> {
    /// Create the viewer. The first analysis starts when [`ResultsApp::run`] is entered.
    pub fn new(ctx: &'a mut Context, strategy: Strategy) -> Self {
        let dismiss_after = ctx.config.dismiss_after();
        ResultsApp {
            ctx,
            strategy,
            tab: Tab::Ranked,
            view: None,
            table_state: TableState::default(),
            job: None,
            show_help: false,
            message: None,
            dismiss_after,
        }
    }

    fn set_message(&mut self, text: String, kind: MessageKind) {
        self.message = Some(StatusMessage { text, kind, shown_at: Instant::now() });
    }

    /// Drop the status message once it has been visible long enough.
    fn expire_message(&mut self) {
        if let Some(msg) = &self.message {
            if msg.shown_at.elapsed() >= self.dismiss_after {
                self.message = None;
            }
        }
    }

    /// Kick off an analysis. A job already in flight is dropped and its result ignored.
    fn start_analysis(&mut self) {
        match self.ctx.start_analysis(self.strategy) {
            Ok(job) => {
                self.job = Some(job);
                self.message = None;
            }
            Err(e) => {
                self.job = None;
                self.set_message(e.to_string(), MessageKind::Error);
            }
        }
        self.refresh_view();
    }

    /// Pick up the outcome of the running job, if it has arrived.
    fn poll_analysis(&mut self) {
        let Some(job) = self.job.as_mut() else {
            return;
        };
        let outcome = match self.ctx.poll_analysis(job) {
            Some(outcome) => outcome.map(|analysis| (analysis.response.tasks.len(), analysis.strategy)),
            None => return,
        };
        self.job = None;
        self.refresh_view();
        match outcome {
            Ok((n, strategy)) => self.set_message(
                format!("Analyzed {} tasks with {}", n, strategy.label()),
                MessageKind::Info,
            ),
            Err(TriageError::Superseded { .. }) => {}
            Err(e) => self.set_message(e.to_string(), MessageKind::Error),
        }
    }

    fn is_running(&self) -> bool {
        self.job.is_some()
    }

    /// Re-render from the orchestrator's latest result, keeping the selection in range.
    fn refresh_view(&mut self) {
        self.view = self.ctx.view();
        let len = self.view.as_ref().map_or(0, |v| v.rows.len());
        if len == 0 {
            self.table_state.select(None);
        } else {
            let selected = self.table_state.selected().unwrap_or(0).min(len - 1);
            self.table_state.select(Some(selected));
        }
    }

    fn selected_row(&self) -> Option<&ResultRow> {
        let view = self.view.as_ref()?;
        view.rows.get(self.table_state.selected()?)
    }

    fn record_feedback(&mut self, helpful: bool) {
        let Some(id) = self.selected_row().map(|r| r.id.clone()) else {
            self.set_message("Select a task first".into(), MessageKind::Error);
            return;
        };
        match self.ctx.feedback.record(&id, helpful) {
            Ok(()) => {
                self.refresh_view();
                let verdict = if helpful { "helpful" } else { "unhelpful" };
                self.set_message(format!("Marked {id} as {verdict}"), MessageKind::Info);
            }
            Err(e) => self.set_message(e.to_string(), MessageKind::Error),
        }
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.view.as_ref().map_or(0, |v| v.rows.len());
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = if down {
            (current + 1).min(len - 1)
        } else {
            current.saturating_sub(1)
        };
        self.table_state.select(Some(next));
    }

    /// Handle one key press. Returns `true` when the viewer should exit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if self.show_help {
                    self.show_help = false;
                    return Ok(false);
                }
                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(true)
                    }
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
                    KeyCode::Tab | KeyCode::Right => self.tab = self.tab.next(),
                    KeyCode::BackTab | KeyCode::Left => self.tab = self.tab.prev(),
                    KeyCode::Char('1') => self.tab = Tab::Ranked,
                    KeyCode::Char('2') => self.tab = Tab::Graph,
                    KeyCode::Char('3') => self.tab = Tab::Matrix,
                    KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
                    KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
                    KeyCode::Char('r') => self.start_analysis(),
                    KeyCode::Char('s') => {
                        self.strategy = self.strategy.next();
                        self.start_analysis();
                    }
                    KeyCode::Char('+') | KeyCode::Char('y') => self.record_feedback(true),
                    KeyCode::Char('-') | KeyCode::Char('n') => self.record_feedback(false),
                    KeyCode::Char('h') | KeyCode::Char('?') => self.show_help = true,
                    _ => {}
                }
            }
        }
        Ok(false)
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Header
                Constraint::Length(3), // Tabs
                Constraint::Min(0),    // Body
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_tabs(f, chunks[1]);
        if self.view.is_some() {
            match self.tab {
                Tab::Ranked => self.render_ranked(f, chunks[2]),
                Tab::Graph => self.render_graph(f, chunks[2]),
                Tab::Matrix => self.render_matrix(f, chunks[2]),
            }
        } else {
            self.render_placeholder(f, chunks[2]);
        }
        self.render_status_bar(f, chunks[3]);

        if self.show_help {
            self.render_help(f);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let stats = match &self.view {
            Some(view) => format!(
                "Tasks: {}  High priority: {}  Cycles: {}",
                view.summary.total, view.summary.high_priority, view.summary.cycle_count
            ),
            None => format!("Tasks queued: {}", self.ctx.tasks.len()),
        };
        let lines = vec![
            Line::from(vec![
                Span::styled("TASK ANALYSIS", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw("  "),
                Span::styled(
                    format!("{} - {}", self.strategy.label(), self.strategy.description()),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
                ),
            ]),
            Line::from(stats),
        ];
        let header = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_tabs(&self, f: &mut Frame, area: Rect) {
        let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.title())).collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL))
            .select(self.tab.index())
            .highlight_style(Style::default().fg(NODE_INDIGO).add_modifier(Modifier::BOLD));
        f.render_widget(tabs, area);
    }

    fn render_placeholder(&self, f: &mut Frame, area: Rect) {
        let text = if self.is_running() {
            format!(
                "Analyzing {} tasks with {}...\n\nPress 'r' to retry or 'q' to quit.",
                self.ctx.tasks.len(),
                self.strategy.label()
            )
        } else {
            match self.ctx.orchestrator.state() {
                AnalysisState::Failed(msg) => format!("{msg}\n\nPress 'r' to retry."),
                _ if self.ctx.tasks.is_empty() => {
                    "No tasks added yet. Use `triage add` or `triage import` first.".to_string()
                }
                _ => "No results yet. Press 'r' to analyze.".to_string(),
            }
        };
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_ranked(&mut self, f: &mut Frame, area: Rect) {
        let Some(view) = self.view.as_ref() else {
            return;
        };

        let alert_height = if view.cycle_detected { view.cycles.len() as u16 + 2 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(alert_height),
                Constraint::Min(5),
                Constraint::Length(9),
            ])
            .split(area);

        if view.cycle_detected {
            let lines: Vec<Line> = view
                .cycles
                .iter()
                .map(|c| Line::from(format!("🔄 {c}")))
                .collect();
            let alert = Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Circular dependencies detected")
                    .border_style(Style::default().fg(CYCLE_RED).add_modifier(Modifier::BOLD)),
            );
            f.render_widget(alert, chunks[0]);
        }

        let header = Row::new(vec!["#", "Score", "Tier", "Pri", "Eff", "Due", "Title"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = view
            .rows
            .iter()
            .map(|row| {
                let title = match &row.feedback {
                    Some(badge) => format!("{} {}", row.title, badge),
                    None => row.title.clone(),
                };
                Row::new(vec![
                    Cell::from(row.rank.to_string()),
                    Cell::from(format!("{:.2}", row.score)),
                    Cell::from(row.tier.as_str()).style(Style::default().fg(tier_color(row.tier))),
                    Cell::from(format!("{}/10", row.priority)),
                    Cell::from(format!("{}/10", row.effort)),
                    Cell::from(row.due_display.clone()),
                    Cell::from(title),
                ])
            })
            .collect();
        let widths = [
            Constraint::Length(4),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(13),
            Constraint::Min(20),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Results ({}) - Press 'h' for help",
                view.rows.len()
            )))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        f.render_stateful_widget(table, chunks[1], &mut self.table_state);

        self.render_row_detail(f, chunks[2]);
    }

    fn render_row_detail(&self, f: &mut Frame, area: Rect) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let lines = vec![
            Line::from(Span::styled(
                format!("{}. {}", row.rank, row.title),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "Priority {}/10   Effort {}/10   Due {}   {}",
                row.priority,
                row.effort,
                row.due_display,
                row.quadrant.title()
            )),
            component_line("Urgency     ", row.components.urgency),
            component_line("Importance  ", row.components.importance_norm),
            component_line("Effort score", row.components.effort),
            Line::from(""),
            Line::from(format!(
                "Why this rank? This task scores high due to a combination of factors: {}",
                row.explanation
            )),
        ];
        let detail = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Task {}", row.id))
                    .border_style(Style::default().fg(tier_color(row.tier))),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(detail, area);
    }

    fn render_graph(&self, f: &mut Frame, area: Rect) {
        let Some(view) = self.view.as_ref() else {
            return;
        };
        let Some(graph) = view.graph.as_ref() else {
            return;
        };
        let canvas_size = self.ctx.config.canvas();
        let (width, height) = (canvas_size.width, canvas_size.height);

        let canvas = Canvas::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Dependency Graph (red: part of a cycle)"),
            )
            .marker(Marker::Braille)
            .x_bounds([0.0, width])
            .y_bounds([0.0, height])
            .paint(|ctx| {
                draw_edges(ctx, graph, height);
                for node in &graph.nodes {
                    let p = flip(node.position, height);
                    let color = match node.style {
                        LinkStyle::Cycle => CYCLE_RED,
                        LinkStyle::Normal => NODE_INDIGO,
                    };
                    ctx.draw(&Circle { x: p.x, y: p.y, radius: NODE_RADIUS, color });
                }
                ctx.layer();
                for node in &graph.nodes {
                    let p = flip(node.position, height);
                    let style = Style::default().add_modifier(Modifier::BOLD).fg(match node.style {
                        LinkStyle::Cycle => CYCLE_RED,
                        LinkStyle::Normal => Color::White,
                    });
                    let offset = node.label.chars().count() as f64 * 3.0;
                    ctx.print(p.x - offset, p.y, Span::styled(node.label.clone(), style));
                }
            });
        f.render_widget(canvas, area);
    }

    fn render_matrix(&self, f: &mut Frame, area: Rect) {
        let Some(view) = self.view.as_ref() else {
            return;
        };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);
        let mut cells = Vec::with_capacity(4);
        for row_area in rows.iter() {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(*row_area);
            cells.extend(cols.iter().copied());
        }

        for (q, cell_area) in Quadrant::ALL.into_iter().zip(cells) {
            let mut lines = Vec::new();
            for row in view.quadrant_rows(q) {
                lines.push(Line::from(Span::styled(
                    row.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(format!(
                    "  Score: {:.2} | U: {}% I: {}%",
                    row.score,
                    percent(row.components.urgency),
                    percent(row.components.importance_norm)
                )));
            }
            let count = view.matrix[q.index()].len();
            let block = Block::default()
                .borders(Borders::ALL)
                .title(format!("{} [{}]", q.title(), count))
                .border_style(Style::default().fg(quadrant_color(q)));
            f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), cell_area);
        }
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let (text, bg) = if self.is_running() {
            (format!("Analyzing with {}...", self.strategy.label()), NODE_INDIGO)
        } else if let Some(msg) = &self.message {
            let bg = match msg.kind {
                MessageKind::Info => NODE_INDIGO,
                MessageKind::Error => CYCLE_RED,
            };
            (msg.text.clone(), bg)
        } else {
            (
                "Tab: Switch view | r: Re-run | s: Strategy | +/-: Feedback | h: Help | q: Quit"
                    .to_string(),
                Color::DarkGray,
            )
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(bg).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render_help(&self, f: &mut Frame) {
        let area = centered_rect(60, 60, f.area());
        let lines = vec![
            Line::from(Span::styled("Keys", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from("Tab / Left / Right   Switch view (1, 2, 3 jump directly)"),
            Line::from("Up / Down / j / k    Select task"),
            Line::from("r                    Re-run analysis"),
            Line::from("s                    Next strategy and re-run"),
            Line::from("+ / y                Mark ranking helpful"),
            Line::from("- / n                Mark ranking unhelpful"),
            Line::from("q / Esc / Ctrl-C     Quit (also while an analysis is running)"),
            Line::from(""),
            Line::from("Strategies:"),
        ]
        .into_iter()
        .chain(Strategy::ALL.iter().map(|s| {
            Line::from(format!("  {:<16} {}", s.label(), s.description()))
        }))
        .collect::<Vec<_>>();

        f.render_widget(Clear, area);
        let help = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Help (any key to close)"))
            .wrap(Wrap { trim: false })
            .style(Style::default().bg(Color::Black));
        f.render_widget(help, area);
    }

    /// Main event loop.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        self.start_analysis();
        loop {
            self.expire_message();
            self.poll_analysis();
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

/// Layout coordinates grow downwards; canvas coordinates grow upwards.
fn flip(p: Point, height: f64) -> Point {
    Point { x: p.x, y: height - p.y }
}

fn draw_edges(ctx: &mut ratatui::widgets::canvas::Context, graph: &GraphLayout, height: f64) {
    for edge in &graph.edges {
        let color = match edge.style {
            LinkStyle::Cycle => CYCLE_RED,
            LinkStyle::Normal => EDGE_GRAY,
        };
        let (start, end) = (flip(edge.start, height), flip(edge.end, height));
        ctx.draw(&CanvasLine::new(start.x, start.y, end.x, end.y, color));
        if let Some((tip, wings)) = arrow_head(start, end, NODE_RADIUS, ARROW_SIZE) {
            for wing in wings {
                ctx.draw(&CanvasLine::new(tip.x, tip.y, wing.x, wing.y, color));
            }
        }
    }
}

fn tier_color(tier: PriorityTier) -> Color {
    match tier {
        PriorityTier::High => TIER_HIGH,
        PriorityTier::Medium => TIER_MEDIUM,
        PriorityTier::Low => TIER_LOW,
    }
}

fn quadrant_color(q: Quadrant) -> Color {
    match q {
        Quadrant::DoFirst => TIER_HIGH,
        Quadrant::Schedule => NODE_INDIGO,
        Quadrant::Delegate => TIER_MEDIUM,
        Quadrant::Eliminate => Color::DarkGray,
    }
}

/// Text bar such as `Urgency      ██████░░░░ 60%`.
fn component_line(label: &str, value: f64) -> Line<'static> {
    let pct = percent(value);
    let filled = (pct as usize * BAR_WIDTH + 50) / 100;
    Line::from(format!(
        "{}  {}{} {:>3}%",
        label,
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        pct
    ))
}
