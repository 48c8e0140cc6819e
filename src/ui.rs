use std::collections::VecDeque;

use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::widgets::{
    Axis, Block, Borders, Cell, Chart, Clear, Dataset, Gauge, GraphType, Paragraph, Row, Table,
    Wrap,
};

use crate::dashboard::CollectionLoop;
use crate::state::{ControlStyle, DashboardState, Screen, control_key};
use crate::stats::{StatCard, StatsView};
use crate::view::{
    Badge, BadgeLevel, Connection, EMPTY_HISTORY_TEXT, HistoryView, Outcome, connection_label,
    player_lines,
};

pub const HISTORY_HEADERS: [&str; 6] =
    ["Date", "Result", "My Char", "Opponent", "Opp Char", "MR/LP"];

/// Modal drawn by the notifier while it waits for an answer.
pub struct Dialog<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub input: Option<&'a str>,
    pub footer: &'a str,
}

pub fn render_dialog(frame: &mut Frame, dialog: &Dialog<'_>) {
    let area = centered_rect(60, 40, frame.size());
    frame.render_widget(Clear, area);

    let mut lines = dialog
        .body
        .lines()
        .map(|line| Line::from(line.to_string()))
        .collect::<Vec<_>>();
    if let Some(input) = dialog.input {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::raw(input.to_string()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        dialog.footer.to_string(),
        Style::default().fg(Color::DarkGray),
    )));

    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(dialog.title.to_string())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
    frame.render_widget(widget, area);
}

pub fn header_text(screen: Screen, connection: Connection) -> String {
    let title = match screen {
        Screen::Dashboard => "SF6 TRACKER | DASHBOARD",
        Screen::Stats => "SF6 TRACKER | STATS",
    };
    format!(" {title} | API: {}", connection_label(connection))
}

pub fn footer_text(screen: Screen) -> &'static str {
    match screen {
        Screen::Dashboard => {
            "l Login | r Refresh | c Collect | p Periodic | i Interval | f Filter | D Delete | s Stats | y Copy URL | u User code | ? Help | q Quit"
        }
        Screen::Stats => "b/Esc Back | [ ] Chart limit | o Next opponent | O Clear | r Reload | ? Help | q Quit",
    }
}

fn badge_style(badge: &Badge) -> Style {
    match badge.level {
        BadgeLevel::Pending => Style::default().fg(Color::Yellow),
        BadgeLevel::Success => Style::default().fg(Color::Green),
        BadgeLevel::Error => Style::default().fg(Color::Red),
    }
}

fn outcome_style(outcome: Outcome) -> Style {
    match outcome {
        Outcome::Win => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        Outcome::Lose => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Outcome::Other => Style::default(),
    }
}

pub fn render_dashboard(
    frame: &mut Frame,
    area: Rect,
    state: &DashboardState,
    collection: CollectionLoop,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(11),
            Constraint::Min(6),
            Constraint::Length(5),
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(30),
            Constraint::Min(30),
            Constraint::Length(34),
        ])
        .split(rows[0]);

    render_status(frame, top[0], state);
    render_player(frame, top[1], state);
    render_controls(frame, top[2], state);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(44)])
        .split(rows[1]);

    render_history(frame, middle[0], &state.history);
    render_collection(frame, middle[1], state, collection);

    let console = Paragraph::new(console_text(state.logs.iter().map(String::as_str), 3))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, rows[2]);
}

fn render_status(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let lines = vec![
        Line::from(vec![
            Span::raw("Auth:     "),
            Span::styled(state.auth.text.clone(), badge_style(&state.auth)),
        ]),
        Line::from(vec![
            Span::raw("Database: "),
            Span::styled(state.db.text.clone(), badge_style(&state.db)),
        ]),
        Line::from(format!(
            "Updated:  {}",
            state.last_update.as_deref().unwrap_or("-")
        )),
        Line::from(format!(
            "User:     {}",
            state.user_code.as_deref().unwrap_or("-")
        )),
    ];
    let widget = Paragraph::new(lines)
        .block(Block::default().title("System").borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn render_player(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let lines = match &state.player {
        Some(player) => player_lines(player)
            .into_iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!("{label:<10}"), Style::default().fg(Color::DarkGray)),
                    Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
                ])
            })
            .collect::<Vec<_>>(),
        None => vec![Line::from("No player data yet")],
    };
    let widget = Paragraph::new(lines)
        .block(Block::default().title("Player").borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let lines = state
        .controls
        .iter()
        .map(|(id, control)| {
            let base = match control.style {
                ControlStyle::Primary => Style::default().fg(Color::Cyan),
                ControlStyle::Danger => Style::default().fg(Color::Red),
            };
            let style = if control.enabled {
                base
            } else {
                base.add_modifier(Modifier::DIM)
            };
            Line::from(vec![
                Span::styled(format!("[{}] ", control_key(id)), Style::default().fg(Color::DarkGray)),
                Span::styled(control.label.clone(), style),
            ])
        })
        .collect::<Vec<_>>();
    let widget = Paragraph::new(lines)
        .block(Block::default().title("Actions").borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn history_columns() -> [Constraint; 6] {
    [
        Constraint::Length(19),
        Constraint::Length(6),
        Constraint::Length(12),
        Constraint::Min(12),
        Constraint::Length(12),
        Constraint::Length(10),
    ]
}

fn render_history(frame: &mut Frame, area: Rect, history: &HistoryView) {
    let block = Block::default().title("Match History").borders(Borders::ALL);
    let rows = match history {
        HistoryView::Loading => {
            frame.render_widget(Paragraph::new("Loading...").block(block), area);
            return;
        }
        HistoryView::Empty => {
            let empty = Paragraph::new(EMPTY_HISTORY_TEXT)
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, area);
            return;
        }
        HistoryView::Rows(rows) => rows,
    };

    let header = Row::new(HISTORY_HEADERS)
        .style(Style::default().add_modifier(Modifier::BOLD));
    let body = rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.date.clone()),
            Cell::from(Span::styled(row.result.clone(), outcome_style(row.outcome))),
            Cell::from(row.my_character.clone()),
            Cell::from(row.opponent_name.clone()),
            Cell::from(row.opponent_character.clone()),
            Cell::from(row.rating.clone()),
        ])
    });
    let table = Table::new(body, history_columns())
        .header(header)
        .column_spacing(1)
        .block(block);
    frame.render_widget(table, area);
}

fn render_collection(
    frame: &mut Frame,
    area: Rect,
    state: &DashboardState,
    collection: CollectionLoop,
) {
    let interval = match collection {
        CollectionLoop::Running { interval_secs } => format!("{interval_secs}s (running)"),
        CollectionLoop::Stopped if state.interval_input.is_empty() => "30s (default)".to_string(),
        CollectionLoop::Stopped => format!("{}s", state.interval_input),
    };
    let mut lines = vec![
        Line::from(format!("Interval: {interval}")),
        Line::from(Span::styled(
            state.collect_status.clone(),
            Style::default().fg(Color::Yellow),
        )),
    ];
    let visible = area.height.saturating_sub(4) as usize;
    let skip = state.collection_log.len().saturating_sub(visible);
    lines.extend(
        state
            .collection_log
            .iter()
            .skip(skip)
            .map(|entry| Line::from(format!("[{}] {}", entry.time, entry.message))),
    );
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Collection").borders(Borders::ALL));
    frame.render_widget(widget, area);
}

/// Most recent `limit` lines, oldest first.
pub fn console_text<'a>(logs: impl DoubleEndedIterator<Item = &'a str>, limit: usize) -> String {
    let mut recent = logs.rev().take(limit).collect::<Vec<_>>();
    if recent.is_empty() {
        return "No alerts yet".to_string();
    }
    recent.reverse();
    recent.join("\n")
}

pub fn render_stats(frame: &mut Frame, area: Rect, view: &StatsView, logs: &VecDeque<String>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(5),
        ])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(rows[0]);
    for (card, slot) in view.cards.iter().zip(cards.iter()) {
        render_card(frame, *slot, card);
    }

    render_chart(frame, rows[1], view);

    let selected = view.selected_opponent.as_deref().unwrap_or("-");
    let mut footer = format!(
        "Chart limit: {} | Opponent: {selected} ({} known)",
        view.limit,
        view.opponents.len()
    );
    footer.push('\n');
    footer.push_str(&console_text(logs.iter().map(String::as_str), 2));
    let info = Paragraph::new(footer).block(Block::default().title("Info").borders(Borders::ALL));
    frame.render_widget(info, rows[2]);
}

fn render_card(frame: &mut Frame, area: Rect, card: &StatCard) {
    let color = match card.win_rate() {
        Some(rate) if rate >= 50.0 => Color::Green,
        Some(_) => Color::Red,
        None => Color::DarkGray,
    };
    let label = format!("{} | {}", card.rate_label(), card.record_label());
    let gauge = Gauge::default()
        .block(Block::default().title(card.title.clone()).borders(Borders::ALL))
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio(card.ratio())
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_chart(frame: &mut Frame, area: Rect, view: &StatsView) {
    let title = format!("MR History (last {})", view.limit);
    let block = Block::default().title(title).borders(Borders::ALL);
    let Some(chart) = &view.chart else {
        let empty = Paragraph::new("No MR history yet")
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let datasets = vec![
        Dataset::default()
            .name("MR")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&chart.points),
    ];
    let y_labels = chart
        .ticks
        .iter()
        .map(|tick| Span::raw(format!("{tick:.0}")))
        .collect::<Vec<_>>();
    let widget = Chart::new(datasets)
        .block(block)
        .x_axis(Axis::default().bounds(chart.x_bounds))
        .y_axis(
            Axis::default()
                .bounds(chart.y_bounds)
                .labels(y_labels)
                .labels_alignment(Alignment::Right),
        );
    frame.render_widget(widget, area);
}

pub fn render_help_overlay(frame: &mut Frame, area: Rect, screen: Screen) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = match screen {
        Screen::Dashboard => [
            "SF6 Tracker - Help",
            "",
            "Dashboard:",
            "  l            Open login browser on the server",
            "  r            Refresh player data",
            "  c            Collect matches once",
            "  p            Start/stop periodic collection",
            "  i            Edit collect interval (seconds)",
            "  f            Edit character filter",
            "  D            Delete database",
            "  s            Open stats",
            "  y            Copy stats URL",
            "  u            Set CFN user code",
            "  ?            Toggle help",
            "  q            Quit",
        ]
        .join("\n"),
        Screen::Stats => [
            "SF6 Tracker - Help",
            "",
            "Stats:",
            "  b / Esc      Back to dashboard",
            "  [ / ]        Smaller / larger chart limit",
            "  o            Next opponent",
            "  O            Clear opponent",
            "  r            Reload now",
            "  ?            Toggle help",
            "  q            Quit",
        ]
        .join("\n"),
    };

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
