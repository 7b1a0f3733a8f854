use chrono::DateTime;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::{score_color, truncate};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    draw_results(f, app, chunks[0]);
    draw_answers(f, app, chunks[1]);
}

fn draw_results(f: &mut Frame, app: &App, area: Rect) {
    let threshold = app.config.quiz.pass_threshold as i64;
    let items: Vec<ListItem> = app
        .history
        .items
        .iter()
        .map(|r| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<13}", format_date(&r.finished_at)),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!("{:<16}", truncate(r.category.as_deref().unwrap_or("all"), 15)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:>4}%", r.score),
                    Style::default().fg(score_color(r.score, threshold)),
                ),
                Span::styled(
                    if r.passed { " ✓" } else { "" },
                    Style::default().fg(Color::Green),
                ),
            ]))
        })
        .collect();

    let title = if items.is_empty() {
        " History (no results yet) ".to_string()
    } else {
        format!(" History ({}) ", items.len())
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.history.selected);

    f.render_stateful_widget(list, area, &mut state);
}

fn draw_answers(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    if let Some(r) = app.history.selected_item() {
        lines.push(Line::from(Span::styled(
            format!(
                "{}/{} correct · {}/{} points · {} · {}",
                r.correct,
                r.question_count,
                r.earned_points,
                r.total_points,
                r.elapsed_clock(),
                r.reason.label()
            ),
            Style::default().fg(Color::Gray),
        )));
        lines.push(Line::from(""));
    }

    for a in &app.history_answers {
        let (mark, color) = if a.is_correct {
            ("✓", Color::Green)
        } else {
            ("✗", Color::Red)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", mark), Style::default().fg(color)),
            Span::raw(a.prompt.as_str()),
        ]));
        if !a.is_correct {
            lines.push(Line::from(Span::styled(
                format!(
                    "   given: {}  correct: {}",
                    a.given.as_deref().unwrap_or("-"),
                    a.correct_answer
                ),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Answers ")
        .title_style(Style::default().fg(Color::Cyan));
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

fn format_date(ts: &str) -> String {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.format("%b %d %H:%M").to_string())
        .unwrap_or_else(|_| "Unknown".to_string())
}
