use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::models::{option_letter, AnswerValue, QuestionKind};
use crate::session::QuizSession;
use crate::timer::format_clock;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(session) = app.session.as_ref() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Progress + timer
            Constraint::Length(5), // Prompt
            Constraint::Min(0),    // Answer area
            Constraint::Length(3), // Question map
        ])
        .split(area);

    draw_header(f, session, chunks[0]);
    draw_prompt(f, session, chunks[1]);
    draw_answer(f, app, session, chunks[2]);
    draw_map(f, session, chunks[3]);
}

fn draw_header(f: &mut Frame, session: &QuizSession, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let total = session.len().max(1);
    let progress = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Question {}/{} · {} pts ",
            session.cursor() + 1,
            session.len(),
            session.current().points
        )))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(session.answered_count() as f64 / total as f64)
        .label(format!("{} answered", session.answered_count()));
    f.render_widget(progress, chunks[0]);

    let (clock, color) = match session.remaining_secs() {
        Some(secs) if session.is_paused() => (format!("{} (paused)", format_clock(secs)), Color::Gray),
        Some(secs) if secs <= 30 => (format_clock(secs), Color::Red),
        Some(secs) => (format_clock(secs), Color::Green),
        None if session.is_paused() => ("paused".to_string(), Color::Gray),
        None => ("no limit".to_string(), Color::DarkGray),
    };
    let timer = Paragraph::new(Line::from(Span::styled(
        clock,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL).title(" Time "));
    f.render_widget(timer, chunks[1]);
}

fn draw_prompt(f: &mut Frame, session: &QuizSession, area: Rect) {
    let q = session.current();
    let title = match &q.category {
        Some(c) => format!(" {} · {} ", c, q.difficulty.as_str()),
        None => format!(" {} ", q.difficulty.as_str()),
    };
    let prompt = Paragraph::new(q.prompt.as_str())
        .style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(prompt, area);
}

fn draw_answer(f: &mut Frame, app: &App, session: &QuizSession, area: Rect) {
    let q = session.current();
    let current = session.current_answer();
    let selected = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let lines: Vec<Line> = match q.kind() {
        QuestionKind::SingleChoice => q
            .options
            .iter()
            .enumerate()
            .map(|(i, opt)| {
                let text = format!(" {}. {} ", option_letter(i), opt);
                if current == Some(&AnswerValue::Choice(i)) {
                    Line::from(Span::styled(text, selected))
                } else {
                    Line::from(Span::raw(text))
                }
            })
            .collect(),
        QuestionKind::TrueFalse => [(true, " (T) True "), (false, " (F) False ")]
            .into_iter()
            .map(|(value, label)| {
                if current == Some(&AnswerValue::Bool(value)) {
                    Line::from(Span::styled(label, selected))
                } else {
                    Line::from(Span::raw(label))
                }
            })
            .collect(),
        QuestionKind::FillBlank => {
            let saved = match current {
                Some(AnswerValue::Text(t)) => Line::from(vec![
                    Span::styled("Saved answer: ", Style::default().fg(Color::Gray)),
                    Span::styled(t.as_str(), Style::default().fg(Color::Yellow)),
                ]),
                _ => Line::from(Span::styled(
                    "Type your answer and press Enter",
                    Style::default().fg(Color::DarkGray),
                )),
            };
            vec![
                saved,
                Line::from(""),
                Line::from(vec![
                    Span::styled("> ", Style::default().fg(Color::Cyan)),
                    Span::raw(app.answer_input.as_str()),
                    Span::styled("█", Style::default().fg(Color::Yellow)),
                ]),
            ]
        }
    };

    let answer = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Answer ")
            .title_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(answer, area);
}

fn draw_map(f: &mut Frame, session: &QuizSession, area: Rect) {
    let spans: Vec<Span> = (0..session.len())
        .map(|i| {
            let label = format!(" {} ", i + 1);
            let style = if i == session.cursor() {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if session.answer_at(i).is_some() {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(label, style)
        })
        .collect();

    let map = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(map, area);
}
