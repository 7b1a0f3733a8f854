use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{score_color, truncate};
use crate::timer::format_clock;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    draw_categories(f, app, chunks[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(chunks[1]);

    draw_stats(f, app, side[0]);
    draw_settings(f, app, side[1]);
}

fn draw_categories(f: &mut Frame, app: &App, area: Rect) {
    let threshold = app.config.quiz.pass_threshold as i64;
    let items: Vec<ListItem> = app
        .menu
        .items
        .iter()
        .map(|entry| {
            let best = match entry.best_score {
                Some(score) => Span::styled(
                    format!("best {:>3}%", score),
                    Style::default().fg(score_color(score, threshold)),
                ),
                None => Span::styled("not taken", Style::default().fg(Color::DarkGray)),
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<26}", truncate(&entry.label, 24)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:>3} q  ", entry.questions),
                    Style::default().fg(Color::Cyan),
                ),
                best,
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Choose a topic ")
                .title_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.menu.selected);

    f.render_stateful_widget(list, area, &mut state);
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;
    let row = |label: &'static str, value: String, color: Color| {
        Line::from(vec![
            Span::styled(label, Style::default().fg(Color::Gray)),
            Span::styled(value, Style::default().fg(color)),
        ])
    };

    let text = vec![
        row("Attempts: ", stats.attempts.to_string(), Color::White),
        row("Passed: ", stats.passed.to_string(), Color::Green),
        row("Best score: ", format!("{}%", stats.best_score), Color::White),
        row("Average: ", format!("{:.1}%", stats.avg_score), Color::Cyan),
        row(
            "Answered: ",
            stats.questions_answered.to_string(),
            Color::White,
        ),
        if stats.certificate_unlocked {
            row("Certificate: ", "unlocked".to_string(), Color::Yellow)
        } else {
            row("Certificate: ", "locked".to_string(), Color::DarkGray)
        },
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Progress ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_settings(f: &mut Frame, app: &App, area: Rect) {
    let quiz = &app.config.quiz;
    let count = if quiz.count == 0 {
        "all".to_string()
    } else {
        quiz.count.to_string()
    };
    let limit = quiz
        .time_limit_secs
        .map(format_clock)
        .unwrap_or_else(|| "none".to_string());

    let text = vec![
        Line::from(format!("Questions: {}", count)),
        Line::from(format!("Time limit: {}", limit)),
        Line::from(format!("Pass mark: {}%", quiz.pass_threshold)),
        Line::from(format!(
            "Going back: {}",
            if quiz.allow_back { "allowed" } else { "off" }
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Quiz settings ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(Color::Gray))
            .block(block),
        area,
    );
}
