use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::models::QuestionKind;

use super::widgets::{error, history, menu, quiz, results, tutor};
use super::{App, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_help_bar(f, app, chunks[2]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Quiz", "History", "Tutor"];
    let selected = match app.view {
        View::Menu | View::Quiz | View::Results | View::Error => 0,
        View::History => 1,
        View::Tutor => 2,
    };

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" NetQuiz "))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Menu => menu::draw(f, app, area),
        View::Quiz => quiz::draw(f, app, area),
        View::Results => results::draw(f, app, area),
        View::History => history::draw(f, app, area),
        View::Tutor => tutor::draw(f, app, area),
        View::Error => error::draw(f, app, area),
    }
}

fn key_hint(key: &'static str, label: &'static str) -> [Span<'static>; 2] {
    [
        Span::styled(key, Style::default().fg(Color::Cyan)),
        Span::raw(label),
    ]
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<[Span; 2]> = match app.view {
        View::Menu => vec![
            key_hint("h/l", " Views  "),
            key_hint("j/k", " Nav  "),
            key_hint("<CR>", " Start quiz  "),
            key_hint("^r", " Refresh  "),
            key_hint("q", " Quit"),
        ],
        View::Quiz => {
            let answer = match app.session.as_ref().map(|s| s.current().kind()) {
                Some(QuestionKind::SingleChoice) => key_hint("a-z/1-9", " Answer  "),
                Some(QuestionKind::TrueFalse) => key_hint("t/f", " Answer  "),
                _ => key_hint("type+<CR>", " Answer  "),
            };
            let mut hints = vec![answer];
            if let Some(session) = app.session.as_ref() {
                if session.can_advance() {
                    hints.push(key_hint("<CR>/→", " Next  "));
                }
                if session.config().allow_back {
                    hints.push(key_hint("←", " Back  "));
                }
            }
            let paused = app.session.as_ref().is_some_and(|s| s.is_paused());
            hints.extend([
                key_hint("<Del>", " Clear  "),
                key_hint("^p", if paused { " Resume  " } else { " Pause  " }),
                key_hint("^s", " Submit  "),
                key_hint("<Esc>", " Abandon"),
            ]);
            hints
        }
        View::Results => vec![
            key_hint("j/k", " Scroll  "),
            key_hint("<CR>/m", " Menu  "),
            key_hint("q", " Quit"),
        ],
        View::History => vec![
            key_hint("h/l", " Views  "),
            key_hint("j/k", " Nav  "),
            key_hint("g/G", " Top/Bot  "),
            key_hint("q", " Quit"),
        ],
        View::Tutor => vec![
            key_hint("<CR>", " Send  "),
            key_hint("^l", " Clear  "),
            key_hint("<Tab>", " Views  "),
            key_hint("<Esc>", " Menu"),
        ],
        View::Error => vec![
            key_hint("r", " Retry  "),
            key_hint("m", " Menu  "),
            key_hint("q", " Quit"),
        ],
    };

    let mut spans: Vec<Span> = hints.into_iter().flatten().collect();
    if let Some(status) = &app.status {
        if matches!(app.view, View::Quiz | View::Results) {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                status.as_str(),
                Style::default().fg(Color::Yellow),
            ));
        }
    }

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
