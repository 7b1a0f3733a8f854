use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::models::ChatRole;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let mut lines = Vec::new();
    if app.conversation.messages().is_empty() && app.chat_error.is_none() {
        lines.push(Line::from(Span::styled(
            "Ask anything about the course: OSI layers, TCP vs UDP, subnetting...",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for msg in app.conversation.messages() {
        let (who, color) = match msg.role {
            ChatRole::User => ("You", Color::Cyan),
            ChatRole::Assistant => ("Tutor", Color::Green),
            ChatRole::System => continue,
        };
        lines.push(Line::from(Span::styled(
            format!("{}:", who),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.extend(msg.content.lines().map(|l| Line::from(l.to_string())));
        lines.push(Line::from(""));
    }

    if app.chat_pending {
        lines.push(Line::from(Span::styled(
            "Tutor is thinking...",
            Style::default().fg(Color::Yellow),
        )));
    }
    if let Some(err) = &app.chat_error {
        lines.push(Line::from(Span::styled(
            format!("! {}", err),
            Style::default().fg(Color::Red),
        )));
    }

    // Keep the newest lines in view.
    let visible = chunks[0].height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(visible) as u16;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Tutor ")
        .title_style(Style::default().fg(Color::Cyan));
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .block(block),
        chunks[0],
    );

    let input = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Cyan)),
        Span::raw(app.chat_input.as_str()),
        Span::styled("█", Style::default().fg(Color::Yellow)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" Message "));
    f.render_widget(input, chunks[1]);
}
