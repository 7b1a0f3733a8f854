use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::score_color;
use crate::timer::format_clock;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(result) = app.last_result.as_ref() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .split(area);

    let verdict = if result.passed {
        Span::styled(
            "PASSED",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            format!("Not passed (pass mark {}%)", result.pass_threshold),
            Style::default().fg(Color::Red),
        )
    };

    let mut summary = vec![
        Line::from(vec![
            Span::styled("Score: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}% ", result.score),
                Style::default()
                    .fg(score_color(result.score as i64, result.pass_threshold as i64))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("(grade {})  ", result.grade())),
            verdict,
        ]),
        Line::from(format!(
            "Correct: {}/{}   Points: {}/{}   Answered: {}",
            result.correct,
            result.question_count,
            result.earned_points,
            result.total_points,
            result.answered
        )),
        Line::from(format!(
            "{} after {}",
            result.reason.label(),
            format_clock(result.elapsed_secs.min(u32::MAX as u64) as u32)
        )),
    ];

    if let Some(saved) = app.saved {
        summary.push(Line::from(Span::styled(
            format!("Saved as result #{}", saved.result_id),
            Style::default().fg(Color::DarkGray),
        )));
        if saved.certificate_id.is_some() {
            summary.push(Line::from(Span::styled(
                "Certificate unlocked! Print it with `netquiz certificate`.",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Result ")
        .title_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(summary).block(block), chunks[0]);

    let mut review = Vec::new();
    for (i, o) in result.outcomes.iter().enumerate() {
        let (mark, color) = if o.is_correct {
            ("✓", Color::Green)
        } else {
            ("✗", Color::Red)
        };
        review.push(Line::from(vec![
            Span::styled(format!("{} ", mark), Style::default().fg(color)),
            Span::styled(
                format!("{}. {}", i + 1, o.prompt),
                Style::default().fg(Color::White),
            ),
        ]));
        if !o.is_correct {
            review.push(Line::from(vec![
                Span::styled("   your answer: ", Style::default().fg(Color::Gray)),
                Span::raw(o.given_label.as_deref().unwrap_or("-")),
                Span::styled("   correct: ", Style::default().fg(Color::Gray)),
                Span::styled(o.correct_label.as_str(), Style::default().fg(Color::Green)),
            ]));
        }
        if let Some(expl) = &o.explanation {
            review.push(Line::from(Span::styled(
                format!("   {}", expl),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Review ")
        .title_style(Style::default().fg(Color::Cyan));
    f.render_widget(
        Paragraph::new(review)
            .wrap(Wrap { trim: false })
            .scroll((app.results_scroll, 0))
            .block(block),
        chunks[1],
    );
}
