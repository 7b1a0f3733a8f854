pub mod error;
pub mod history;
pub mod menu;
pub mod quiz;
pub mod results;
pub mod tutor;

use ratatui::style::Color;

pub fn score_color(score: i64, threshold: i64) -> Color {
    if score >= threshold {
        Color::Green
    } else if score >= threshold / 2 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
