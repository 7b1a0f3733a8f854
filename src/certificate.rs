use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::AppConfig;
use crate::db::Database;
use crate::error::Result;
use crate::models::{Certificate, QuizResult};

const WIDTH: usize = 60;

pub const COURSE_TITLE: &str = "Media Pembelajaran Interaktif: Jaringan Komputer";

/// Whether a finished quiz earns a certificate.
pub fn qualifies(result: &QuizResult) -> bool {
    result.passed && result.question_count > 0
}

const DEFAULT_LEARNER: &str = "Learner";

/// The stored result id plus the certificate it unlocked, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SavedAttempt {
    pub result_id: i64,
    pub certificate_id: Option<i64>,
}

/// Name printed on certificates: profile first, then config.
pub fn learner_name(db: &Database, config: &AppConfig) -> Result<String> {
    Ok(db
        .learner_name()?
        .or_else(|| config.learner.clone())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LEARNER.to_string()))
}

/// Persists a finished quiz and, when it qualifies, its certificate. Both
/// rows are written together or not at all.
pub fn record_attempt(
    db: &Database,
    config: &AppConfig,
    result: &QuizResult,
    started_at: DateTime<Utc>,
) -> Result<SavedAttempt> {
    let learner = if qualifies(result) {
        Some(learner_name(db, config)?)
    } else {
        None
    };
    let (result_id, certificate_id) = db.save_result(result, started_at, learner.as_deref())?;
    if let (Some(id), Some(learner)) = (certificate_id, &learner) {
        log::info!("certificate {} unlocked for {}", id, learner);
    }
    Ok(SavedAttempt {
        result_id,
        certificate_id,
    })
}

pub fn render(cert: &Certificate) -> String {
    let issued = DateTime::parse_from_rfc3339(&cert.issued_at)
        .map(|dt| dt.format("%d %B %Y").to_string())
        .unwrap_or_else(|_| cert.issued_at.clone());
    let topic = cert
        .category
        .as_deref()
        .map(|c| format!("Topic: {}", c))
        .unwrap_or_else(|| "All topics".to_string());

    let border = format!("+{}+", "=".repeat(WIDTH));
    let blank = framed("");

    [
        border.clone(),
        blank.clone(),
        framed("CERTIFICATE OF COMPLETION"),
        blank.clone(),
        framed(COURSE_TITLE),
        blank.clone(),
        framed("This certifies that"),
        framed(&cert.learner),
        framed("has passed the networking assessment"),
        framed(&format!("with a score of {}%", cert.score)),
        blank.clone(),
        framed(&topic),
        framed(&format!("Issued {}  ·  No. {:05}", issued, cert.id)),
        blank,
        border,
    ]
    .join("\n")
}

fn framed(text: &str) -> String {
    let len = text.chars().count();
    if len >= WIDTH {
        let cut: String = text.chars().take(WIDTH).collect();
        return format!("|{}|", cut);
    }
    let left = (WIDTH - len) / 2;
    let right = WIDTH - len - left;
    format!("|{}{}{}|", " ".repeat(left), text, " ".repeat(right))
}
