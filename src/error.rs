use thiserror::Error;

use crate::models::QuestionKind;

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("no questions available for the requested configuration")]
    EmptyPool,

    #[error("answer type mismatch: question expects {expected}, got {found}")]
    InvalidAnswerType {
        expected: QuestionKind,
        found: QuestionKind,
    },

    #[error("session is already completed")]
    SessionCompleted,

    #[error("session has not been started")]
    SessionNotStarted,

    #[error("index {index} is out of range (length {len})")]
    InvalidIndex { index: usize, len: usize },

    #[error("external load failed: {0}")]
    ExternalLoad(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuizError {
    /// Data and configuration problems that callers recover from by falling
    /// back to built-in content. Everything else points at a caller bug.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, QuizError::EmptyPool | QuizError::ExternalLoad(_))
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;
