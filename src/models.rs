use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    // Banks written for the Indonesian course use mudah/sedang/sulit
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "e" | "mudah" => Some(Difficulty::Easy),
            "medium" | "m" | "sedang" | "normal" => Some(Difficulty::Medium),
            "hard" | "h" | "sulit" | "susah" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleChoice,
    TrueFalse,
    FillBlank,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "single-choice",
            QuestionKind::TrueFalse => "true-false",
            QuestionKind::FillBlank => "fill-blank",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "single-choice" | "multiple-choice" | "mcq" | "choice" | "pilihan-ganda" => {
                Some(QuestionKind::SingleChoice)
            }
            "true-false" | "truefalse" | "boolean" | "tf" | "benar-salah" => {
                Some(QuestionKind::TrueFalse)
            }
            "fill-blank" | "fill-in-blank" | "fill-in-the-blank" | "fillblank" | "isian" => {
                Some(QuestionKind::FillBlank)
            }
            _ => None,
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that can be either a question's answer key or a learner's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Choice(usize),
    Bool(bool),
    Text(String),
}

impl AnswerValue {
    pub fn kind(&self) -> QuestionKind {
        match self {
            AnswerValue::Choice(_) => QuestionKind::SingleChoice,
            AnswerValue::Bool(_) => QuestionKind::TrueFalse,
            AnswerValue::Text(_) => QuestionKind::FillBlank,
        }
    }

    /// Human readable form, resolving choice indices against `options`.
    pub fn describe(&self, options: &[String]) -> String {
        match self {
            AnswerValue::Choice(i) => match options.get(*i) {
                Some(label) => format!("{}. {}", option_letter(*i), label),
                None => format!("option {}", i + 1),
            },
            AnswerValue::Bool(true) => "True".to_string(),
            AnswerValue::Bool(false) => "False".to_string(),
            AnswerValue::Text(s) => s.clone(),
        }
    }
}

pub fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

pub fn normalize_text(s: &str) -> String {
    s.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub answer: AnswerValue,
    pub points: u32,
    pub explanation: Option<String>,
    pub difficulty: Difficulty,
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

pub const DEFAULT_POINTS: u32 = 10;
pub const MAX_POINTS: u32 = 1000;

impl Question {
    pub fn kind(&self) -> QuestionKind {
        self.answer.kind()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err(format!("question '{}' has an empty prompt", self.id));
        }
        if self.points == 0 {
            return Err(format!("question '{}' is worth zero points", self.id));
        }
        if self.points > MAX_POINTS {
            return Err(format!(
                "question '{}' is worth {} points, more than {}",
                self.id, self.points, MAX_POINTS
            ));
        }
        match &self.answer {
            AnswerValue::Choice(i) => {
                if self.options.len() < 2 {
                    return Err(format!(
                        "question '{}' needs at least two options",
                        self.id
                    ));
                }
                if *i >= self.options.len() {
                    return Err(format!(
                        "question '{}' answer index {} is outside {} options",
                        self.id,
                        i,
                        self.options.len()
                    ));
                }
            }
            AnswerValue::Text(s) if s.trim().is_empty() => {
                return Err(format!("question '{}' has an empty answer", self.id));
            }
            _ => {}
        }
        Ok(())
    }

    pub fn is_correct(&self, given: &AnswerValue) -> bool {
        match (&self.answer, given) {
            (AnswerValue::Choice(a), AnswerValue::Choice(b)) => a == b,
            (AnswerValue::Bool(a), AnswerValue::Bool(b)) => a == b,
            (AnswerValue::Text(a), AnswerValue::Text(b)) => normalize_text(a) == normalize_text(b),
            _ => false,
        }
    }

    pub fn correct_label(&self) -> String {
        self.answer.describe(&self.options)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    /// 0 takes every question in the filtered pool.
    pub count: usize,
    /// Seconds; `None` is unlimited.
    pub time_limit: Option<u32>,
    pub shuffle_questions: bool,
    pub shuffle_options: bool,
    pub pass_threshold: u8,
    pub allow_back: bool,
    #[serde(with = "optional_millis")]
    pub auto_advance: Option<Duration>,
    pub auto_submit: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            category: None,
            difficulty: None,
            count: 10,
            time_limit: None,
            shuffle_questions: true,
            shuffle_options: true,
            pass_threshold: 70,
            allow_back: true,
            auto_advance: None,
            auto_submit: false,
        }
    }
}

mod optional_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    Submitted,
    TimedOut,
    AutoSubmitted,
}

impl CompletionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionReason::Submitted => "submitted",
            CompletionReason::TimedOut => "timed_out",
            CompletionReason::AutoSubmitted => "auto_submitted",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "submitted" => Some(CompletionReason::Submitted),
            "timed_out" | "timeout" => Some(CompletionReason::TimedOut),
            "auto_submitted" | "auto" => Some(CompletionReason::AutoSubmitted),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompletionReason::Submitted => "Submitted",
            CompletionReason::TimedOut => "Time's up",
            CompletionReason::AutoSubmitted => "Auto-submitted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub prompt: String,
    pub given: Option<AnswerValue>,
    pub given_label: Option<String>,
    pub correct_label: String,
    pub is_correct: bool,
    pub points_earned: u32,
    pub points_possible: u32,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub category: Option<String>,
    pub correct: usize,
    pub answered: usize,
    pub question_count: usize,
    pub earned_points: u32,
    pub total_points: u32,
    pub score: u8,
    pub pass_threshold: u8,
    pub passed: bool,
    pub reason: CompletionReason,
    pub elapsed_secs: u64,
    pub outcomes: Vec<QuestionOutcome>,
}

impl QuizResult {
    pub fn grade(&self) -> &'static str {
        match self.score {
            90..=100 => "A",
            80..=89 => "B",
            70..=79 => "C",
            60..=69 => "D",
            _ => "E",
        }
    }
}

/// Percentage rounded half-up; an empty total scores 0.
pub fn score_percent(earned: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let earned = earned.min(total) as u64;
    let total = total as u64;
    ((200 * earned + total) / (2 * total)) as u8
}

// A result row as persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: i64,
    pub category: Option<String>,
    pub started_at: String,
    pub finished_at: String,
    pub correct: i64,
    pub question_count: i64,
    pub earned_points: i64,
    pub total_points: i64,
    pub score: i64,
    pub passed: bool,
    pub reason: CompletionReason,
    pub elapsed_secs: i64,
}

impl ResultRecord {
    pub fn elapsed_clock(&self) -> String {
        let secs = self.elapsed_secs.clamp(0, u32::MAX as i64) as u32;
        crate::timer::format_clock(secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub prompt: String,
    pub given: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub points_earned: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub id: i64,
    pub learner: String,
    pub result_id: i64,
    pub score: i64,
    pub category: Option<String>,
    pub issued_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
