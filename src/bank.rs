use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{QuizError, Result};
use crate::models::{AnswerValue, Difficulty, Question, QuestionKind, DEFAULT_POINTS};

const BUILTIN_BANK: &str = include_str!("../data/questions.json");
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A loaded, normalized question bank.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionBank {
    pub version: Option<String>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub questions: usize,
    pub points: u32,
}

impl QuestionBank {
    pub fn categories(&self) -> Vec<CategorySummary> {
        let mut map: BTreeMap<String, CategorySummary> = BTreeMap::new();
        for q in &self.questions {
            let name = q.category.clone().unwrap_or_else(|| "general".to_string());
            let entry = map.entry(name.clone()).or_insert(CategorySummary {
                name,
                questions: 0,
                points: 0,
            });
            entry.questions += 1;
            entry.points = entry.points.saturating_add(q.points);
        }
        map.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

// Historical exports used different names for the same field
#[derive(Debug, Deserialize)]
struct RawQuestion {
    id: Option<Value>,
    #[serde(alias = "question", alias = "text")]
    prompt: Option<String>,
    #[serde(alias = "questionType", alias = "kind")]
    r#type: Option<String>,
    #[serde(alias = "choices")]
    options: Option<Vec<String>>,
    #[serde(
        alias = "correct",
        alias = "correctAnswer",
        alias = "correct_answer",
        alias = "correctIndex"
    )]
    answer: Option<Value>,
    #[serde(alias = "point", alias = "score")]
    points: Option<u32>,
    #[serde(alias = "explain", alias = "penjelasan")]
    explanation: Option<String>,
    #[serde(alias = "level")]
    difficulty: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBank {
    Versioned {
        version: Option<Value>,
        categories: BTreeMap<String, Vec<Value>>,
    },
    Flat(BTreeMap<String, Vec<Value>>),
}

pub fn parse_bank(json: &str) -> Result<QuestionBank> {
    let raw: RawBank = serde_json::from_str(json)?;
    let (version, groups) = match raw {
        RawBank::Versioned {
            version,
            categories,
        } => (version.map(version_string), categories),
        RawBank::Flat(groups) => (None, groups),
    };

    let mut questions = Vec::new();
    for (category, records) in groups {
        for (n, record) in records.into_iter().enumerate() {
            match normalize(&category, n, record) {
                Ok(q) => questions.push(q),
                Err(reason) => log::warn!("skipping question {}#{}: {}", category, n + 1, reason),
            }
        }
    }

    Ok(QuestionBank { version, questions })
}

fn version_string(v: Value) -> String {
    match v {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn normalize(category: &str, n: usize, record: Value) -> std::result::Result<Question, String> {
    let raw: RawQuestion = serde_json::from_value(record).map_err(|e| e.to_string())?;

    let prompt = raw
        .prompt
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or("missing prompt")?;
    let options = raw.options.unwrap_or_default();
    let answer_value = raw.answer.ok_or("missing correct answer")?;

    let kind = match raw.r#type.as_deref() {
        Some(t) => QuestionKind::from_str(t).ok_or_else(|| format!("unknown type '{}'", t))?,
        None => infer_kind(&answer_value, &options),
    };

    let answer = match kind {
        QuestionKind::SingleChoice => {
            AnswerValue::Choice(choice_index(&answer_value, &options)?)
        }
        QuestionKind::TrueFalse => AnswerValue::Bool(bool_answer(&answer_value)?),
        QuestionKind::FillBlank => AnswerValue::Text(text_answer(&answer_value)?),
    };

    let difficulty = match raw.difficulty.as_deref() {
        Some(d) => Difficulty::from_str(d).unwrap_or_else(|| {
            log::warn!("unknown difficulty '{}', using medium", d);
            Difficulty::Medium
        }),
        None => Difficulty::default(),
    };

    let id = match raw.id {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::Number(num)) => format!("{}-{}", category, num),
        _ => format!("{}-{}", category, n + 1),
    };

    let question = Question {
        id,
        prompt,
        options: if kind == QuestionKind::SingleChoice {
            options
        } else {
            Vec::new()
        },
        answer,
        points: raw.points.unwrap_or(DEFAULT_POINTS),
        explanation: raw.explanation.filter(|e| !e.trim().is_empty()),
        difficulty,
        category: Some(category.to_string()),
        tags: raw.tags,
    };
    question.validate()?;
    Ok(question)
}

fn infer_kind(answer: &Value, options: &[String]) -> QuestionKind {
    match answer {
        Value::Bool(_) => QuestionKind::TrueFalse,
        _ if !options.is_empty() => QuestionKind::SingleChoice,
        Value::Number(_) => QuestionKind::SingleChoice,
        _ => QuestionKind::FillBlank,
    }
}

fn choice_index(answer: &Value, options: &[String]) -> std::result::Result<usize, String> {
    match answer {
        Value::Number(n) => n
            .as_u64()
            .map(|i| i as usize)
            .ok_or_else(|| format!("invalid answer index {}", n)),
        Value::String(s) => {
            let wanted = s.trim();
            if let Some(i) = options.iter().position(|o| o.trim() == wanted) {
                return Ok(i);
            }
            // Single letters A-Z
            let mut chars = wanted.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if c.is_ascii_alphabetic() {
                    return Ok((c.to_ascii_uppercase() as u8 - b'A') as usize);
                }
            }
            wanted
                .parse::<usize>()
                .map_err(|_| format!("answer '{}' matches no option", s))
        }
        other => Err(format!("unsupported choice answer {}", other)),
    }
}

fn bool_answer(answer: &Value) -> std::result::Result<bool, String> {
    match answer {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_u64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(format!("{} is not a true/false answer", n)),
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "benar" | "b" | "t" | "ya" => Ok(true),
            "false" | "salah" | "s" | "f" | "tidak" => Ok(false),
            other => Err(format!("'{}' is not a true/false answer", other)),
        },
        other => Err(format!("unsupported true/false answer {}", other)),
    }
}

fn text_answer(answer: &Value) -> std::result::Result<String, String> {
    match answer {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("unsupported fill-in answer {}", other)),
    }
}

pub fn builtin() -> QuestionBank {
    match parse_bank(BUILTIN_BANK) {
        Ok(bank) => bank,
        Err(e) => {
            log::error!("built-in question bank is unreadable: {}", e);
            QuestionBank {
                version: None,
                questions: Vec::new(),
            }
        }
    }
}

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<QuestionBank> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| QuizError::ExternalLoad(format!("{}: {}", path.display(), e)))?;
    parse_bank(&text).map_err(|e| QuizError::ExternalLoad(format!("{}: {}", path.display(), e)))
}

pub fn load_from_url(url: &str) -> Result<QuestionBank> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| QuizError::ExternalLoad(e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| QuizError::ExternalLoad(format!("{}: {}", url, e)))?;
    if !response.status().is_success() {
        return Err(QuizError::ExternalLoad(format!(
            "{}: HTTP {}",
            url,
            response.status()
        )));
    }
    let text = response
        .text()
        .map_err(|e| QuizError::ExternalLoad(format!("{}: {}", url, e)))?;
    parse_bank(&text).map_err(|e| QuizError::ExternalLoad(format!("{}: {}", url, e)))
}

/// Loads from a path or http(s) URL. An empty result counts as a failed load.
pub fn load(source: &str) -> Result<QuestionBank> {
    let bank = if source.starts_with("http://") || source.starts_with("https://") {
        load_from_url(source)?
    } else {
        load_from_path(source)?
    };
    if bank.is_empty() {
        return Err(QuizError::ExternalLoad(format!(
            "{}: no usable questions",
            source
        )));
    }
    Ok(bank)
}

pub fn load_or_builtin(source: Option<&str>) -> QuestionBank {
    let Some(source) = source else {
        return builtin();
    };
    match load(source) {
        Ok(bank) => {
            log::info!("loaded {} questions from {}", bank.len(), source);
            bank
        }
        Err(e) => {
            log::warn!("{}; falling back to the built-in question bank", e);
            builtin()
        }
    }
}
