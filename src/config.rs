use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QuizError, Result};
use crate::models::{Difficulty, SessionConfig};

const APP_DIR: &str = "netquiz";
const DEFAULT_DB_NAME: &str = "netquiz.db";
const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_CONFIG: &str = "NETQUIZ_CONFIG";
pub const ENV_DB: &str = "NETQUIZ_DB";
pub const ENV_BANK: &str = "NETQUIZ_BANK";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: Option<PathBuf>,
    /// Question bank file path or http(s) URL. Unset uses the built-in bank.
    pub bank: Option<String>,
    pub learner: Option<String>,
    pub quiz: QuizDefaults,
    pub tutor: TutorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizDefaults {
    pub count: usize,
    pub time_limit_secs: Option<u32>,
    pub pass_threshold: u8,
    pub shuffle_questions: bool,
    pub shuffle_options: bool,
    pub allow_back: bool,
    pub auto_advance_ms: Option<u64>,
    pub auto_submit: bool,
}

impl Default for QuizDefaults {
    fn default() -> Self {
        let base = SessionConfig::default();
        Self {
            count: base.count,
            time_limit_secs: base.time_limit,
            pass_threshold: base.pass_threshold,
            shuffle_questions: base.shuffle_questions,
            shuffle_options: base.shuffle_options,
            allow_back: base.allow_back,
            auto_advance_ms: None,
            auto_submit: base.auto_submit,
        }
    }
}

impl QuizDefaults {
    pub fn session_config(
        &self,
        category: Option<String>,
        difficulty: Option<Difficulty>,
    ) -> SessionConfig {
        SessionConfig {
            category,
            difficulty,
            count: self.count,
            time_limit: self.time_limit_secs,
            shuffle_questions: self.shuffle_questions,
            shuffle_options: self.shuffle_options,
            pass_threshold: self.pass_threshold,
            allow_back: self.allow_back,
            auto_advance: self.auto_advance_ms.map(Duration::from_millis),
            auto_submit: self.auto_submit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub system_prompt: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "NETQUIZ_TUTOR_API_KEY".to_string(),
            system_prompt: None,
            timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Reads the config file (if any) and applies environment overrides.
    pub fn load() -> Result<Self> {
        let path = config_path();
        let mut config = if path.exists() {
            log::debug!("reading config from {}", path.display());
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| QuizError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| QuizError::Config(e.to_string()))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup(ENV_DB).filter(|v| !v.is_empty()) {
            self.db_path = Some(PathBuf::from(db));
        }
        if let Some(bank) = lookup(ENV_BANK).filter(|v| !v.is_empty()) {
            self.bank = Some(bank);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.quiz.pass_threshold > 100 {
            return Err(QuizError::Config(format!(
                "pass_threshold must be between 0 and 100, got {}",
                self.quiz.pass_threshold
            )));
        }
        if self.quiz.time_limit_secs == Some(0) {
            return Err(QuizError::Config(
                "time_limit_secs must be positive; omit it for no limit".to_string(),
            ));
        }
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        if let Some(path) = &self.db_path {
            return path.clone();
        }
        app_dir().join(DEFAULT_DB_NAME)
    }
}

fn app_dir() -> PathBuf {
    let dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&dir).ok();
    dir
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        return PathBuf::from(path);
    }
    app_dir().join(CONFIG_FILE_NAME)
}
