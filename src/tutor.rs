use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::TutorConfig;
use crate::error::{QuizError, Result};
use crate::models::{ChatMessage, ChatRole};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a patient tutor for an introductory computer \
networking course (OSI model, TCP/IP, addressing, common protocols and network security). \
Answer in the language the student uses, keep explanations short, and prefer guiding \
questions over handing out quiz answers.";

/// Anything that can answer a running conversation.
pub trait Tutor {
    fn ask(&self, history: &[ChatMessage]) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

pub struct HttpTutor {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
    system_prompt: String,
}

impl HttpTutor {
    pub fn from_config(config: &TutorConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                QuizError::ExternalLoad(format!(
                    "tutor is not configured: set {} to an API key",
                    config.api_key_env
                ))
            })?;
        Self::new(config, api_key)
    }

    pub fn new(config: &TutorConfig, api_key: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuizError::ExternalLoad(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        })
    }
}

impl Tutor for HttpTutor {
    fn ask(&self, history: &[ChatMessage]) -> Result<String> {
        let request = build_request(&self.model, &self.system_prompt, history);
        log::debug!(
            "asking tutor at {} with {} messages",
            self.endpoint,
            request.messages.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| QuizError::ExternalLoad(format!("tutor request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(QuizError::ExternalLoad(format!(
                "tutor returned HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| QuizError::ExternalLoad(format!("unreadable tutor reply: {}", e)))?;
        extract_reply(parsed)
    }
}

fn build_request<'a>(
    model: &'a str,
    system_prompt: &str,
    history: &[ChatMessage],
) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(history.iter().filter(|m| m.role != ChatRole::System).cloned());
    ChatRequest { model, messages }
}

fn extract_reply(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| QuizError::ExternalLoad("tutor sent an empty reply".to_string()))
}

/// A running chat with the tutor. Failed turns are rolled back so the
/// history only ever holds answered questions.
#[derive(Debug, Default, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn send(&mut self, tutor: &dyn Tutor, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(QuizError::ExternalLoad("message is empty".to_string()));
        }
        self.messages.push(ChatMessage::user(text));
        match tutor.ask(&self.messages) {
            Ok(reply) => {
                self.messages.push(ChatMessage::assistant(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.messages.pop();
                log::warn!("tutor request failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
