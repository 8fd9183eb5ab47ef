//! API request model for the chat completion proxy.
//!
//! Successful responses are the normalized [`ChatCompletion`](crate::chat::ChatCompletion).

use crate::chat::{ChatCompletionRequest, ChatMessage, ChatRole};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MAX_MODEL_CHARS: usize = 100;
pub const MAX_MESSAGES: usize = 32;
pub const MAX_MESSAGE_CHARS: usize = 5000;
pub const MAX_NAME_CHARS: usize = 64;
pub const MAX_TOTAL_CONTENT_CHARS: usize = 8000;
pub const MAX_TOKENS_LIMIT: f64 = 2048.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SmartMessage {
    /// `system`, `user` or `assistant`
    pub role: Option<String>,
    pub content: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SmartRequest {
    pub model: Option<String>,
    pub messages: Option<Vec<SmartMessage>>,
    /// 0 to 2
    pub temperature: Option<f64>,
    /// Integer, 1 to 2048
    pub max_tokens: Option<f64>,
    /// 0 to 1
    pub top_p: Option<f64>,
}

/// Why a proxy request was refused before reaching the provider
#[derive(Debug, Clone, PartialEq)]
pub enum SmartRequestError {
    Invalid(Vec<String>),
    /// Every message was individually fine but together they exceed the budget
    TooLarge,
}

impl SmartRequest {
    pub fn validate(self) -> Result<ChatCompletionRequest, SmartRequestError> {
        let mut problems = Vec::new();

        let model = self.model.map(|m| m.trim().to_string()).unwrap_or_default();
        if model.is_empty() {
            problems.push("model is required".to_string());
        } else if model.chars().count() > MAX_MODEL_CHARS {
            problems.push(format!("model must be at most {MAX_MODEL_CHARS} characters"));
        }

        let raw_messages = self.messages.unwrap_or_default();
        if raw_messages.is_empty() {
            problems.push("messages must contain at least 1 message".to_string());
        } else if raw_messages.len() > MAX_MESSAGES {
            problems.push(format!("messages must contain at most {MAX_MESSAGES} messages"));
        }
        let messages: Vec<ChatMessage> = raw_messages
            .into_iter()
            .enumerate()
            .filter_map(|(i, message)| validate_message(i, message, &mut problems))
            .collect();

        let temperature = check_range(self.temperature, "temperature", 0.0, 2.0, &mut problems);
        let top_p = check_range(self.top_p, "top_p", 0.0, 1.0, &mut problems);
        let max_tokens = match self.max_tokens {
            Some(n) if n.fract() == 0.0 && (1.0..=MAX_TOKENS_LIMIT).contains(&n) => Some(n as u32),
            Some(_) => {
                problems.push("max_tokens must be an integer between 1 and 2048".to_string());
                None
            }
            None => None,
        };

        if !problems.is_empty() {
            return Err(SmartRequestError::Invalid(problems));
        }

        let total: usize = messages.iter().map(|m| m.content.chars().count()).sum();
        if total > MAX_TOTAL_CONTENT_CHARS {
            return Err(SmartRequestError::TooLarge);
        }

        Ok(ChatCompletionRequest {
            model,
            messages,
            temperature: temperature.map(|t| t as f32),
            max_tokens,
            top_p: top_p.map(|p| p as f32),
        })
    }
}

fn validate_message(index: usize, message: SmartMessage, problems: &mut Vec<String>) -> Option<ChatMessage> {
    let role = match message.role.as_deref() {
        Some("system") => Some(ChatRole::System),
        Some("user") => Some(ChatRole::User),
        Some("assistant") => Some(ChatRole::Assistant),
        _ => {
            problems.push(format!("messages[{index}].role must be one of: system, user, assistant"));
            None
        }
    };

    let content = message.content.map(|c| c.trim().to_string()).unwrap_or_default();
    if content.is_empty() {
        problems.push(format!("messages[{index}].content is required"));
    } else if content.chars().count() > MAX_MESSAGE_CHARS {
        problems.push(format!("messages[{index}].content must be at most {MAX_MESSAGE_CHARS} characters"));
    }

    let name = message.name.map(|n| n.trim().to_string());
    if let Some(name) = &name {
        let len = name.chars().count();
        if len == 0 || len > MAX_NAME_CHARS {
            problems.push(format!("messages[{index}].name must be between 1 and {MAX_NAME_CHARS} characters"));
        }
    }

    Some(ChatMessage {
        role: role?,
        content,
        name,
    })
}

fn check_range(value: Option<f64>, field: &str, min: f64, max: f64, problems: &mut Vec<String>) -> Option<f64> {
    let value = value?;
    if (min..=max).contains(&value) {
        Some(value)
    } else {
        problems.push(format!("{field} must be between {min} and {max}"));
        None
    }
}
