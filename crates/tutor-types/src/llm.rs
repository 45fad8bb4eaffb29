//! LLM request/response types for the tutor.
//!
//! These types model the provider-neutral shape of a completion call:
//! the request built from a conversation, the content parts of the
//! current turn, the response, and the typed error space that failure
//! classification works on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chat::Role;

/// Default primary model id.
pub const DEFAULT_PRIMARY_MODEL: &str = "gemini-2.5-flash";

/// Default fallback model id.
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-2.5-flash-lite";

/// Sampling temperature used for every tutoring request.
pub const DEFAULT_TEMPERATURE: f64 = 0.4;

/// One part of a message's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    /// Raw (decoded) bytes plus their mime type.
    InlineData { mime_type: String, data: Vec<u8> },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text(t) => Some(t),
            ContentPart::InlineData { .. } => None,
        }
    }
}

/// A prior turn replayed as context. History only ever carries text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

/// Request to an LLM provider for a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system_instruction: String,
    pub temperature: f64,
    pub history: Vec<HistoryEntry>,
    /// Content of the turn being sent.
    pub content: Vec<ContentPart>,
}

impl CompletionRequest {
    /// Same request aimed at a different model.
    pub fn for_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }
}

/// Response from an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

/// Token usage reported by the provider, when available.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Which tier of the two-model chain produced something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Primary,
    Fallback,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Primary => write!(f, "primary"),
            Tier::Fallback => write!(f, "fallback"),
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(Tier::Primary),
            "fallback" => Ok(Tier::Fallback),
            other => Err(format!("invalid tier: '{other}'")),
        }
    }
}

/// Errors from LLM provider operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("provider error ({}): {message}", status.map(|s| s.to_string()).unwrap_or_else(|| "no status".into()))]
    Provider { status: Option<u16>, message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("response blocked: {0}")]
    Blocked(String),

    #[error("empty response from model")]
    EmptyResponse,
}

impl LlmError {
    /// HTTP status associated with this error, if the provider reported one.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::RateLimited { .. } | LlmError::QuotaExhausted(_) => Some(429),
            LlmError::Overloaded(_) => Some(503),
            LlmError::Provider { status, .. } => *status,
            _ => None,
        }
    }
}
