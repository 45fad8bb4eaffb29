//! Configuration types for the tutor.
//!
//! `TutorConfig` represents the `config.toml` in the data directory. Every
//! field has a default, so an empty (or missing) file is a valid config.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::image::MAX_IMAGE_BYTES;
use crate::llm::{DEFAULT_FALLBACK_MODEL, DEFAULT_PRIMARY_MODEL, DEFAULT_TEMPERATURE};
use crate::topic::Topic;

/// Default Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Top-level configuration.
///
/// Loaded from `~/.tutor/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorConfig {
    /// Model tried first for every send.
    #[serde(default = "default_primary_model")]
    pub primary_model: String,

    /// Model tried once when the primary is rate limited or overloaded.
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP timeout for a single completion call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Image size ceiling. Values above 5 MiB are clamped.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,

    /// Per-topic replacements for the built-in system instruction,
    /// keyed by topic id (e.g. `Math`, `J_History`).
    #[serde(default)]
    pub instructions: HashMap<String, String>,
}

fn default_primary_model() -> String {
    DEFAULT_PRIMARY_MODEL.to_string()
}

fn default_fallback_model() -> String {
    DEFAULT_FALLBACK_MODEL.to_string()
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_image_bytes() -> u64 {
    MAX_IMAGE_BYTES
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            primary_model: default_primary_model(),
            fallback_model: default_fallback_model(),
            temperature: default_temperature(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_image_bytes: default_max_image_bytes(),
            instructions: HashMap::new(),
        }
    }
}

impl TutorConfig {
    /// System instruction for `topic`, honoring overrides.
    pub fn instruction_for(&self, topic: Topic) -> String {
        self.instructions
            .get(topic.id())
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| topic.default_instruction())
    }

    /// Effective image ceiling (never above [`MAX_IMAGE_BYTES`]).
    pub fn image_limit(&self) -> u64 {
        self.max_image_bytes.min(MAX_IMAGE_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = TutorConfig::default();
        assert_eq!(config.primary_model, "gemini-2.5-flash");
        assert_eq!(config.fallback_model, "gemini-2.5-flash-lite");
        assert!((config.temperature - 0.4).abs() < f64::EPSILON);
        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.image_limit(), 5 * 1024 * 1024);
        assert!(config.instructions.is_empty());
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: TutorConfig = toml::from_str("").unwrap();
        assert_eq!(config.primary_model, DEFAULT_PRIMARY_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_config_deserialize_with_values() {
        let toml_str = r#"
primary_model = "gemini-2.5-pro"
temperature = 0.2
max_image_bytes = 99999999

[instructions]
Math = "Answer in one line."
J_History = "Cite the era."
"#;
        let config: TutorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.primary_model, "gemini-2.5-pro");
        assert_eq!(config.fallback_model, DEFAULT_FALLBACK_MODEL);
        assert_eq!(config.image_limit(), MAX_IMAGE_BYTES);
        assert_eq!(config.instruction_for(Topic::Math), "Answer in one line.");
        assert_eq!(config.instruction_for(Topic::JapaneseHistory), "Cite the era.");
        assert_eq!(
            config.instruction_for(Topic::Physics),
            Topic::Physics.default_instruction()
        );
    }

    #[test]
    fn test_blank_override_ignored() {
        let mut config = TutorConfig::default();
        config.instructions.insert("Free".to_string(), "   ".to_string());
        assert_eq!(config.instruction_for(Topic::Free), Topic::Free.default_instruction());
    }
}
