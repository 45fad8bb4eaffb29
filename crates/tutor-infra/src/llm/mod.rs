//! LLM provider implementations.
//!
//! Contains the Gemini implementation of the [`LlmProvider`] trait defined
//! in `tutor-core`, and [`GeminiProviderFactory`], which builds a provider
//! once the session knows its API key.
//!
//! [`LlmProvider`]: tutor_core::llm::provider::LlmProvider

pub mod gemini;

use std::time::Duration;

use secrecy::SecretString;

use tutor_core::llm::box_provider::BoxLlmProvider;
use tutor_core::llm::provider::ProviderFactory;
use tutor_types::config::TutorConfig;
use tutor_types::llm::LlmError;

use self::gemini::GeminiProvider;

/// Creates [`GeminiProvider`]s bound to a credential.
#[derive(Debug, Clone)]
pub struct GeminiProviderFactory {
    base_url: String,
    timeout: Duration,
}

impl GeminiProviderFactory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn from_config(config: &TutorConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

impl ProviderFactory for GeminiProviderFactory {
    fn create(&self, api_key: &SecretString) -> Result<BoxLlmProvider, LlmError> {
        let provider = GeminiProvider::new(api_key.clone(), &self.base_url, self.timeout)?;
        Ok(BoxLlmProvider::new(provider))
    }
}
