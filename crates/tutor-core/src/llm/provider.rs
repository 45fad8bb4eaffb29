//! LlmProvider trait definition.
//!
//! This is the core abstraction the Gemini client (and test doubles)
//! implement. Uses RPITIT for `complete`.

use tutor_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM completion backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). The model to
/// call travels in the request, so one provider instance serves both tiers.
///
/// Implementations live in tutor-infra (e.g., `GeminiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}

/// Builds a provider bound to a credential.
///
/// The session only learns the credential at runtime (restore or save), so
/// it owns a factory rather than a ready-made provider.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, api_key: &secrecy::SecretString) -> Result<super::BoxLlmProvider, LlmError>;
}
