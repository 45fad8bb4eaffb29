//! Failure classification for the two-tier chain.
//!
//! Only capacity problems (rate limit, quota, overload) justify trying the
//! fallback model. Anything else, including errors we cannot recognise,
//! would fail the same way on the second tier and is terminal.

use tutor_types::llm::LlmError;

/// What to do after a tier fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    FallbackEligible,
    Terminal,
}

/// Classify a completion error.
pub fn classify(error: &LlmError) -> FailureClass {
    match error {
        LlmError::RateLimited { .. } | LlmError::QuotaExhausted(_) | LlmError::Overloaded(_) => {
            FailureClass::FallbackEligible
        }
        LlmError::Provider {
            status: Some(429 | 503),
            ..
        } => FailureClass::FallbackEligible,
        _ => FailureClass::Terminal,
    }
}

pub fn is_fallback_eligible(error: &LlmError) -> bool {
    classify(error) == FailureClass::FallbackEligible
}
