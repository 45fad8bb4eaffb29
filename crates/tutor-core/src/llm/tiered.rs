//! Two-tier completion with a single fallback hop.
//!
//! A send starts on the primary model. If it fails with a capacity error
//! (see [`classify`](super::classifier::classify)) the exact same request is
//! replayed once against the fallback model. Every send resolves to exactly
//! one model turn: the answer, or a diagnostic turn describing the failure.
//!
//! ```text
//! Idle -> PrimaryInFlight -> Success(primary)
//!                         -> FallbackInFlight -> Success(fallback)
//!                                             -> TerminalFailure
//!                         -> TerminalFailure
//! ```

use std::time::Instant;

use tutor_types::chat::Turn;
use tutor_types::llm::{CompletionRequest, CompletionResponse, LlmError, Tier};

use super::box_provider::BoxLlmProvider;
use super::classifier::{FailureClass, classify};

/// Result of one tier call, already classified.
#[derive(Debug)]
pub enum TierOutcome {
    Success(CompletionResponse),
    /// Failed, but the fallback tier may succeed.
    Eligible(LlmError),
    Terminal(LlmError),
}

/// How a send was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Primary,
    Fallback,
    Terminal { failed_tier: Tier, error: LlmError },
}

/// One call made while resolving a send.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub tier: Tier,
    pub model: String,
    pub latency_ms: u64,
    pub error: Option<LlmError>,
}

/// Output of [`TieredCompletionOrchestrator::complete`].
#[derive(Debug, Clone)]
pub struct TieredCompletion {
    /// The model turn to append to the conversation.
    pub turn: Turn,
    pub resolution: Resolution,
    pub attempts: Vec<Attempt>,
}

/// Per-send state machine.
enum SendState {
    Idle,
    PrimaryInFlight,
    FallbackInFlight,
    Succeeded {
        tier: Tier,
        response: CompletionResponse,
    },
    Failed {
        tier: Tier,
        error: LlmError,
    },
}

/// Text of the model turn recorded when no tier produced an answer.
pub fn diagnostic_text(error: &LlmError) -> String {
    format!(
        "[An error occurred]\nDetails: {error}\n\n\
         The API key may be invalid, or every model tier may have reached its usage limit."
    )
}

/// Drives the primary-then-fallback call sequence.
#[derive(Debug)]
pub struct TieredCompletionOrchestrator {
    provider: BoxLlmProvider,
    primary_model: String,
    fallback_model: String,
}

impl TieredCompletionOrchestrator {
    pub fn new(
        provider: BoxLlmProvider,
        primary_model: impl Into<String>,
        fallback_model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            primary_model: primary_model.into(),
            fallback_model: fallback_model.into(),
        }
    }

    pub fn model_for(&self, tier: Tier) -> &str {
        match tier {
            Tier::Primary => &self.primary_model,
            Tier::Fallback => &self.fallback_model,
        }
    }

    /// Resolve `request` to a model turn.
    ///
    /// `on_tier` is invoked as each tier call starts, so callers can show a
    /// "using fallback" indicator while the second call is in flight. The
    /// request's `model` field is replaced per tier; everything else is sent
    /// unchanged to both tiers.
    pub async fn complete<F>(&self, request: &CompletionRequest, mut on_tier: F) -> TieredCompletion
    where
        F: FnMut(Tier) + Send,
    {
        let mut attempts = Vec::with_capacity(2);
        let mut state = SendState::Idle;

        loop {
            state = match state {
                SendState::Idle => SendState::PrimaryInFlight,

                SendState::PrimaryInFlight => {
                    on_tier(Tier::Primary);
                    match self.call_tier(Tier::Primary, request, &mut attempts).await {
                        TierOutcome::Success(response) => SendState::Succeeded {
                            tier: Tier::Primary,
                            response,
                        },
                        TierOutcome::Eligible(error) => {
                            tracing::warn!(
                                from = %self.primary_model,
                                to = %self.fallback_model,
                                error = %error,
                                "Primary model unavailable, falling back"
                            );
                            SendState::FallbackInFlight
                        }
                        TierOutcome::Terminal(error) => SendState::Failed {
                            tier: Tier::Primary,
                            error,
                        },
                    }
                }

                SendState::FallbackInFlight => {
                    on_tier(Tier::Fallback);
                    match self.call_tier(Tier::Fallback, request, &mut attempts).await {
                        TierOutcome::Success(response) => SendState::Succeeded {
                            tier: Tier::Fallback,
                            response,
                        },
                        // No third tier: any fallback failure is final.
                        TierOutcome::Eligible(error) | TierOutcome::Terminal(error) => {
                            SendState::Failed {
                                tier: Tier::Fallback,
                                error,
                            }
                        }
                    }
                }

                SendState::Succeeded { tier, response } => {
                    let resolution = match tier {
                        Tier::Primary => Resolution::Primary,
                        Tier::Fallback => Resolution::Fallback,
                    };
                    return TieredCompletion {
                        turn: Turn::model(response.text, Some(tier)),
                        resolution,
                        attempts,
                    };
                }

                SendState::Failed { tier, error } => {
                    tracing::error!(tier = %tier, error = %error, "Completion failed");
                    return TieredCompletion {
                        turn: Turn::model(diagnostic_text(&error), None),
                        resolution: Resolution::Terminal {
                            failed_tier: tier,
                            error,
                        },
                        attempts,
                    };
                }
            };
        }
    }

    async fn call_tier(
        &self,
        tier: Tier,
        request: &CompletionRequest,
        attempts: &mut Vec<Attempt>,
    ) -> TierOutcome {
        let model = self.model_for(tier);
        let request = request.for_model(model);
        let start = Instant::now();
        let result = self.provider.complete(&request).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        attempts.push(Attempt {
            tier,
            model: model.to_string(),
            latency_ms,
            error: result.as_ref().err().cloned(),
        });

        match result {
            Ok(response) => {
                tracing::debug!(tier = %tier, model, latency_ms, "Tier answered");
                TierOutcome::Success(response)
            }
            Err(error) => match classify(&error) {
                FailureClass::FallbackEligible => TierOutcome::Eligible(error),
                FailureClass::Terminal => TierOutcome::Terminal(error),
            },
        }
    }
}
