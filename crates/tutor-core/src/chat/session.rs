//! Session controller: the user-facing operations of the tutor.
//!
//! All mutable session state lives in an explicit [`SessionContext`] that the
//! caller owns and passes in by `&mut`. Holding the only mutable borrow for
//! the duration of [`SessionController::send`] is what guarantees at most one
//! send in flight.

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{info, warn};

use tutor_types::chat::{ConversationLog, Turn};
use tutor_types::config::TutorConfig;
use tutor_types::error::RepositoryError;
use tutor_types::image::{ImageAttachment, ImageError};
use tutor_types::llm::{LlmError, Tier};
use tutor_types::topic::Topic;

use crate::chat::credential::{CredentialError, CredentialStore};
use crate::chat::store::ConversationStore;
use crate::llm::provider::ProviderFactory;
use crate::llm::request::{RequestError, RequestParams, build_request};
use crate::llm::tiered::{Attempt, Resolution, TieredCompletionOrchestrator};
use crate::storage::kv_store::KvStore;

/// What the session is doing, for loading indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPhase {
    #[default]
    Idle,
    /// Waiting on the primary model.
    Thinking,
    /// Primary hit a capacity limit; waiting on the fallback model.
    UsingFallback,
}

/// Why a send was refused before anything was appended or sent.
#[derive(Debug, thiserror::Error)]
pub enum SendRejected {
    #[error("no API key is set")]
    MissingCredential,

    #[error("no topic selected")]
    NoTopic,

    #[error("type a message or attach an image first")]
    EmptyInput,

    #[error(transparent)]
    InvalidImage(RequestError),

    #[error("could not save the message: {0}")]
    Storage(#[from] RepositoryError),
}

/// Errors from the non-send session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no API key is set")]
    MissingCredential,

    #[error("no topic selected")]
    NoTopic,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Storage(#[from] RepositoryError),

    #[error("could not create the model client: {0}")]
    Provider(#[from] LlmError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Outcome of an accepted send.
#[derive(Debug)]
pub struct SendReport {
    /// The model turn appended to the log (answer or diagnostic).
    pub turn: Turn,
    pub resolution: Resolution,
    pub attempts: Vec<Attempt>,
    /// Set when the model turn could not be written to storage. The turn is
    /// still in the in-memory log.
    pub persist_error: Option<RepositoryError>,
}

/// The topic currently open and its log.
#[derive(Debug)]
struct ActiveTopic {
    topic: Topic,
    log: ConversationLog,
}

/// Mutable state of one tutoring session.
#[derive(Debug)]
pub struct SessionContext {
    credential: Option<SecretString>,
    orchestrator: Option<TieredCompletionOrchestrator>,
    active: Option<ActiveTopic>,
    input: String,
    image: Option<ImageAttachment>,
    phase: watch::Sender<SendPhase>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let (phase, _) = watch::channel(SendPhase::Idle);
        Self {
            credential: None,
            orchestrator: None,
            active: None,
            input: String::new(),
            image: None,
            phase,
        }
    }

    pub fn credential(&self) -> Option<&SecretString> {
        self.credential.as_ref()
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn active_topic(&self) -> Option<Topic> {
        self.active.as_ref().map(|a| a.topic)
    }

    /// Log of the active topic.
    pub fn log(&self) -> Option<&ConversationLog> {
        self.active.as_ref().map(|a| &a.log)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub fn phase(&self) -> SendPhase {
        *self.phase.borrow()
    }

    /// Watch phase changes, e.g. to drive a spinner while a send is awaited.
    pub fn subscribe(&self) -> watch::Receiver<SendPhase> {
        self.phase.subscribe()
    }

    fn set_phase(&self, phase: SendPhase) {
        self.phase.send_replace(phase);
    }

    fn clear_pending(&mut self) {
        self.input.clear();
        self.image = None;
    }
}

/// Drives the session: credential, topic selection, and sends.
///
/// Generic over `KvStore` and `ProviderFactory` so tutor-core never depends
/// on tutor-infra.
pub struct SessionController<K: KvStore + Clone, F: ProviderFactory> {
    conversations: ConversationStore<K>,
    credentials: CredentialStore<K>,
    factory: F,
    config: TutorConfig,
}

impl<K: KvStore + Clone, F: ProviderFactory> SessionController<K, F> {
    pub fn new(kv: K, factory: F, config: TutorConfig) -> Self {
        Self {
            conversations: ConversationStore::new(kv.clone()),
            credentials: CredentialStore::new(kv),
            factory,
            config,
        }
    }

    pub fn config(&self) -> &TutorConfig {
        &self.config
    }

    pub fn conversations(&self) -> &ConversationStore<K> {
        &self.conversations
    }

    // --- Credential ---

    /// Load a previously saved credential. Returns whether one was found.
    pub async fn restore(&self, ctx: &mut SessionContext) -> Result<bool, SessionError> {
        match self.credentials.load().await? {
            Some(secret) => {
                self.install_credential(ctx, secret)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Trim, persist, and activate a new credential.
    pub async fn save_credential(
        &self,
        ctx: &mut SessionContext,
        raw: &str,
    ) -> Result<(), SessionError> {
        let secret = self.credentials.save(raw).await?;
        self.install_credential(ctx, secret)
    }

    /// Forget the credential. Also closes the active topic; stored logs stay.
    pub async fn clear_credential(&self, ctx: &mut SessionContext) -> Result<(), SessionError> {
        self.credentials.clear().await?;
        ctx.credential = None;
        ctx.orchestrator = None;
        ctx.active = None;
        ctx.clear_pending();
        ctx.set_phase(SendPhase::Idle);
        Ok(())
    }

    fn install_credential(
        &self,
        ctx: &mut SessionContext,
        secret: SecretString,
    ) -> Result<(), SessionError> {
        let provider = self.factory.create(&secret)?;
        ctx.orchestrator = Some(TieredCompletionOrchestrator::new(
            provider,
            self.config.primary_model.clone(),
            self.config.fallback_model.clone(),
        ));
        ctx.credential = Some(secret);
        Ok(())
    }

    // --- Topics ---

    /// Open `topic`, loading its stored log. Any pending image is dropped.
    pub async fn select_topic(
        &self,
        ctx: &mut SessionContext,
        topic: Topic,
    ) -> Result<(), SessionError> {
        if !ctx.has_credential() {
            return Err(SessionError::MissingCredential);
        }
        let log = self.conversations.load(topic).await?;
        info!(topic = %topic, turns = log.len(), "Topic selected");
        ctx.active = Some(ActiveTopic { topic, log });
        ctx.image = None;
        ctx.set_phase(SendPhase::Idle);
        Ok(())
    }

    /// Return to the topic catalog. The log stays in storage.
    pub fn leave_topic(&self, ctx: &mut SessionContext) {
        ctx.active = None;
        ctx.clear_pending();
    }

    /// Wipe the active topic's log.
    pub async fn clear_history(&self, ctx: &mut SessionContext) -> Result<(), SessionError> {
        let active = ctx.active.as_mut().ok_or(SessionError::NoTopic)?;
        self.conversations.clear(active.topic, &mut active.log).await?;
        info!(topic = %active.topic, "History cleared");
        Ok(())
    }

    // --- Pending input ---

    pub fn set_input(&self, ctx: &mut SessionContext, text: impl Into<String>) {
        ctx.input = text.into();
    }

    /// Attach an image to the next send, enforcing the configured limit.
    pub fn attach_image(
        &self,
        ctx: &mut SessionContext,
        image: ImageAttachment,
    ) -> Result<(), SessionError> {
        let limit = self.config.image_limit();
        if image.size() > limit {
            return Err(ImageError::TooLarge {
                size: image.size(),
                max: limit,
            }
            .into());
        }
        ctx.image = Some(image);
        Ok(())
    }

    pub fn detach_image(&self, ctx: &mut SessionContext) {
        ctx.image = None;
    }

    // --- Send ---

    /// Send the pending input (text and/or image) on the active topic.
    ///
    /// On acceptance the user turn is appended and the pending input cleared
    /// before any network call. The call always ends with exactly one model
    /// turn appended and the phase back at `Idle`.
    pub async fn send(&self, ctx: &mut SessionContext) -> Result<SendReport, SendRejected> {
        if ctx.orchestrator.is_none() {
            return Err(SendRejected::MissingCredential);
        }
        let Some(topic) = ctx.active_topic() else {
            return Err(SendRejected::NoTopic);
        };
        if ctx.input.trim().is_empty() && ctx.image.is_none() {
            return Err(SendRejected::EmptyInput);
        }

        let instruction = self.config.instruction_for(topic);
        let params = RequestParams {
            model: &self.config.primary_model,
            system_instruction: &instruction,
            temperature: self.config.temperature,
        };

        let SessionContext {
            orchestrator,
            active,
            input,
            image,
            phase,
            ..
        } = ctx;
        let (Some(orchestrator), Some(active)) = (orchestrator.as_ref(), active.as_mut()) else {
            return Err(SendRejected::NoTopic);
        };

        // History must exclude the turn being sent.
        let request = build_request(params, &active.log, input.as_str(), image.as_ref())
            .map_err(SendRejected::InvalidImage)?;

        self.conversations
            .append(topic, &mut active.log, Turn::user(input.clone(), image.clone()))
            .await?;
        input.clear();
        *image = None;

        phase.send_replace(SendPhase::Thinking);
        let completion = orchestrator
            .complete(&request, |tier| {
                if tier == Tier::Fallback {
                    phase.send_replace(SendPhase::UsingFallback);
                }
            })
            .await;

        let persist_error = match self
            .conversations
            .append(topic, &mut active.log, completion.turn.clone())
            .await
        {
            Ok(()) => None,
            Err(e) => {
                warn!(topic = %topic, error = %e, "Could not persist model turn");
                active.log.push(completion.turn.clone());
                Some(e)
            }
        };
        phase.send_replace(SendPhase::Idle);

        Ok(SendReport {
            turn: completion.turn,
            resolution: completion.resolution,
            attempts: completion.attempts,
            persist_error,
        })
    }
}
