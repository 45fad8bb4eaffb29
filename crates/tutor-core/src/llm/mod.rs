//! LLM provider abstractions and the tiered completion pipeline.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `request`: builds requests from conversation state
//! - `classifier`: decides whether a failure may fall back
//! - `tiered`: primary-then-fallback orchestration

pub mod box_provider;
pub mod classifier;
pub mod provider;
pub mod request;
pub mod tiered;

pub use box_provider::BoxLlmProvider;
pub use provider::{LlmProvider, ProviderFactory};
