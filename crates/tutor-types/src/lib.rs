//! Shared domain types for the tutor.
//!
//! Conversation turns, the topic catalog, image attachments, LLM request
//! shapes, configuration, and the error enums shared across crates.
//!
//! Zero infrastructure dependencies -- only serde, base64, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod image;
pub mod llm;
pub mod topic;
