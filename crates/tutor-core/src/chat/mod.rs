//! Conversation state: per-topic logs, the credential, and the session
//! controller that ties them to the completion pipeline.

pub mod credential;
pub mod session;
pub mod store;
