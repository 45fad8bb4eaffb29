//! Infrastructure layer for the tutor.
//!
//! Contains implementations of the traits defined in `tutor-core`: SQLite
//! key-value storage, the Gemini HTTP provider, configuration loading, and
//! image file ingestion.

pub mod config;
pub mod image;
pub mod llm;
pub mod sqlite;
