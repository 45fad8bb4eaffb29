//! Storage abstractions for the tutor.
//!
//! Defines the key-value port and an in-memory implementation.
//! The SQLite implementation lives in tutor-infra.

pub mod kv_store;
pub mod memory;
