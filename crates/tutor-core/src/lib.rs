//! Business logic and port definitions for the tutor.
//!
//! This crate defines the "ports" (provider and storage traits) that the
//! infrastructure layer implements, plus the completion pipeline and the
//! session controller. It depends only on `tutor-types` -- never on
//! `tutor-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
pub mod storage;
