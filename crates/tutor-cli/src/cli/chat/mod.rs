//! Interactive CLI chat experience.
//!
//! This module implements the chat loop: topic selection, slash commands,
//! phase spinners, and markdown rendering of answers. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod progress;
pub mod renderer;
pub mod send;
