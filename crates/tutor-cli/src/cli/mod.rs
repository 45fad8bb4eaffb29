//! CLI command definitions and dispatch for the `tutor` binary.
//!
//! Uses clap derive macros for argument parsing. Commands follow a
//! noun-verb pattern (e.g., `tutor key set`, `tutor history show math`).

pub mod ask;
pub mod chat;
pub mod history;
pub mod key;
pub mod topics;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use tutor_types::topic::Topic;

/// Study with a Gemini-backed tutor, one subject at a time.
#[derive(Parser)]
#[command(name = "tutor", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the Gemini API key.
    Key {
        #[command(subcommand)]
        action: KeyCommand,
    },

    /// List the available topics.
    Topics,

    /// Start an interactive tutoring session.
    Chat {
        /// Topic to open (e.g. math, physics). Prompts when omitted.
        topic: Option<Topic>,
    },

    /// Send a single message and print the answer.
    Ask {
        /// Topic to ask in.
        topic: Topic,

        /// Message text. May be omitted when an image is attached.
        text: Option<String>,

        /// Attach an image file.
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Show or clear a topic's conversation.
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum KeyCommand {
    /// Save the API key (prompts with hidden input when --value is omitted).
    Set {
        /// Key value, for scripts.
        #[arg(long)]
        value: Option<String>,
    },

    /// Forget the saved API key.
    Clear {
        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Show whether a key is saved.
    Status,
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// Print a topic's conversation.
    Show {
        topic: Topic,

        /// Only the last N turns.
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Delete a topic's conversation.
    Clear {
        topic: Topic,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}
