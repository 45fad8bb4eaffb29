//! Slash command parsing and execution for the chat loop.
//!
//! Commands start with `/` and control the pending image, the topic's
//! history, and navigation back to the catalog.

use std::path::PathBuf;

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Attach an image file to the next message.
    Image(PathBuf),
    /// Remove the pending image.
    DropImage,
    /// Show the conversation so far.
    History,
    /// Delete this topic's conversation.
    ClearHistory,
    /// Leave the topic and pick another.
    Topics,
    /// Exit the chat session.
    Exit,
    /// Unknown command or bad arguments.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let arg = parts.get(1).map(|s| s.trim()).filter(|s| !s.is_empty());

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/image" | "/img" => match arg {
            Some(path) => Some(ChatCommand::Image(PathBuf::from(unquote(path)))),
            None => Some(ChatCommand::Unknown("/image requires a file path".to_string())),
        },
        "/drop-image" => Some(ChatCommand::DropImage),
        "/history" => Some(ChatCommand::History),
        "/clear-history" => Some(ChatCommand::ClearHistory),
        "/topics" | "/back" => Some(ChatCommand::Topics),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Strip one pair of surrounding quotes, as left by drag-and-drop.
fn unquote(path: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = path.strip_prefix(q).and_then(|p| p.strip_suffix(q)) {
            return inner;
        }
    }
    path
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}          {}", style("/help").cyan(), "Show this help message");
    println!("  {}  {}", style("/image <path>").cyan(), "Attach an image to your next message");
    println!("  {}    {}", style("/drop-image").cyan(), "Remove the attached image");
    println!("  {}       {}", style("/history").cyan(), "Show this topic's conversation");
    println!("  {} {}", style("/clear-history").cyan(), "Delete this topic's conversation");
    println!("  {}        {}", style("/topics").cyan(), "Switch to another topic");
    println!("  {}          {}", style("/exit").cyan(), "End the session");
    println!();
    println!(
        "  {}",
        style("Ctrl+D to exit, Ctrl+C keeps the session open").dim()
    );
    println!();
}
