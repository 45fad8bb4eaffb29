//! Conversation history commands: show, clear.

use anyhow::Result;
use console::style;
use dialoguer::Confirm;

use tutor_types::chat::{ConversationLog, Role, Turn};
use tutor_types::topic::Topic;

use crate::state::AppState;

/// Print a topic's stored conversation, optionally only the last `limit` turns.
pub async fn show_history(
    state: &AppState,
    topic: Topic,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let log = state.controller.conversations().load(topic).await?;
    let turns = tail(&log, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(turns)?);
        return Ok(());
    }

    if turns.is_empty() {
        println!();
        println!(
            "  {} No conversation yet for {}.",
            style("i").blue().bold(),
            style(topic.label()).cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    for turn in turns {
        println!("  {}", summary_line(turn));
    }
    println!();
    Ok(())
}

/// Confirmation question shown before a conversation is deleted.
pub fn clear_prompt(topic: Topic) -> String {
    format!("Delete the {} conversation?", topic.label())
}

/// Delete a topic's stored conversation.
pub async fn clear_history(state: &AppState, topic: Topic, force: bool, json: bool) -> Result<()> {
    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(clear_prompt(topic))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let mut log = state.controller.conversations().load(topic).await?;
    let removed = log.len();
    state.controller.conversations().clear(topic, &mut log).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "cleared": true, "topic": topic.id(), "turns": removed })
        );
    } else {
        println!(
            "  {} Cleared {} ({} turns)",
            style("✓").green().bold(),
            style(topic.label()).cyan(),
            removed
        );
    }
    Ok(())
}

fn tail(log: &ConversationLog, limit: Option<usize>) -> &[Turn] {
    let turns = log.turns();
    match limit {
        Some(n) if n < turns.len() => &turns[turns.len() - n..],
        _ => turns,
    }
}

/// One-line rendering of a turn: role label, optional markers, text preview.
pub fn summary_line(turn: &Turn) -> String {
    let label = match turn.role() {
        Role::User => format!("{}", style("You").green().bold()),
        Role::Model => format!("{}", style("Tutor").cyan().bold()),
    };

    let mut markers = String::new();
    if let Some(image) = turn.image() {
        markers.push_str(&format!(" {}", style(format!("[{}]", image.mime_type())).magenta()));
    }
    if turn.is_fallback() {
        markers.push_str(&format!(" {}", style("⚡ lite").yellow()));
    }

    format!("{label}{markers} {}", preview(turn.text(), 100))
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max_chars {
        let cut: String = flat.chars().take(max_chars - 3).collect();
        format!("{cut}...")
    } else {
        flat
    }
}
