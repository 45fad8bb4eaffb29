//! Welcome banner display for chat sessions.

use console::style;

use tutor_types::topic::Topic;

/// Print the banner shown when a topic is opened.
pub fn print_welcome_banner(topic: Topic, primary: &str, fallback: &str, turns: usize) {
    println!();
    println!("  {} {}", style("✎").bold(), style(topic.label()).cyan().bold());
    println!();
    println!("  {}  {}", style("Model:").bold(), style(primary).dim());
    println!(
        "  {}  {}",
        style("Fallback:").bold(),
        style(fallback).dim()
    );
    if turns > 0 {
        println!(
            "  {}  {}",
            style("History:").bold(),
            style(format!("{turns} turns (/history to view)")).dim()
        );
    }
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
