//! Topic catalog listing.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use tutor_types::topic::Topic;

use crate::state::AppState;

/// Print every topic with its stored conversation length.
pub async fn list_topics(state: &AppState, json: bool) -> Result<()> {
    let mut rows = Vec::with_capacity(Topic::ALL.len());
    for topic in Topic::ALL {
        let log = state.controller.conversations().load(topic).await?;
        rows.push((topic, log.len()));
    }

    if json {
        let entries: Vec<_> = rows
            .iter()
            .map(|(topic, turns)| {
                serde_json::json!({ "id": topic.id(), "label": topic.label(), "turns": turns })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Topic").fg(Color::White),
        Cell::new("Turns").fg(Color::White),
    ]);

    for (topic, turns) in &rows {
        let turns_cell = if *turns == 0 {
            Cell::new("-").fg(Color::DarkGrey)
        } else {
            Cell::new(turns)
        };
        table.add_row(vec![
            Cell::new(topic.id()).fg(Color::Cyan),
            Cell::new(topic.label()),
            turns_cell,
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  Start with: {}",
        style("tutor chat <id>").yellow()
    );
    println!();

    Ok(())
}
