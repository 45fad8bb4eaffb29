//! One-shot question: `tutor ask <topic> [text] [--image path]`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use tutor_core::llm::tiered::Resolution;
use tutor_infra::image::load_image;
use tutor_types::topic::Topic;

use crate::state::AppState;

use super::chat::renderer::ChatRenderer;
use super::chat::send::{print_report, resolution_label, send_pending};

/// Send one message on `topic` and print the answer.
///
/// The exchange is stored in the topic's history like any chat message.
/// Returns `false` when every tier failed and the answer is a diagnostic.
pub async fn ask(
    state: &AppState,
    topic: Topic,
    text: Option<String>,
    image: Option<PathBuf>,
    json: bool,
    quiet: bool,
) -> Result<bool> {
    let controller = &state.controller;
    let mut ctx = state.session().await?;
    if !ctx.has_credential() {
        anyhow::bail!("No API key saved. Add one with: tutor key set");
    }

    controller.select_topic(&mut ctx, topic).await?;
    if let Some(path) = image {
        let attachment = load_image(&path, controller.config().image_limit())
            .await
            .with_context(|| format!("cannot attach {}", path.display()))?;
        controller.attach_image(&mut ctx, attachment)?;
    }
    controller.set_input(&mut ctx, text.unwrap_or_default());

    let report = send_pending(controller, &mut ctx, !json && !quiet).await?;
    let succeeded = !matches!(report.resolution, Resolution::Terminal { .. });

    if json {
        let attempts: Vec<_> = report
            .attempts
            .iter()
            .map(|a| {
                serde_json::json!({
                    "tier": a.tier,
                    "model": a.model,
                    "latency_ms": a.latency_ms,
                    "error": a.error.as_ref().map(|e| e.to_string()),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "topic": topic.id(),
                "resolution": resolution_label(&report.resolution),
                "text": report.turn.text(),
                "attempts": attempts,
                "saved": report.persist_error.is_none(),
            }))?
        );
    } else if quiet {
        println!("{}", report.turn.text());
    } else {
        print_report(&ChatRenderer::new(None), &report);
    }

    Ok(succeeded)
}
