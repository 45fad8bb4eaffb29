//! Sending the pending input and showing the outcome.

use console::style;

use tutor_core::chat::session::{SendRejected, SendReport, SessionContext};
use tutor_core::llm::tiered::Resolution;

use crate::state::ConcreteController;

use super::progress::PhaseSpinner;
use super::renderer::ChatRenderer;

/// Send the session's pending input with a phase spinner running.
pub async fn send_pending(
    controller: &ConcreteController,
    ctx: &mut SessionContext,
    show_spinner: bool,
) -> Result<SendReport, SendRejected> {
    let spinner = PhaseSpinner::start(ctx.subscribe(), show_spinner);
    let result = controller.send(ctx).await;
    spinner.finish();
    result
}

/// Short label for how a send resolved.
pub fn resolution_label(resolution: &Resolution) -> &'static str {
    match resolution {
        Resolution::Primary => "primary",
        Resolution::Fallback => "fallback",
        Resolution::Terminal { .. } => "failed",
    }
}

/// Print the model turn of an accepted send.
pub fn print_report(renderer: &ChatRenderer, report: &SendReport) {
    println!();
    match &report.resolution {
        Resolution::Terminal { .. } => {
            println!("  {}", style("Tutor").red().bold());
            for line in report.turn.text().lines() {
                println!("  {}", style(line).red());
            }
        }
        Resolution::Primary | Resolution::Fallback => {
            println!(
                "  {}{}",
                style("Tutor").cyan().bold(),
                ChatRenderer::badge(&report.turn)
            );
            println!("{}", renderer.render_final(report.turn.text()).trim_end());
            renderer.print_stats_footer(&report.attempts);
        }
    }
    if let Some(err) = &report.persist_error {
        eprintln!(
            "  {} This answer could not be saved and will be lost on exit: {err}",
            style("!").yellow().bold()
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_types::llm::{LlmError, Tier};

    #[test]
    fn test_resolution_label() {
        assert_eq!(resolution_label(&Resolution::Primary), "primary");
        assert_eq!(resolution_label(&Resolution::Fallback), "fallback");
        assert_eq!(
            resolution_label(&Resolution::Terminal {
                failed_tier: Tier::Primary,
                error: LlmError::EmptyResponse,
            }),
            "failed"
        );
    }
}
