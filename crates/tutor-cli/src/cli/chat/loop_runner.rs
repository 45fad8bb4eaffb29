//! Main chat loop orchestration.
//!
//! Coordinates the session lifecycle: credential check, topic selection,
//! welcome banner, the input loop with slash commands and sends, and
//! returning to the catalog.

use std::path::{Path, PathBuf};

use console::style;
use crossterm::style::Color;
use dialoguer::{Confirm, Password, Select};
use tracing::debug;

use tutor_core::chat::session::{SendRejected, SessionContext};
use tutor_infra::image::load_image;
use tutor_types::image::ImageAttachment;
use tutor_types::topic::Topic;

use crate::cli::history::clear_prompt;
use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;
use super::send::{print_report, send_pending};

/// How the input loop for one topic ended.
enum TopicExit {
    /// Back to the catalog.
    Catalog,
    Quit,
}

/// Run the interactive session, optionally opening `topic` straight away.
pub async fn run_chat_loop(state: &AppState, topic: Option<Topic>) -> anyhow::Result<()> {
    let controller = &state.controller;
    let mut ctx = state.session().await?;

    if !ctx.has_credential() {
        println!();
        println!(
            "  {} A Gemini API key is needed before you can start.",
            style("i").blue().bold()
        );
        let raw = Password::new()
            .with_prompt("Enter your Gemini API key")
            .interact()?;
        controller.save_credential(&mut ctx, &raw).await?;
        println!("  {} API key saved", style("✓").green().bold());
    }

    let renderer = ChatRenderer::new(Some(Color::Cyan));
    let mut next = topic;

    loop {
        let topic = match next.take() {
            Some(topic) => topic,
            None => match pick_topic()? {
                Some(topic) => topic,
                None => break,
            },
        };

        controller.select_topic(&mut ctx, topic).await?;
        match run_topic(state, &mut ctx, &renderer).await? {
            TopicExit::Catalog => controller.leave_topic(&mut ctx),
            TopicExit::Quit => break,
        }
    }

    println!("\n  {}", style("Session ended.").dim());
    Ok(())
}

/// Show the catalog. `None` when the user backs out.
fn pick_topic() -> anyhow::Result<Option<Topic>> {
    let labels: Vec<&str> = Topic::ALL.iter().map(|t| t.label()).collect();
    let choice = Select::new()
        .with_prompt("Choose a topic")
        .items(&labels)
        .default(0)
        .interact_opt()?;
    Ok(choice.map(|i| Topic::ALL[i]))
}

async fn run_topic(
    state: &AppState,
    ctx: &mut SessionContext,
    renderer: &ChatRenderer,
) -> anyhow::Result<TopicExit> {
    let controller = &state.controller;
    let config = controller.config();
    let topic = ctx
        .active_topic()
        .ok_or_else(|| anyhow::anyhow!("no topic selected"))?;

    print_welcome_banner(
        topic,
        &config.primary_model,
        &config.fallback_model,
        ctx.log().map_or(0, |log| log.len()),
    );

    let (mut input, _writer) = ChatInput::new(prompt(None))
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let text = match input.read_line().await {
            InputEvent::Eof => return Ok(TopicExit::Quit),
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) => text,
        };

        if let Some(cmd) = commands::parse(&text) {
            match cmd {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Image(path) => {
                    let path = expand_home(&path);
                    match load_image(&path, config.image_limit()).await {
                        Ok(image) => match controller.attach_image(ctx, image) {
                            Ok(()) => println!(
                                "\n  {} Attached {}\n",
                                style("+").green().bold(),
                                style(path.display()).dim()
                            ),
                            Err(e) => println!("\n  {} {e}\n", style("!").red().bold()),
                        },
                        Err(e) => println!("\n  {} {e}\n", style("!").red().bold()),
                    }
                }
                ChatCommand::DropImage => {
                    controller.detach_image(ctx);
                    println!("\n  {}\n", style("Image removed.").dim());
                }
                ChatCommand::History => {
                    println!();
                    match ctx.log() {
                        Some(log) if !log.is_empty() => {
                            for turn in log {
                                renderer.print_turn(turn);
                            }
                        }
                        _ => println!("  {}\n", style("No messages yet.").dim()),
                    }
                }
                ChatCommand::ClearHistory => {
                    input.flush();
                    let confirmed = Confirm::new()
                        .with_prompt(clear_prompt(topic))
                        .default(false)
                        .interact_opt()?
                        .unwrap_or(false);
                    if !confirmed {
                        println!("  {}\n", style("Cancelled.").dim());
                    } else if let Err(e) = controller.clear_history(ctx).await {
                        println!("\n  {} Could not clear history: {e}\n", style("!").red().bold());
                    } else {
                        println!("\n  {} History cleared\n", style("✓").green().bold());
                    }
                }
                ChatCommand::Topics => {
                    input.flush();
                    return Ok(TopicExit::Catalog);
                }
                ChatCommand::Exit => return Ok(TopicExit::Quit),
                ChatCommand::Unknown(cmd_name) => {
                    println!(
                        "\n  {} Unknown command: {}. Type /help for available commands.\n",
                        style("?").yellow().bold(),
                        style(cmd_name).dim()
                    );
                }
            }
            input.update_prompt(&prompt(ctx.image()));
            continue;
        }

        controller.set_input(ctx, text);
        match send_pending(controller, ctx, true).await {
            Ok(report) => {
                debug!(resolution = ?report.resolution, "Send finished");
                print_report(renderer, &report);
            }
            Err(e) => println!("\n  {}\n", rejection_notice(&e)),
        }
        input.update_prompt(&prompt(ctx.image()));
    }
}

/// How a refused send is reported. An empty send is a hint, not an error.
fn rejection_notice(rejected: &SendRejected) -> String {
    match rejected {
        SendRejected::EmptyInput => style(rejected).dim().to_string(),
        _ => format!("{} {rejected}", style("!").red().bold()),
    }
}

fn prompt(image: Option<&ImageAttachment>) -> String {
    match image {
        Some(_) => format!(
            "  {} {} ",
            style("You").green().bold(),
            style("[image] >").magenta()
        ),
        None => format!("  {} ", style("You >").green().bold()),
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
