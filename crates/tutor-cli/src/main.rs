//! Tutor CLI entry point.
//!
//! Binary name: `tutor`
//!
//! Parses CLI arguments, initializes logging, database and the session
//! controller, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands, HistoryCommand, KeyCommand};
use state::AppState;
use tutor_observe::TracingOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = TracingOptions {
        verbosity: cli.verbose,
        quiet: cli.quiet,
        json: cli.log_json,
        otel: cli.otel,
    };
    if let Err(e) = tutor_observe::init_tracing(&options) {
        eprintln!("Warning: could not initialize logging: {e}");
    }

    let result = run(cli).await;
    tutor_observe::shutdown_tracing();

    match result {
        Ok(true) => Ok(()),
        // The diagnostic answer was already printed.
        Ok(false) => std::process::exit(2),
        Err(e) => Err(e),
    }
}

/// Dispatch the parsed command. `Ok(false)` means the command ran but the
/// model request failed on every tier.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "tutor", &mut std::io::stdout());
        return Ok(true);
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::Key { action } => match action {
            KeyCommand::Set { value } => {
                cli::key::set_key(&state, value.as_deref(), cli.json).await?;
            }
            KeyCommand::Clear { force } => {
                cli::key::clear_key(&state, force, cli.json).await?;
            }
            KeyCommand::Status => {
                cli::key::key_status(&state, cli.json).await?;
            }
        },

        Commands::Topics => {
            cli::topics::list_topics(&state, cli.json).await?;
        }

        Commands::Chat { topic } => {
            cli::chat::loop_runner::run_chat_loop(&state, topic).await?;
        }

        Commands::Ask { topic, text, image } => {
            return cli::ask::ask(&state, topic, text, image, cli.json, cli.quiet).await;
        }

        Commands::History { action } => match action {
            HistoryCommand::Show { topic, limit } => {
                cli::history::show_history(&state, topic, limit, cli.json).await?;
            }
            HistoryCommand::Clear { topic, force } => {
                cli::history::clear_history(&state, topic, force, cli.json).await?;
            }
        },

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(true)
}
