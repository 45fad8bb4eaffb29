//! Loading indicator driven by the session's send phase.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use tutor_core::chat::session::SendPhase;

/// Spinner text for a phase. `None` while idle.
pub fn phase_message(phase: SendPhase) -> Option<&'static str> {
    match phase {
        SendPhase::Idle => None,
        SendPhase::Thinking => Some("thinking..."),
        SendPhase::UsingFallback => Some("retrying on fallback model..."),
    }
}

/// A spinner that follows [`SendPhase`] changes until finished.
pub struct PhaseSpinner {
    bar: ProgressBar,
    watcher: JoinHandle<()>,
}

impl PhaseSpinner {
    /// Start following `phases`. A hidden spinner still consumes updates.
    pub fn start(mut phases: watch::Receiver<SendPhase>, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(phase_message(SendPhase::Thinking).unwrap_or_default());
        bar.enable_steady_tick(Duration::from_millis(80));

        let follower = bar.clone();
        let watcher = tokio::spawn(async move {
            while phases.changed().await.is_ok() {
                let phase = *phases.borrow_and_update();
                match phase_message(phase) {
                    Some(msg) => follower.set_message(msg),
                    None => follower.finish_and_clear(),
                }
            }
        });

        Self { bar, watcher }
    }

    /// The message currently shown.
    pub fn message(&self) -> String {
        self.bar.message()
    }

    pub fn finish(self) {
        self.watcher.abort();
        self.bar.finish_and_clear();
    }
}
