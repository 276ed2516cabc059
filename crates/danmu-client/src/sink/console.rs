//! Terminal output

use danmu_core::{EventSink, LiveEvent};
use std::io::Write;

/// Format a chat event as one terminal line
///
/// Returns `None` for events that belong in the log rather than the chat
/// stream.
pub fn format_event(event: &LiveEvent) -> Option<String> {
    match event {
        LiveEvent::Danmaku { sender, text } => Some(format!("🎃 {sender}: {text}")),
        LiveEvent::Gift {
            sender,
            action,
            gift,
            quantity,
        } => Some(format!("🎃 {sender} {action} {gift} x{quantity}")),
        LiveEvent::Popularity { .. } | LiveEvent::UnknownCommand { .. } => None,
    }
}

/// Prints chat lines to stdout and popularity to the log
///
/// Unknown commands are already logged by the command handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: LiveEvent) {
        if let Some(line) = format_event(&event) {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{line}") {
                tracing::warn!(error = %e, "Failed to write to stdout");
            }
            return;
        }

        if let LiveEvent::Popularity { count } = event {
            tracing::info!(popularity = count, "Popularity");
        }
    }
}
