//! Human-readable replies to bot commands.

use super::commands::BotCommand;
use crate::sensors::{SharedSnapshot, Snapshot};
use crate::telegram::PARSE_MODE_MARKDOWN;

pub const GREETING: &str = "Hello! I'm the Study Buddy assistant bot. \
I'll message you as soon as something in the room drifts out of range. \
Send /status to see the current conditions.";

pub const NOT_READY: &str = "No sensor data has been read yet. Please wait a few seconds.";

/// Reply text plus the Telegram parse mode it was written for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub parse_mode: Option<&'static str>,
}

/// Answers `/start` and `/status` from the latest published snapshot.
///
/// Only ever clones the current snapshot pointer, so a query never waits on
/// the sampling loop.
#[derive(Clone)]
pub struct StatusQueryResponder {
    latest: SharedSnapshot,
}

impl StatusQueryResponder {
    pub fn new(latest: SharedSnapshot) -> Self {
        Self { latest }
    }

    pub fn handle(&self, command: BotCommand) -> Reply {
        match command {
            BotCommand::Start => Reply {
                text: self.on_start(),
                parse_mode: None,
            },
            BotCommand::Status => Reply {
                text: self.on_status(),
                parse_mode: Some(PARSE_MODE_MARKDOWN),
            },
        }
    }

    pub fn on_start(&self) -> String {
        GREETING.to_string()
    }

    pub fn on_status(&self) -> String {
        self.respond()
    }

    pub fn respond(&self) -> String {
        match self.latest.latest() {
            Some(snapshot) => format_report(&snapshot),
            None => NOT_READY.to_string(),
        }
    }
}

pub fn format_report(snapshot: &Snapshot) -> String {
    let temperature = snapshot
        .temperature_c()
        .map_or_else(|| "unreadable".to_string(), |t| format!("{:.1}°C", t));

    format!(
        "📊 *Current Room Status* 📊\n\n\
         💡 Light: *{}*\n\
         🔊 Sound: *{}*\n\
         🌡️ Temperature: *{} ({})*\n\
         🕒 Updated: {}",
        snapshot.light_status(),
        snapshot.sound_status(),
        temperature,
        snapshot.temperature_status(),
        snapshot.taken_at().format("%H:%M:%S"),
    )
}
