//! Notification channel used by list mutations.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// Sink for user-facing notifications.
pub trait Notifier {
    fn notify(&self, level: Level, message: &str);
}

/// Sends notifications as flash messages shown on the next rendered page.
#[cfg(feature = "server")]
#[derive(Clone, Copy, Debug, Default)]
pub struct FlashNotifier;

#[cfg(feature = "server")]
impl Notifier for FlashNotifier {
    fn notify(&self, level: Level, message: &str) {
        use actix_web_flash_messages::{FlashMessage, Level as FlashLevel};

        let level = match level {
            Level::Info => FlashLevel::Info,
            Level::Success => FlashLevel::Success,
            Level::Warning => FlashLevel::Warning,
            Level::Error => FlashLevel::Error,
        };
        FlashMessage::new(message.to_string(), level).send();
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingNotifier {
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn levels(&self) -> Vec<Level> {
        self.entries().into_iter().map(|(level, _)| level).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|(_, message)| message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: Level, message: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}
