//! Outbound notification channel for alerts.

use crate::error::{MonitorError, Result};
use crate::telegram::TelegramClient;
use async_trait::async_trait;
use log::info;
use std::time::Duration;

/// Something that can deliver a text message to the operator.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Sends alerts to a fixed Telegram chat.
pub struct TelegramNotifier {
    client: TelegramClient,
    chat_id: String,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient, chat_id: String, timeout: Duration) -> Self {
        Self {
            client,
            chat_id,
            timeout,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        self.client
            .send_message(&self.chat_id, text, None, self.timeout)
            .await
            .map_err(|e| MonitorError::Notification(format!("chat {}: {}", self.chat_id, e)))
    }
}

/// Writes alerts to the log instead of sending them anywhere.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        info!("[Alert] {}", text);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Captures every message it is asked to send.
    #[derive(Clone, Default)]
    pub struct RecordingNotifier {
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<String> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<()> {
            self.sent.lock().push(text.to_string());
            Ok(())
        }
    }

    /// Counts attempts and always fails.
    #[derive(Clone, Default)]
    pub struct FailingNotifier {
        attempts: Arc<Mutex<usize>>,
    }

    impl FailingNotifier {
        pub fn attempts(&self) -> usize {
            *self.attempts.lock()
        }
    }

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _text: &str) -> Result<()> {
            *self.attempts.lock() += 1;
            Err(MonitorError::Notification("network unreachable".to_string()))
        }
    }

    /// Never answers within any sensible timeout.
    pub struct HangingNotifier;

    #[async_trait]
    impl Notifier for HangingNotifier {
        async fn send(&self, _text: &str) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }
}
