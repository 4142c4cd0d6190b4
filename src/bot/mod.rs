//! Telegram command front end.
//!
//! Long-polls the Bot API for messages and answers `/start` and `/status`.
//! Each reply runs in its own task so a slow send never holds up polling
//! or other queries.

pub mod commands;
pub mod responder;

pub use commands::{BotCommand, parse_command};
pub use responder::{Reply, StatusQueryResponder};

use crate::telegram::{Message, TelegramClient};
use log::{debug, info, warn};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

pub struct StatusBot {
    client: TelegramClient,
    responder: StatusQueryResponder,
    poll_timeout: Duration,
    reply_timeout: Duration,
}

impl StatusBot {
    pub fn new(
        client: TelegramClient,
        responder: StatusQueryResponder,
        poll_timeout: Duration,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            client,
            responder,
            poll_timeout,
            reply_timeout,
        }
    }

    /// Poll until `shutdown` fires, then wait (bounded) for in-flight replies.
    pub async fn run(self, shutdown: CancellationToken) {
        let replies = TaskTracker::new();
        let mut offset: Option<i64> = None;

        info!("Telegram bot polling for commands");

        loop {
            let current_offset = offset;
            tokio::select! {
                _ = shutdown.cancelled() => break,
                updates = self.client.get_updates(current_offset, self.poll_timeout) => {
                    let updates = match updates {
                        Ok(updates) => updates,
                        Err(e) => {
                            warn!("Telegram polling error: {}", e);
                            tokio::select! {
                                _ = shutdown.cancelled() => break,
                                _ = tokio::time::sleep(Duration::from_secs(1)) => continue,
                            }
                        }
                    };

                    for update in updates {
                        offset = Some(update.update_id + 1);
                        if let Some(message) = update.message {
                            self.dispatch(&replies, message);
                        }
                    }
                }
            }
        }

        replies.close();
        if tokio::time::timeout(self.reply_timeout, replies.wait())
            .await
            .is_err()
        {
            warn!("Gave up waiting for {} pending replies", replies.len());
        }
        info!("Telegram bot stopped");
    }

    fn dispatch(&self, replies: &TaskTracker, message: Message) {
        let Some(reply) = self.reply_for(&message) else {
            return;
        };

        let client = self.client.clone();
        let timeout = self.reply_timeout;
        let chat_id = message.chat.id.to_string();
        replies.spawn(async move {
            if let Err(e) = client
                .send_message(&chat_id, &reply.text, reply.parse_mode, timeout)
                .await
            {
                warn!("Failed to reply in chat {}: {}", chat_id, e);
            }
        });
    }

    /// Build the reply for `message`, or `None` if it is not a command.
    fn reply_for(&self, message: &Message) -> Option<Reply> {
        let text = message.text.as_deref()?;
        let command = parse_command(text)?;
        debug!(
            "Command {:?} from chat {} (user {:?})",
            command,
            message.chat.id,
            message.from.as_ref().and_then(|u| u.username.as_deref())
        );
        Some(self.responder.handle(command))
    }
}
