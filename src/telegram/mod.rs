//! Minimal Telegram Bot API client: long polling and sending messages.

use crate::error::{MonitorError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod types;

pub use types::{Chat, Message, Update, User};

pub const PARSE_MODE_MARKDOWN: &str = "Markdown";

const API_BASE_URL: &str = "https://api.telegram.org";

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, API_BASE_URL.to_string())
    }

    pub fn with_base_url(token: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    /// Long-poll for new updates. The HTTP request is given a little more
    /// time than the server-side poll timeout.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout.as_secs(),
            allowed_updates: Some(vec!["message"]),
        };
        self.post("getUpdates", &request, timeout + Duration::from_secs(10))
            .await
    }

    /// Send `text` to `chat_id`, bounded by `timeout`.
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<&str>,
        timeout: Duration,
    ) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode,
        };
        let _: Message = self.post("sendMessage", &request, timeout).await?;
        Ok(())
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T> {
        // reqwest errors carry the URL, which contains the bot token
        let response = self
            .http
            .post(self.method_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| MonitorError::Telegram(describe_request_error(method, &e)))?;

        let payload: TelegramResponse<T> = response.json().await.map_err(|e| {
            MonitorError::Telegram(format!(
                "{}: failed to decode response: {}",
                method,
                e.without_url()
            ))
        })?;

        match (payload.ok, payload.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(MonitorError::Telegram(format!(
                "{}: {}",
                method,
                payload
                    .description
                    .unwrap_or_else(|| "Telegram API error".to_string())
            ))),
        }
    }
}

fn describe_request_error(method: &str, error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("{}: request timed out", method)
    } else if error.is_connect() {
        format!("{}: connection failed", method)
    } else {
        format!("{}: request failed", method)
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_updates: Option<Vec<&'static str>>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}
