use crate::core::config::TelegramConfig;
use crate::core::events::NotificationEvent;
use crate::plugins::registry::NotifySink;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(thiserror::Error, Debug)]
pub enum TelegramError {
    #[error("telegram api status: {0}")]
    Status(StatusCode),

    #[error("telegram api rejected message: {0}")]
    Rejected(String),

    /// Transport failure with the URL (and so the bot token) stripped.
    #[error("telegram request failed: {0}")]
    Transport(reqwest::Error),
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramSink {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(cfg: &TelegramConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .context("build telegram http client")?;
        let endpoint = format!(
            "{}/bot{}/sendMessage",
            cfg.api_base.as_deref().unwrap_or(DEFAULT_API_BASE).trim_end_matches('/'),
            cfg.token
        );
        Ok(Self { client, endpoint, chat_id: cfg.chat_id.clone() })
    }

    pub async fn send_text(&self, text: &str) -> Result<(), TelegramError> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::Transport(e.without_url()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TelegramError::Status(status));
        }

        let parsed: ApiResponse = resp
            .json()
            .await
            .map_err(|e| TelegramError::Transport(e.without_url()))?;
        if !parsed.ok {
            return Err(TelegramError::Rejected(
                parsed.description.unwrap_or_else(|| "no description".to_string()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl NotifySink for TelegramSink {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn deliver(&self, _event: &NotificationEvent, text: &str) -> anyhow::Result<()> {
        self.send_text(text).await?;
        Ok(())
    }
}
