//! Telegram Bot Delivery

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Notifier;
use crate::error::{Result, RuntimeError};
use crate::http::HttpConfig;

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
    pub http: HttpConfig,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: "https://api.telegram.org".into(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        if config.bot_token.is_empty() || config.chat_id.is_empty() {
            return Err(RuntimeError::Config("telegram bot token and chat id are required".into()));
        }

        Ok(Self {
            client: config.http.build_client()?,
            config,
        })
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }
}

/// Interpret a `sendMessage` reply
fn check_response(status: u16, body: &str) -> Result<()> {
    if status == 429 || status >= 500 {
        return Err(RuntimeError::Status {
            service: "telegram",
            status,
            body: body.to_string(),
        });
    }

    let reply: TelegramResponse = serde_json::from_str(body)?;
    if !reply.ok {
        return Err(RuntimeError::Api {
            service: "telegram",
            message: reply.description.unwrap_or_else(|| format!("HTTP {status}")),
        });
    }
    Ok(())
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id: &self.config.chat_id,
            text,
            parse_mode: "Markdown",
        };

        let response = self
            .client
            .post(self.send_message_url())
            .json(&request)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        check_response(status, &body)
    }

    fn name(&self) -> &str {
        "Telegram"
    }
}
