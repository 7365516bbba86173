//! Telegram Bot API notifications
//!
//! API endpoint: https://api.telegram.org/bot{token}/sendMessage

use super::Notifier;
use crate::domain::JobResult;
use crate::error::NotifyError;
use crate::http::HttpClient;
use async_trait::async_trait;
use serde::Serialize;

/// Telegram Bot API base URL
const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
}

/// Sends a Markdown message per job result that found updates
pub struct TelegramNotifier {
    client: HttpClient,
    base_url: String,
    token: String,
    chat_id: String,
}

/// Escape the characters legacy Markdown treats as entity delimiters
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render the message body
pub(crate) fn message(result: &JobResult) -> String {
    let mut text = format!(
        "📢 *Renovate Updates for {}*\n\n",
        escape_markdown(&result.repository.name)
    );
    for update in &result.updates {
        text.push_str(&format!("📦 *{}*\n", escape_markdown(&update.dep_name)));
        text.push_str(&format!(
            "   {} → {}",
            escape_markdown(&update.current_version),
            escape_markdown(&update.new_version)
        ));
        if !update.update_type.is_empty() {
            text.push_str(&format!(" \\[{}]", escape_markdown(&update.update_type)));
        }
        text.push('\n');
    }
    text
}

impl TelegramNotifier {
    pub fn new(client: HttpClient, token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            base_url: TELEGRAM_API_URL.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Create with a custom API base URL (for testing)
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.base_url, self.token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn notify(&self, result: &JobResult) -> Result<(), NotifyError> {
        if !result.has_updates() {
            return Ok(());
        }
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: message(result),
            parse_mode: "Markdown",
        };
        self.client
            .post_json(self.name(), &self.send_url(), &payload)
            .await
    }
}
