//! Job result notifications
//!
//! This module provides:
//! - Console notifications
//! - Generic JSON webhook
//! - Microsoft Teams Adaptive Card messages
//! - Telegram bot messages

mod stdout;
mod teams;
mod telegram;
mod webhook;

pub use stdout::{ConsoleStream, StdoutNotifier};
pub use teams::TeamsNotifier;
pub use telegram::TelegramNotifier;
pub use webhook::WebhookNotifier;

use crate::config::NotifierConfig;
use crate::domain::JobResult;
use crate::error::{ConfigError, NotifyError};
use crate::http::HttpClient;
use async_trait::async_trait;

/// Trait for notification transports
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Get the transport name used in logs and errors
    fn name(&self) -> &'static str;

    /// Deliver one job result
    async fn notify(&self, result: &JobResult) -> Result<(), NotifyError>;
}

/// Settings shared by every notifier of a run
#[derive(Debug, Clone, Default)]
pub struct NotifierOptions {
    /// Platform API endpoint; empty for the public instance
    pub endpoint: String,
    /// Stream for `stdout` notifiers
    pub console: ConsoleStream,
}

/// Create the notifiers listed in the configuration, in order
pub fn create_notifiers(
    configs: &[NotifierConfig],
    client: HttpClient,
    options: &NotifierOptions,
) -> Result<Vec<Box<dyn Notifier>>, ConfigError> {
    configs
        .iter()
        .map(|config| -> Result<Box<dyn Notifier>, ConfigError> {
            match config.kind.as_str() {
                "stdout" => Ok(Box::new(StdoutNotifier::new().with_stream(options.console))),
                "webhook" => Ok(Box::new(WebhookNotifier::new(client.clone(), &config.url))),
                "teams" => Ok(Box::new(
                    TeamsNotifier::new(client.clone(), &config.url)
                        .with_endpoint(options.endpoint.as_str()),
                )),
                "telegram" => Ok(Box::new(TelegramNotifier::new(
                    client.clone(),
                    &config.token,
                    &config.chat_id,
                ))),
                other => Err(ConfigError::UnknownNotifier {
                    kind: other.to_string(),
                }),
            }
        })
        .collect()
}
