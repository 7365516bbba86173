//! Generic JSON webhook
//!
//! Payload: `{"repo": "<repository>", "updates": [UpdateInfo...]}`

use super::Notifier;
use crate::domain::{JobResult, UpdateInfo};
use crate::error::NotifyError;
use crate::http::HttpClient;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    repo: &'a str,
    updates: &'a [UpdateInfo],
}

/// Posts every job result to a URL, including results without updates
pub struct WebhookNotifier {
    client: HttpClient,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: HttpClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn notify(&self, result: &JobResult) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            repo: &result.repository.name,
            updates: &result.updates,
        };
        self.client.post_json(self.name(), &self.url, &payload).await
    }
}
