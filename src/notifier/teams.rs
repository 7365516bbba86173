//! Microsoft Teams incoming webhook
//!
//! Sends an Adaptive Card (schema 1.5) with one row per update. Results
//! without updates are not sent.

use super::Notifier;
use crate::domain::{JobResult, Repository, UpdateInfo};
use crate::error::NotifyError;
use crate::http::HttpClient;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Posts an Adaptive Card message per job result that found updates
pub struct TeamsNotifier {
    client: HttpClient,
    url: String,
    endpoint: String,
}

const GITHUB_WEB: &str = "https://github.com";
const GITLAB_WEB: &str = "https://gitlab.com";

/// Label and Adaptive Card color for an update type
fn update_type_style(update_type: &str) -> (String, &'static str) {
    match update_type {
        "major" => (format!("🚨 {}", update_type), "Attention"),
        "minor" => (format!("⚠️ {}", update_type), "Warning"),
        "patch" => (format!("✅ {}", update_type), "Good"),
        other => (other.to_string(), "Default"),
    }
}

/// Web root of the platform behind an API endpoint
///
/// `https://ghe.example.com/api/v3` gives `https://ghe.example.com`; an empty
/// endpoint falls back to the public instance of the platform.
fn web_base_url(platform: Option<&str>, endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.is_empty() {
        return match platform {
            Some("gitlab") => GITLAB_WEB.to_string(),
            _ => GITHUB_WEB.to_string(),
        };
    }
    if endpoint == "https://api.github.com" {
        return GITHUB_WEB.to_string();
    }
    ["/api/v4", "/api/v3", "/api"]
        .iter()
        .find_map(|suffix| endpoint.strip_suffix(suffix))
        .unwrap_or(endpoint)
        .to_string()
}

/// Web URL of a repository on its platform
fn repository_url(repository: &Repository, endpoint: &str) -> String {
    format!(
        "{}/{}",
        web_base_url(repository.platform.as_deref(), endpoint),
        repository.name
    )
}

fn column(width: &str, items: Value) -> Value {
    json!({ "type": "Column", "width": width, "items": [items] })
}

fn update_row(update: &UpdateInfo) -> Value {
    let (label, color) = update_type_style(&update.update_type);
    json!({
        "type": "ColumnSet",
        "separator": true,
        "columns": [
            column("stretch", json!({
                "type": "TextBlock", "text": update.dep_name, "wrap": true, "size": "Small"
            })),
            column("auto", json!({
                "type": "TextBlock",
                "text": format!("{} → {}", update.current_version, update.new_version),
                "size": "Small"
            })),
            column("60px", json!({
                "type": "TextBlock", "text": label, "color": color, "size": "Small",
                "horizontalAlignment": "Right", "weight": "Bolder"
            })),
        ]
    })
}

/// Build the full message payload
pub(crate) fn card(result: &JobResult, endpoint: &str) -> Value {
    let rows: Vec<Value> = result.updates.iter().map(update_row).collect();
    let header = |text: &str| json!({ "type": "TextBlock", "text": text, "weight": "Bolder", "size": "Small" });

    let body = json!([
        {
            "type": "TextBlock",
            "text": "📢 Dependency Updates",
            "weight": "Bolder",
            "size": "Large",
            "color": "Accent"
        },
        {
            "type": "TextBlock",
            "text": format!("New dependency updates were detected. ({})", result.repository),
            "isSubtle": true,
            "wrap": true
        },
        {
            "type": "Container",
            "style": "emphasis",
            "items": [{
                "type": "ColumnSet",
                "columns": [
                    column("stretch", header("📦 Package")),
                    column("auto", header("Version")),
                    column("60px", header("Type")),
                ]
            }]
        },
        { "type": "Container", "id": "UpdateListContainer", "items": rows }
    ]);

    json!({
        "type": "message",
        "attachments": [{
            "contentType": "application/vnd.microsoft.card.adaptive",
            "contentUrl": null,
            "content": {
                "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
                "type": "AdaptiveCard",
                "version": "1.5",
                "body": body,
                "actions": [{
                    "type": "Action.OpenUrl",
                    "title": "🔗 Open repository",
                    "url": repository_url(&result.repository, endpoint)
                }],
                "msteams": { "width": "Full" }
            }
        }]
    })
}

impl TeamsNotifier {
    pub fn new(client: HttpClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            endpoint: String::new(),
        }
    }

    /// Link repositories on the instance behind this API endpoint (builder pattern)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Notifier for TeamsNotifier {
    fn name(&self) -> &'static str {
        "teams"
    }

    async fn notify(&self, result: &JobResult) -> Result<(), NotifyError> {
        if !result.has_updates() {
            return Ok(());
        }
        self.client
            .post_json(self.name(), &self.url, &card(result, &self.endpoint))
            .await
    }
}
