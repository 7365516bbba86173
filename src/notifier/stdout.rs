//! Console notifications

use super::Notifier;
use crate::domain::JobResult;
use crate::error::NotifyError;
use async_trait::async_trait;
use std::io::Write;

/// Console stream a notification is written to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsoleStream {
    #[default]
    Stdout,
    /// Used when stdout carries the JSON report
    Stderr,
}

/// Prints each job result to the console
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutNotifier {
    stream: ConsoleStream,
}

impl StdoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write to `stream` instead of stdout (builder pattern)
    pub fn with_stream(mut self, stream: ConsoleStream) -> Self {
        self.stream = stream;
        self
    }

    /// Returns the stream notifications go to
    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }

    /// Write the rendered notification and flush
    fn write_to(&self, result: &JobResult, writer: &mut dyn Write) -> Result<(), NotifyError> {
        writer
            .write_all(Self::render(result).as_bytes())
            .and_then(|_| writer.flush())
            .map_err(|source| NotifyError::Io {
                notifier: self.name().to_string(),
                source,
            })
    }

    /// Render the notification text for one result
    pub fn render(result: &JobResult) -> String {
        let mut text = format!(
            "Notification for {} [{}]:\n",
            result.repository,
            result.status_label()
        );
        if let Some(error) = &result.error {
            text.push_str(&format!("Error: {}\n", error));
        }
        if result.updates.is_empty() {
            text.push_str("No updates needed.\n");
            return text;
        }

        text.push_str("Dependency Updates:\n");
        for update in &result.updates {
            text.push_str(&format!("- {}\n", update));
        }
        text
    }
}

#[async_trait]
impl Notifier for StdoutNotifier {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn notify(&self, result: &JobResult) -> Result<(), NotifyError> {
        match self.stream {
            ConsoleStream::Stdout => self.write_to(result, &mut std::io::stdout().lock()),
            ConsoleStream::Stderr => self.write_to(result, &mut std::io::stderr().lock()),
        }
    }
}
