//! Job result packaging and notification fan-out

use crate::domain::{JobResult, Repository};
use crate::notifier::Notifier;
use crate::parser::parse_output;
use crate::runner::RunOutcome;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};

/// Turns runner outcomes into job results and hands them to the notifiers
#[derive(Default)]
pub struct ResultAggregator {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl ResultAggregator {
    /// Create an aggregator delivering to `notifiers` in order
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    /// Returns the number of configured notifiers
    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }

    /// Build the result of one job
    ///
    /// Output is parsed even when the run failed, so updates reported before
    /// a late failure are kept.
    pub fn build(
        repository: Repository,
        outcome: RunOutcome,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> JobResult {
        let updates = parse_output(&outcome.output);
        JobResult {
            repository,
            success: outcome.error.is_none(),
            raw_output: outcome.output,
            updates,
            error: outcome.error,
            started_at,
            duration,
        }
    }

    /// Deliver a result to every notifier; failures are logged and skipped
    pub async fn deliver(&self, result: &JobResult) {
        for notifier in &self.notifiers {
            match notifier.notify(result).await {
                Ok(()) => debug!(
                    repo = %result.repository,
                    notifier = notifier.name(),
                    "Notification delivered"
                ),
                Err(e) => warn!(
                    repo = %result.repository,
                    notifier = notifier.name(),
                    error = %e,
                    "Notification failed"
                ),
            }
        }
    }

    /// Build a result and deliver it
    pub async fn complete(
        &self,
        repository: Repository,
        outcome: RunOutcome,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> JobResult {
        let result = Self::build(repository, outcome, started_at, duration);
        self.deliver(&result).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OutputLine, RawOutput};
    use crate::error::{NotifyError, RunnerError};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct RecordingNotifier {
        seen: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn notify(&self, result: &JobResult) -> Result<(), NotifyError> {
            self.seen.lock().unwrap().push(result.repository.name.clone());
            if self.fail {
                Err(NotifyError::status("recording", 500))
            } else {
                Ok(())
            }
        }
    }

    fn output(lines: &[&str]) -> RawOutput {
        lines.iter().map(|l| OutputLine::stdout(*l)).collect()
    }

    #[test]
    fn test_build_success() {
        let outcome = RunOutcome::succeeded(output(&[
            r#"{"depName":"left-pad","newVersion":"1.0.1","currentVersion":"1.0.0","updateType":"patch"}"#,
        ]));
        let result = ResultAggregator::build(
            Repository::new("owner/app"),
            outcome,
            Utc::now(),
            Duration::from_millis(5),
        );

        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.updates.len(), 1);
        assert_eq!(result.updates[0].dep_name, "left-pad");
        assert_eq!(result.raw_output.len(), 1);
    }

    #[test]
    fn test_build_failure_keeps_partial_updates() {
        let outcome = RunOutcome::failed(
            output(&[
                r#"{"depName":"react","newVersion":"18.2.0","currentVersion":"17.0.2"}"#,
                "FATAL: repository disappeared",
            ]),
            RunnerError::NonZeroExit {
                command: "renovate".to_string(),
                status: "exit status: 1".to_string(),
            },
        );
        let result =
            ResultAggregator::build(Repository::new("owner/app"), outcome, Utc::now(), Duration::ZERO);

        assert!(!result.success);
        assert!(result.error.is_some());
        assert_eq!(result.updates.len(), 1);
        assert_eq!(result.raw_output.len(), 2);
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_stop_delivery() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let aggregator = ResultAggregator::new(vec![
            Box::new(RecordingNotifier {
                seen: seen.clone(),
                fail: true,
            }),
            Box::new(RecordingNotifier {
                seen: seen.clone(),
                fail: false,
            }),
        ]);
        assert_eq!(aggregator.notifier_count(), 2);

        let result = aggregator
            .complete(
                Repository::new("owner/app"),
                RunOutcome::succeeded(RawOutput::new()),
                Utc::now(),
                Duration::ZERO,
            )
            .await;

        assert!(result.success);
        assert_eq!(*seen.lock().unwrap(), vec!["owner/app", "owner/app"]);
    }
}
