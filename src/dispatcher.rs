//! Job dispatcher for running the external tool across many repositories
//!
//! This module provides:
//! - Bounded concurrency: at most `concurrency` jobs run at once
//! - Scheduling in input order, one job per repository
//! - Failure isolation: a failed or panicked job still yields a result
//! - Batch and per-job cancellation, with an optional per-job deadline

use crate::aggregator::ResultAggregator;
use crate::domain::{JobResult, RawOutput, Repository};
use crate::error::RunnerError;
use crate::progress::Progress;
use crate::runner::{ProcessRunner, RunOutcome};
use chrono::Utc;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{self, JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs one job per repository under a concurrency ceiling
pub struct Dispatcher {
    runner: Arc<dyn ProcessRunner>,
    aggregator: Arc<ResultAggregator>,
    job_timeout: Option<Duration>,
    cancel: CancellationToken,
}

/// Cancels a job's token when its deadline passes, unless dropped first
struct Deadline(JoinHandle<()>);

impl Deadline {
    fn arm(repository: &Repository, timeout: Duration, cancel: CancellationToken) -> Self {
        let repository = repository.name.clone();
        Self(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            warn!(repo = %repository, timeout_secs = timeout.as_secs(), "Job deadline reached, cancelling");
            cancel.cancel();
        }))
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Bookkeeping for jobs that have been spawned but not yet collected
struct Batch<'a> {
    repositories: &'a [Repository],
    slots: Vec<Option<JobResult>>,
    indices: HashMap<task::Id, usize>,
}

impl Batch<'_> {
    fn record(&mut self, index: usize, result: JobResult, progress: &Progress) {
        progress.set_message(&result.repository.name);
        progress.inc();
        self.slots[index] = Some(result);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl Dispatcher {
    /// Create a dispatcher with no deadline and its own cancellation token
    pub fn new(runner: Arc<dyn ProcessRunner>, aggregator: Arc<ResultAggregator>) -> Self {
        Self {
            runner,
            aggregator,
            job_timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancel each job that runs longer than `timeout` (builder pattern)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// Use `cancel` as the parent of every job's token (builder pattern)
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run every repository and return one result per repository, in input order
    pub async fn run_all(&self, repositories: &[Repository], concurrency: usize) -> Vec<JobResult> {
        self.run_all_with_progress(repositories, concurrency, &mut Progress::disabled())
            .await
    }

    /// Run every repository, advancing `progress` as jobs complete
    ///
    /// `concurrency` is clamped to `1..=Semaphore::MAX_PERMITS`. A job is
    /// admitted only after it holds a slot of the admission gate; the slot is
    /// released as soon as its runner returns, or when the job task unwinds.
    pub async fn run_all_with_progress(
        &self,
        repositories: &[Repository],
        concurrency: usize,
        progress: &mut Progress,
    ) -> Vec<JobResult> {
        let concurrency = concurrency.clamp(1, Semaphore::MAX_PERMITS);
        let gate = Arc::new(Semaphore::new(concurrency));
        let mut jobs = JoinSet::new();
        let mut batch = Batch {
            repositories,
            slots: (0..repositories.len()).map(|_| None).collect(),
            indices: HashMap::new(),
        };

        info!(jobs = repositories.len(), concurrency, "Starting batch");
        progress.start(repositories.len() as u64, "Running");

        let mut scheduled = 0;
        for (index, repository) in repositories.iter().enumerate() {
            // Collect finished jobs while waiting so progress keeps moving
            let permit: Option<OwnedSemaphorePermit> = loop {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => break None,
                    permit = gate.clone().acquire_owned() => break permit.ok(),
                    Some(joined) = jobs.join_next_with_id() => {
                        self.collect(joined, &mut batch, progress).await;
                    }
                }
            };
            let Some(permit) = permit else {
                break;
            };

            let handle = jobs.spawn(self.job(repository.clone(), permit));
            batch.indices.insert(handle.id(), index);
            scheduled += 1;
        }

        while let Some(joined) = jobs.join_next_with_id().await {
            self.collect(joined, &mut batch, progress).await;
        }

        // Repositories never admitted because the batch was cancelled
        for (index, repository) in repositories.iter().enumerate().skip(scheduled) {
            let outcome = RunOutcome::failed(
                RawOutput::new(),
                RunnerError::Cancelled {
                    command: "batch".to_string(),
                },
            );
            let result = self
                .aggregator
                .complete(repository.clone(), outcome, Utc::now(), Duration::ZERO)
                .await;
            batch.record(index, result, progress);
        }

        progress.finish_and_clear();

        let Batch {
            repositories,
            slots,
            ..
        } = batch;
        let results: Vec<JobResult> = slots
            .into_iter()
            .zip(repositories)
            .map(|(slot, repository)| {
                slot.unwrap_or_else(|| {
                    ResultAggregator::build(
                        repository.clone(),
                        RunOutcome::failed(
                            RawOutput::new(),
                            RunnerError::Panicked {
                                message: "job produced no result".to_string(),
                            },
                        ),
                        Utc::now(),
                        Duration::ZERO,
                    )
                })
            })
            .collect();

        info!(
            jobs = results.len(),
            failed = results.iter().filter(|r| !r.success).count(),
            "Batch finished"
        );
        results
    }

    /// The task body of one job
    fn job(
        &self,
        repository: Repository,
        permit: OwnedSemaphorePermit,
    ) -> impl std::future::Future<Output = JobResult> + Send + 'static {
        let runner = Arc::clone(&self.runner);
        let aggregator = Arc::clone(&self.aggregator);
        let cancel = self.cancel.child_token();
        let timeout = self.job_timeout;

        async move {
            let started_at = Utc::now();
            let clock = Instant::now();
            info!(repo = %repository, "Job started");

            let deadline = timeout.map(|t| Deadline::arm(&repository, t, cancel.clone()));
            let outcome = runner.run(&repository, cancel).await;
            drop(deadline);
            drop(permit);

            let duration = clock.elapsed();
            let result = aggregator
                .complete(repository, outcome, started_at, duration)
                .await;
            info!(
                repo = %result.repository,
                success = result.success,
                updates = result.update_count(),
                duration_ms = duration.as_millis() as u64,
                "Job finished"
            );
            result
        }
    }

    /// Store a joined job's result, turning a panicked task into a failed result
    async fn collect(
        &self,
        joined: Result<(task::Id, JobResult), JoinError>,
        batch: &mut Batch<'_>,
        progress: &Progress,
    ) {
        let (id, result) = match joined {
            Ok((id, result)) => (id, Ok(result)),
            Err(e) => (e.id(), Err(e)),
        };
        let Some(index) = batch.indices.remove(&id) else {
            debug!(task = %id, "Joined a task that was never scheduled");
            return;
        };

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                let repository = batch.repositories[index].clone();
                let error = if e.is_panic() {
                    RunnerError::Panicked {
                        message: panic_message(e.into_panic()),
                    }
                } else {
                    RunnerError::Cancelled {
                        command: "job".to_string(),
                    }
                };
                warn!(repo = %repository, error = %error, "Job task ended abnormally");
                self.aggregator
                    .complete(
                        repository,
                        RunOutcome::failed(RawOutput::new(), error),
                        Utc::now(),
                        Duration::ZERO,
                    )
                    .await
            }
        };
        batch.record(index, result, progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OutputLine;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sleeps per job and tracks how many jobs run at the same time
    #[derive(Default)]
    struct FakeRunner {
        running: AtomicUsize,
        peak: AtomicUsize,
        started: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProcessRunner for FakeRunner {
        async fn run(&self, repository: &Repository, cancel: CancellationToken) -> RunOutcome {
            self.started.lock().unwrap().push(repository.name.clone());
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if repository.name.ends_with("panics") {
                self.running.fetch_sub(1, Ordering::SeqCst);
                panic!("runner exploded");
            }

            let slow = repository.name.ends_with("slow");
            let sleep = if slow {
                Duration::from_secs(30)
            } else {
                Duration::from_millis(40)
            };
            let cancelled = tokio::select! {
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep(sleep) => false,
            };
            self.running.fetch_sub(1, Ordering::SeqCst);

            let output: RawOutput = [OutputLine::stdout(format!(
                r#"{{"depName":"dep-{}","newVersion":"2.0.0","currentVersion":"1.0.0"}}"#,
                repository.short_name()
            ))]
            .into_iter()
            .collect();

            if cancelled {
                RunOutcome::failed(output, RunnerError::cancelled("fake"))
            } else if repository.name.ends_with("fails") {
                RunOutcome::failed(
                    output,
                    RunnerError::NonZeroExit {
                        command: "fake".to_string(),
                        status: "exit status: 1".to_string(),
                    },
                )
            } else {
                RunOutcome::succeeded(output)
            }
        }
    }

    fn repos(names: &[&str]) -> Vec<Repository> {
        names.iter().map(|n| Repository::new(*n)).collect()
    }

    fn dispatcher(runner: Arc<FakeRunner>) -> Dispatcher {
        Dispatcher::new(runner, Arc::new(ResultAggregator::default()))
    }

    #[tokio::test]
    async fn test_concurrency_bound_and_completeness() {
        let runner = Arc::new(FakeRunner::default());
        let repositories = repos(&["o/a", "o/b", "o/c", "o/d", "o/e"]);

        let results = dispatcher(runner.clone()).run_all(&repositories, 2).await;

        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.success));
        assert!(runner.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(runner.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_results_are_in_input_order() {
        let runner = Arc::new(FakeRunner::default());
        let repositories = repos(&["o/c", "o/a", "o/b"]);

        let results = dispatcher(runner).run_all(&repositories, 3).await;
        let names: Vec<_> = results.iter().map(|r| r.repository.name.as_str()).collect();
        assert_eq!(names, vec!["o/c", "o/a", "o/b"]);
        assert_eq!(results[0].updates[0].dep_name, "dep-c");
    }

    #[tokio::test]
    async fn test_zero_concurrency_behaves_as_one() {
        let runner = Arc::new(FakeRunner::default());
        let repositories = repos(&["o/a", "o/b", "o/c"]);

        let results = dispatcher(runner.clone()).run_all(&repositories, 0).await;

        assert_eq!(results.len(), 3);
        assert_eq!(runner.peak.load(Ordering::SeqCst), 1);
        assert_eq!(*runner.started.lock().unwrap(), vec!["o/a", "o/b", "o/c"]);
    }

    #[tokio::test]
    async fn test_huge_concurrency_is_capped() {
        let runner = Arc::new(FakeRunner::default());
        let repositories = repos(&["o/a", "o/b", "o/c", "o/d"]);

        let results = dispatcher(runner.clone()).run_all(&repositories, usize::MAX).await;

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(runner.peak.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let runner = Arc::new(FakeRunner::default());
        let repositories = repos(&["o/a", "o/fails", "o/c"]);

        let results = dispatcher(runner).run_all(&repositories, 2).await;

        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(results[1].updates.len(), 1);
        assert!(results[2].success);
    }

    #[tokio::test]
    async fn test_panicked_job_yields_failed_result_and_frees_slot() {
        let runner = Arc::new(FakeRunner::default());
        let repositories = repos(&["o/panics", "o/b", "o/c"]);

        let results = dispatcher(runner).run_all(&repositories, 1).await;

        assert_eq!(results.len(), 3);
        assert!(matches!(
            results[0].error,
            Some(RunnerError::Panicked { ref message }) if message == "runner exploded"
        ));
        assert!(results[1].success);
        assert!(results[2].success);
    }

    #[tokio::test]
    async fn test_job_timeout_cancels_slow_job() {
        let runner = Arc::new(FakeRunner::default());
        let repositories = repos(&["o/slow", "o/b"]);

        let started = Instant::now();
        let results = dispatcher(runner)
            .with_timeout(Some(Duration::from_millis(100)))
            .run_all(&repositories, 2)
            .await;

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(matches!(results[0].error, Some(RunnerError::Cancelled { .. })));
        assert_eq!(results[0].updates.len(), 1);
        assert!(results[1].success);
    }

    #[tokio::test]
    async fn test_batch_cancellation_reports_every_repository() {
        let runner = Arc::new(FakeRunner::default());
        let repositories = repos(&["o/slow", "o/b", "o/c"]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let results = dispatcher(runner.clone())
            .with_cancel_token(cancel)
            .run_all(&repositories, 1)
            .await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| !r.success));
        assert_eq!(runner.started.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let results = dispatcher(Arc::new(FakeRunner::default())).run_all(&[], 4).await;
        assert!(results.is_empty());
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7_u8)), "unknown panic payload");
    }
}
