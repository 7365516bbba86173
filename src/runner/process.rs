//! Subprocess execution with concurrent stream readers
//!
//! Two reader tasks, one per pipe, push tagged lines into a shared queue.
//! The queue closes once both readers hit end-of-input; only then is the
//! process reaped.

use super::{ProcessRunner, RunOutcome, ToolCommand};
use crate::domain::{OutputLine, RawOutput, Repository, StreamOrigin};
use crate::error::RunnerError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Runs the configured external tool once per repository
#[derive(Debug, Clone)]
pub struct ToolRunner {
    command: ToolCommand,
}

impl ToolRunner {
    /// Create a runner for the given command
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

/// Read `stream` line by line into `sink` until end-of-input
///
/// Lines are decoded lossily and stripped of their line terminator.
async fn read_lines<R>(stream: R, origin: StreamOrigin, sink: mpsc::UnboundedSender<OutputLine>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                let line = OutputLine {
                    origin,
                    text: String::from_utf8_lossy(&buf).into_owned(),
                };
                if sink.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(stream = %origin, error = %e, "Stream read failed");
                break;
            }
        }
    }
}

/// Kill the child after cancellation and reap it
async fn terminate(child: &mut Child, repository: &Repository) {
    if let Err(e) = child.kill().await {
        warn!(repo = %repository, error = %e, "Failed to kill cancelled process");
    }
}

#[async_trait]
impl ProcessRunner for ToolRunner {
    async fn run(&self, repository: &Repository, cancel: CancellationToken) -> RunOutcome {
        let program = self.command.program().to_string();
        let invocation = self.command.repository_invocation(repository);

        let mut command = invocation.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return RunOutcome::failed(RawOutput::new(), RunnerError::spawn(program, &e)),
        };
        debug!(repo = %repository, pid = ?child.id(), "Started {}", program);

        let Some(stdout) = child.stdout.take() else {
            return RunOutcome::failed(RawOutput::new(), RunnerError::Pipe { stream: "stdout" });
        };
        let Some(stderr) = child.stderr.take() else {
            return RunOutcome::failed(RawOutput::new(), RunnerError::Pipe { stream: "stderr" });
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let readers = [
            tokio::spawn(read_lines(stdout, StreamOrigin::Stdout, tx.clone())),
            tokio::spawn(read_lines(stderr, StreamOrigin::Stderr, tx)),
        ];

        let mut output = RawOutput::new();
        let cancelled = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break true,
                line = rx.recv() => match line {
                    Some(line) => {
                        debug!(
                            target: "renovates::tool",
                            repo = %repository,
                            stream = %line.origin,
                            "{}",
                            line.text
                        );
                        output.push(line);
                    }
                    // Both senders dropped: both readers reached end-of-input
                    None => break false,
                },
            }
        };

        if cancelled {
            terminate(&mut child, repository).await;
            for reader in &readers {
                reader.abort();
            }
            while let Ok(line) = rx.try_recv() {
                output.push(line);
            }
            return RunOutcome::failed(output, RunnerError::cancelled(program));
        }

        for reader in readers {
            if let Err(e) = reader.await {
                debug!(repo = %repository, error = %e, "Stream reader task ended abnormally");
            }
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                terminate(&mut child, repository).await;
                return RunOutcome::failed(output, RunnerError::cancelled(program));
            }
            status = child.wait() => status,
        };

        match status {
            Ok(status) if status.success() => RunOutcome::succeeded(output),
            Ok(status) => RunOutcome::failed(output, RunnerError::non_zero_exit(program, status)),
            Err(e) => RunOutcome::failed(
                output,
                RunnerError::Wait {
                    command: program,
                    message: e.to_string(),
                },
            ),
        }
    }
}
