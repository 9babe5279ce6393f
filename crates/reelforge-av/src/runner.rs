//! Process Runner: executes one invocation at a time and supervises it.
//!
//! Diagnostic output is kept byte for byte for error reports. A copy is split
//! on `\r` and `\n` (the stats line is rewritten in place) so time markers
//! can become progress fractions.
//!
//! Once cancellation is requested the invocation resolves as
//! [`RunOutcome::Cancelled`] even if the process goes on to exit successfully,
//! and any partial output is deleted.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tokio_util::io::InspectReader;
use tokio_util::sync::CancellationToken;

use crate::builder::{naming, Invocation, StagedFile};
use crate::diagnostics;
use crate::error::{Result, RunError};
use crate::progress::ProgressTracker;
use crate::tools::ToolRegistry;

/// Longest diagnostic line decoded for progress; anything longer ends supervision of the stream.
const MAX_LINE: usize = 64 * 1024;

/// Channel on which a runner reports progress fractions.
pub type ProgressSender = mpsc::UnboundedSender<f64>;

/// How an invocation ended when it did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Exit code 0. Carries the output path or numbered template.
    Completed { output: PathBuf },
    Cancelled,
}

/// Executes invocations; the seam between the sequencer and the process.
#[async_trait]
pub trait InvocationRunner: Send + Sync {
    /// Run `invocation` to completion, failure or cancellation.
    async fn run(
        &self,
        invocation: &Invocation,
        progress: ProgressSender,
        cancel: CancellationToken,
    ) -> std::result::Result<RunOutcome, RunError>;
}

/// Runs invocations as child processes of a single program.
#[derive(Debug)]
pub struct ProcessRunner {
    program: PathBuf,
    slot: tokio::sync::Mutex<()>,
    live: Mutex<Option<CancellationToken>>,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            slot: tokio::sync::Mutex::new(()),
            live: Mutex::new(None),
        }
    }

    /// A runner for the registry's ffmpeg.
    pub fn from_registry(tools: &ToolRegistry) -> Result<Self> {
        Ok(Self::new(tools.require("ffmpeg")?.path.clone()))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Whether an invocation currently holds the process slot.
    pub fn is_busy(&self) -> bool {
        self.live.lock().is_some()
    }

    /// Cancel the live invocation, if any. Safe to call repeatedly.
    pub fn cancel(&self) {
        if let Some(token) = self.live.lock().as_ref() {
            tracing::debug!(program = %self.program.display(), "cancelling live invocation");
            token.cancel();
        }
    }

    async fn supervise(
        &self,
        invocation: &Invocation,
        progress: ProgressSender,
        token: CancellationToken,
    ) -> std::result::Result<RunOutcome, RunError> {
        if token.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }
        let _staged = StagedGuard::write(invocation.staged_files())?;

        let mut child = Command::new(&self.program)
            .args(invocation.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RunError::launch(format!("{}: {e}", self.program.display())))?;

        tracing::debug!(
            pid = child.id(),
            output = %invocation.output().display(),
            "spawned process"
        );

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunError::launch("diagnostic stream was not captured"))?;
        let mut raw = Vec::new();
        let mut lines = FramedRead::new(
            InspectReader::new(stderr, |chunk: &[u8]| raw.extend_from_slice(chunk)),
            AnyDelimiterCodec::new_with_max_length(b"\r\n".to_vec(), b"\n".to_vec(), MAX_LINE),
        );
        let mut tracker = ProgressTracker::new(invocation.progress_duration());

        let mut cancelled = loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break true,
                next = lines.next() => match next {
                    Some(Ok(chunk)) => {
                        let line = String::from_utf8_lossy(&chunk);
                        if ProgressTracker::is_marker(&line) {
                            if let Some(fraction) = tracker.observe(&line) {
                                let _ = progress.send(fraction);
                            }
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "diagnostic stream read failed");
                        break false;
                    }
                    None => break false,
                },
            }
        };

        // Closing our end keeps a child blocked on a full pipe from hanging the wait.
        drop(lines);
        let diagnostics = String::from_utf8_lossy(&raw).into_owned();

        let status = if cancelled {
            None
        } else {
            tokio::select! {
                biased;
                _ = token.cancelled() => None,
                status = child.wait() => Some(status),
            }
        };

        // A completion observed after cancellation still counts as cancelled.
        cancelled |= token.is_cancelled();

        match status {
            _ if cancelled => {
                if let Err(e) = child.start_kill() {
                    tracing::debug!(error = %e, "process already exited");
                }
                let _ = child.wait().await;
                remove_partial_outputs(invocation);
                tracing::info!(output = %invocation.output().display(), "invocation cancelled");
                Ok(RunOutcome::Cancelled)
            }
            Some(Ok(status)) if status.success() => Ok(RunOutcome::Completed {
                output: invocation.output().to_path_buf(),
            }),
            Some(Ok(status)) => {
                let kind = diagnostics::classify(&diagnostics);
                tracing::warn!(code = ?status.code(), kind = ?kind, "process failed");
                Err(RunError::Execution {
                    code: status.code(),
                    kind,
                    diagnostics,
                })
            }
            Some(Err(e)) => Err(RunError::Execution {
                code: None,
                kind: diagnostics::FailureKind::Generic,
                diagnostics: format!("{diagnostics}failed to wait for process: {e}\n"),
            }),
            None => Ok(RunOutcome::Cancelled),
        }
    }
}

#[async_trait]
impl InvocationRunner for ProcessRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        progress: ProgressSender,
        cancel: CancellationToken,
    ) -> std::result::Result<RunOutcome, RunError> {
        let _slot = self.slot.try_lock().map_err(|_| RunError::Busy)?;

        let token = cancel.child_token();
        *self.live.lock() = Some(token.clone());
        let _live = LiveGuard(&self.live);

        self.supervise(invocation, progress, token).await
    }
}

/// Clears the live token when the invocation ends, however it ends.
struct LiveGuard<'a>(&'a Mutex<Option<CancellationToken>>);

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().take();
    }
}

/// Staged files exist exactly as long as the guard.
struct StagedGuard(Vec<PathBuf>);

impl StagedGuard {
    fn write(files: &[StagedFile]) -> std::result::Result<Self, RunError> {
        let mut guard = Self(Vec::with_capacity(files.len()));
        for file in files {
            std::fs::write(&file.path, &file.contents).map_err(|e| {
                RunError::launch(format!("cannot stage {}: {e}", file.path.display()))
            })?;
            guard.0.push(file.path.clone());
        }
        Ok(guard)
    }
}

impl Drop for StagedGuard {
    fn drop(&mut self) {
        for path in &self.0 {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::debug!(path = %path.display(), error = %e, "staged file not removed");
            }
        }
    }
}

/// Delete whatever the invocation may have written.
fn remove_partial_outputs(invocation: &Invocation) {
    let output = invocation.output();
    if !invocation.is_numbered() {
        remove_quietly(output);
        return;
    }

    let (Some(dir), Some(template)) = (output.parent(), output.file_name().and_then(|n| n.to_str()))
    else {
        return;
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_str().is_some_and(|n| naming::matches_template(template, n)) {
            remove_quietly(&entry.path());
        }
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove partial output"),
    }
}
