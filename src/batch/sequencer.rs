//! The batch sequencer: drives queue items through one runner, in order.
//!
//! All run state lives in a single spawned owner task. Callers interact with
//! it through a [`BatchHandle`] (cancel, progress snapshot, final report) and
//! the broadcast event bus; progress from the runner arrives on an mpsc
//! channel and is folded into the run state by the owner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reelforge_av::{ArgumentBuilder, InvocationRunner, RunOutcome};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::BatchEvent;
use super::item::{ItemError, QueueItem};
use super::run::{BatchProgress, BatchReport, BatchRun, BatchState};
use super::BatchError;

/// Capacity of the event bus. Slow subscribers lag rather than block the run.
const EVENT_CAPACITY: usize = 256;

/// Sequences batch runs over a shared builder and runner.
///
/// Only one run may be active per sequencer; the runner is never asked to
/// execute more than one invocation at a time.
pub struct BatchSequencer {
    builder: Arc<ArgumentBuilder>,
    runner: Arc<dyn InvocationRunner>,
    events: broadcast::Sender<BatchEvent>,
    running: Arc<AtomicBool>,
}

impl BatchSequencer {
    pub fn new(builder: Arc<ArgumentBuilder>, runner: Arc<dyn InvocationRunner>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            builder,
            runner,
            events,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to events of current and future runs.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start a run over `items` and return a handle to it.
    ///
    /// An empty queue completes immediately without touching the runner.
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// [`BatchError::AlreadyRunning`] if a previous run has not finished.
    pub fn start(&self, items: Vec<QueueItem>) -> Result<BatchHandle, BatchError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BatchError::AlreadyRunning);
        }
        let guard = RunningGuard(Arc::clone(&self.running));
        let cancel = CancellationToken::new();

        if items.is_empty() {
            drop(guard);
            debug!("Empty batch, nothing to dispatch");
            let (_, progress) = watch::channel(BatchProgress {
                state: BatchState::Completed,
                overall: 1.0,
                ..Default::default()
            });
            let report = BatchReport {
                state: BatchState::Completed,
                succeeded: 0,
                failed: 0,
                items: Vec::new(),
            };
            return Ok(BatchHandle {
                cancel,
                progress,
                task: tokio::spawn(async move { report }),
            });
        }

        let run = BatchRun::new(items);
        let (progress_tx, progress) = watch::channel(run.progress(BatchState::Running));

        let owner = Owner {
            builder: Arc::clone(&self.builder),
            runner: Arc::clone(&self.runner),
            events: self.events.clone(),
            progress: progress_tx,
            cancel: cancel.clone(),
        };

        let task = tokio::spawn(async move {
            let _guard = guard;
            owner.drive(run).await
        });

        Ok(BatchHandle {
            cancel,
            progress,
            task,
        })
    }
}

/// Handle to an active (or finished) batch run.
#[derive(Debug)]
pub struct BatchHandle {
    cancel: CancellationToken,
    progress: watch::Receiver<BatchProgress>,
    task: JoinHandle<BatchReport>,
}

impl BatchHandle {
    /// Stop dispatching and ask the runner to terminate the active item.
    ///
    /// The active item's outcome is whatever the runner reports. Idempotent.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            info!("Batch cancellation requested");
        }
        self.cancel.cancel();
    }

    /// A token that cancels this run, for wiring into signal handlers.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Latest progress snapshot.
    pub fn progress(&self) -> BatchProgress {
        self.progress.borrow().clone()
    }

    /// Receiver that is notified on every progress change.
    pub fn watch(&self) -> watch::Receiver<BatchProgress> {
        self.progress.clone()
    }

    /// Wait for the run to finish.
    pub async fn wait(self) -> Result<BatchReport, BatchError> {
        self.task
            .await
            .map_err(|e| BatchError::Aborted(e.to_string()))
    }
}

/// Clears the sequencer's running flag when the owner task ends.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The single owner of a run's state.
struct Owner {
    builder: Arc<ArgumentBuilder>,
    runner: Arc<dyn InvocationRunner>,
    events: broadcast::Sender<BatchEvent>,
    progress: watch::Sender<BatchProgress>,
    cancel: CancellationToken,
}

impl Owner {
    async fn drive(self, mut run: BatchRun) -> BatchReport {
        info!(total = run.total(), "Batch started");
        self.publish(BatchEvent::batch_started(run.total()));

        while let Some(index) = run.next_index() {
            if self.cancel.is_cancelled() {
                run.cancel();
                break;
            }
            self.step(&mut run, index).await;
            if self.cancel.is_cancelled() {
                run.cancel();
            }
        }

        let state = run.final_state();
        self.progress.send_replace(run.progress(state));
        let report = run.into_report();

        info!(
            state = %state,
            succeeded = report.succeeded,
            failed = report.failed,
            "Batch finished"
        );
        self.publish(BatchEvent::batch_finished(
            state,
            report.succeeded,
            report.failed,
        ));
        report
    }

    async fn step(&self, run: &mut BatchRun, index: usize) {
        let (id, kind, params, shared) = {
            let item = run.item(index);
            (item.id, item.kind, item.params.clone(), item.descriptor.clone())
        };
        // Snapshot now so a duration probed after submission is used.
        let descriptor = shared.snapshot();

        run.activate(index);
        info!(
            item = %id,
            index,
            kind = %kind,
            path = %descriptor.path().display(),
            "Dispatching item"
        );
        self.publish(BatchEvent::item_started(id, index, kind));
        self.progress.send_replace(run.progress(BatchState::Running));

        let invocation = match self.builder.build(kind, &descriptor, &params) {
            Ok(invocation) => invocation,
            Err(e) => {
                warn!(item = %id, category = %e.category(), error = %e, "Item could not be built");
                self.fail(run, index, e.into());
                return;
            }
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let execution = self
            .runner
            .run(&invocation, tx, self.cancel.child_token());
        tokio::pin!(execution);

        let result = loop {
            tokio::select! {
                biased;

                Some(fraction) = rx.recv() => {
                    let overall = run.tick(fraction);
                    self.publish(BatchEvent::item_progress(id, index, fraction, overall));
                    self.progress.send_replace(run.progress(BatchState::Running));
                }
                result = &mut execution => break result,
            }
        };

        match result {
            Ok(RunOutcome::Completed { output }) if self.cancel.is_cancelled() => {
                warn!(item = %id, output = %output.display(), "Completion arrived after cancel");
                self.fail(run, index, ItemError::cancelled());
            }
            Ok(RunOutcome::Completed { output }) => {
                info!(item = %id, output = %output.display(), "Item completed");
                run.succeed(index, output.clone());
                self.publish(BatchEvent::item_completed(id, index, output));
                self.progress.send_replace(run.progress(BatchState::Running));
            }
            Ok(RunOutcome::Cancelled) => {
                info!(item = %id, "Item cancelled");
                self.fail(run, index, ItemError::cancelled());
            }
            Err(e) => {
                warn!(item = %id, category = %e.category(), error = %e, "Item failed");
                self.fail(run, index, e.into());
            }
        }
    }

    fn fail(&self, run: &mut BatchRun, index: usize, error: ItemError) {
        let id = run.item(index).id;
        let event = BatchEvent::item_failed(id, index, error.category, error.message.clone());
        run.fail(index, error);
        self.publish(event);
        self.progress.send_replace(run.progress(BatchState::Running));
    }

    fn publish(&self, event: BatchEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use reelforge_av::{BuilderSettings, Invocation, ProgressSender, RunError};
    use tokio_util::sync::CancellationToken;

    /// Runner that never finishes until cancelled.
    struct Hanging;

    #[async_trait]
    impl InvocationRunner for Hanging {
        async fn run(
            &self,
            _invocation: &Invocation,
            _progress: ProgressSender,
            cancel: CancellationToken,
        ) -> Result<RunOutcome, RunError> {
            cancel.cancelled().await;
            Ok(RunOutcome::Cancelled)
        }
    }

    fn sequencer() -> BatchSequencer {
        BatchSequencer::new(
            Arc::new(ArgumentBuilder::new(BuilderSettings::default())),
            Arc::new(Hanging),
        )
    }

    #[tokio::test]
    async fn test_empty_batch_completes_immediately() {
        let seq = sequencer();
        let handle = seq.start(Vec::new()).unwrap();
        assert_eq!(handle.progress().state, BatchState::Completed);
        assert_eq!(handle.progress().overall, 1.0);

        let report = handle.wait().await.unwrap();
        assert_eq!(report.state, BatchState::Completed);
        assert_eq!((report.succeeded, report.failed), (0, 0));
        assert!(!seq.is_running());
    }

    #[tokio::test]
    async fn test_cancel_before_wait_is_idempotent() {
        let seq = sequencer();
        let handle = seq.start(Vec::new()).unwrap();
        handle.cancel();
        handle.cancel();
        assert_matches!(handle.wait().await, Ok(_));
    }
}
