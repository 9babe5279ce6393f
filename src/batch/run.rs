//! Working state of one batch run and the snapshots published from it.

use serde::Serialize;

use super::item::{ItemError, ItemStatus, QueueItem};

/// Sequencer state machine: `Idle -> Running -> {Completed, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// `(finished + current) / total`, clamped to `0.0..=1.0`.
///
/// An empty batch counts as fully done.
pub fn overall_progress(finished: usize, current_fraction: f64, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }
    let current = if current_fraction.is_finite() {
        current_fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    ((finished as f64 + current) / total as f64).clamp(0.0, 1.0)
}

/// Snapshot of a run as seen from outside the owner task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchProgress {
    pub state: BatchState,
    pub total: usize,
    /// Items with a recorded outcome.
    pub finished: usize,
    /// Index of the active item.
    pub current: Option<usize>,
    /// Fraction of the active item, absent while indeterminate.
    pub current_fraction: Option<f64>,
    pub overall: f64,
}

impl Default for BatchProgress {
    fn default() -> Self {
        Self {
            state: BatchState::Idle,
            total: 0,
            finished: 0,
            current: None,
            current_fraction: None,
            overall: 0.0,
        }
    }
}

/// Final summary of a run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub state: BatchState,
    pub succeeded: usize,
    pub failed: usize,
    /// Every submitted item in submission order. Items never dispatched are
    /// still `Pending`.
    pub items: Vec<QueueItem>,
}

impl BatchReport {
    /// Items that have an outcome.
    pub fn reported(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter().filter(|i| i.status.is_reported())
    }

    pub fn all_succeeded(&self) -> bool {
        self.state == BatchState::Completed && self.failed == 0
    }
}

/// Mutable state owned by the sequencer task for the duration of a run.
#[derive(Debug)]
pub(crate) struct BatchRun {
    items: Vec<QueueItem>,
    index: usize,
    finished: usize,
    succeeded: usize,
    failed: usize,
    current_fraction: Option<f64>,
    cancelled: bool,
}

impl BatchRun {
    pub(crate) fn new(mut items: Vec<QueueItem>) -> Self {
        for item in &mut items {
            item.reset();
        }
        Self {
            items,
            index: 0,
            finished: 0,
            succeeded: 0,
            failed: 0,
            current_fraction: None,
            cancelled: false,
        }
    }

    pub(crate) fn total(&self) -> usize {
        self.items.len()
    }

    /// Index of the next item to dispatch, or `None` once the queue is
    /// exhausted or the run was cancelled.
    pub(crate) fn next_index(&self) -> Option<usize> {
        (!self.cancelled && self.index < self.items.len()).then_some(self.index)
    }

    pub(crate) fn item(&self, index: usize) -> &QueueItem {
        &self.items[index]
    }

    pub(crate) fn activate(&mut self, index: usize) {
        self.items[index].status = ItemStatus::Active;
        self.current_fraction = None;
    }

    /// Record a progress tick for the active item. Returns the new overall
    /// fraction.
    pub(crate) fn tick(&mut self, fraction: f64) -> f64 {
        self.current_fraction = Some(fraction.clamp(0.0, 1.0));
        self.overall()
    }

    pub(crate) fn succeed(&mut self, index: usize, output: std::path::PathBuf) {
        self.items[index].succeed(output);
        self.succeeded += 1;
        self.advance();
    }

    pub(crate) fn fail(&mut self, index: usize, error: ItemError) {
        self.items[index].fail(error);
        self.failed += 1;
        self.advance();
    }

    pub(crate) fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn advance(&mut self) {
        self.finished += 1;
        self.index += 1;
        self.current_fraction = None;
    }

    pub(crate) fn overall(&self) -> f64 {
        overall_progress(
            self.finished,
            self.current_fraction.unwrap_or(0.0),
            self.items.len(),
        )
    }

    pub(crate) fn progress(&self, state: BatchState) -> BatchProgress {
        let active = self
            .items
            .get(self.index)
            .filter(|i| i.status == ItemStatus::Active)
            .map(|_| self.index);
        BatchProgress {
            state,
            total: self.items.len(),
            finished: self.finished,
            current: active,
            current_fraction: active.and(self.current_fraction),
            overall: self.overall(),
        }
    }

    pub(crate) fn final_state(&self) -> BatchState {
        if self.cancelled {
            BatchState::Cancelled
        } else {
            BatchState::Completed
        }
    }

    pub(crate) fn into_report(self) -> BatchReport {
        BatchReport {
            state: self.final_state(),
            succeeded: self.succeeded,
            failed: self.failed,
            items: self.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelforge_av::{OperationKind, OperationParameters};
    use reelforge_common::{MediaDescriptor, MediaKind};
    use std::path::PathBuf;

    fn items(n: usize) -> Vec<QueueItem> {
        (0..n)
            .map(|i| {
                QueueItem::new(
                    MediaDescriptor::new(format!("/in/{i}.mp4"), MediaKind::Video, 10),
                    OperationKind::Reverse,
                    OperationParameters::new(),
                )
            })
            .collect()
    }

    #[test]
    fn test_overall_progress() {
        assert_eq!(overall_progress(1, 0.5, 3), 0.5);
        assert_eq!(overall_progress(0, 0.0, 4), 0.0);
        assert_eq!(overall_progress(4, 0.0, 4), 1.0);
        assert_eq!(overall_progress(0, 0.0, 0), 1.0);
        assert_eq!(overall_progress(1, f64::NAN, 2), 0.5);
        assert_eq!(overall_progress(1, 7.0, 2), 1.0);
    }

    #[test]
    fn test_run_aggregates_over_ticks() {
        let mut run = BatchRun::new(items(3));
        run.activate(0);
        run.succeed(0, PathBuf::from("/out/0.mp4"));
        run.activate(1);
        assert_eq!(run.tick(0.5), 0.5);

        let progress = run.progress(BatchState::Running);
        assert_eq!(progress.current, Some(1));
        assert_eq!(progress.current_fraction, Some(0.5));
        assert_eq!(progress.finished, 1);
    }

    #[test]
    fn test_fraction_is_not_cached_across_items() {
        let mut run = BatchRun::new(items(2));
        run.activate(0);
        run.tick(0.9);
        run.fail(0, ItemError::cancelled());
        run.activate(1);
        assert_eq!(run.overall(), 0.5);
        assert_eq!(run.progress(BatchState::Running).current_fraction, None);
    }

    #[test]
    fn test_cancel_stops_dispatch_and_leaves_rest_pending() {
        let mut run = BatchRun::new(items(3));
        assert_eq!(run.next_index(), Some(0));
        run.activate(0);
        run.cancel();
        run.fail(0, ItemError::cancelled());
        assert_eq!(run.next_index(), None);

        let report = run.into_report();
        assert_eq!(report.state, BatchState::Cancelled);
        assert_eq!((report.succeeded, report.failed), (0, 1));
        assert_eq!(report.reported().count(), 1);
        assert_eq!(report.items[1].status, ItemStatus::Pending);
        assert_eq!(report.items[2].status, ItemStatus::Pending);
    }

    #[test]
    fn test_new_run_resets_items() {
        let mut previous = items(1);
        previous[0].fail(ItemError::cancelled());
        let run = BatchRun::new(previous);
        assert_eq!(run.item(0).status, ItemStatus::Pending);
        assert!(run.item(0).error.is_none());
    }
}
