//! Batch execution: queue items, the sequencer that runs them one at a
//! time, its events, and TOML job files.

pub mod events;
pub mod item;
pub mod job;
pub mod run;
pub mod sequencer;

pub use events::BatchEvent;
pub use item::{ItemError, ItemStatus, QueueItem};
pub use job::{JobFile, JobItem, PlannedItem};
pub use run::{overall_progress, BatchProgress, BatchReport, BatchState};
pub use sequencer::{BatchHandle, BatchSequencer};

/// Errors from starting or awaiting a batch run.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// A run is already active on this sequencer.
    #[error("a batch is already running")]
    AlreadyRunning,

    /// The owner task panicked or was aborted.
    #[error("batch task aborted: {0}")]
    Aborted(String),
}
