//! Events published on the sequencer's broadcast bus.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use reelforge_av::{ErrorCategory, OperationKind};
use reelforge_common::ItemId;
use serde::Serialize;

use super::run::BatchState;

/// Something observable happened during a batch run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum BatchEvent {
    /// A run has entered `Running`.
    BatchStarted {
        total: usize,
        timestamp: DateTime<Utc>,
    },
    /// An item was handed to the builder.
    ItemStarted {
        id: ItemId,
        index: usize,
        kind: OperationKind,
        timestamp: DateTime<Utc>,
    },
    /// Progress tick of the active item.
    ItemProgress {
        id: ItemId,
        index: usize,
        fraction: f64,
        overall: f64,
    },
    ItemCompleted {
        id: ItemId,
        index: usize,
        output: PathBuf,
        timestamp: DateTime<Utc>,
    },
    ItemFailed {
        id: ItemId,
        index: usize,
        category: ErrorCategory,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// The run reached `Completed` or `Cancelled`.
    BatchFinished {
        state: BatchState,
        succeeded: usize,
        failed: usize,
        timestamp: DateTime<Utc>,
    },
}

impl BatchEvent {
    pub fn batch_started(total: usize) -> Self {
        Self::BatchStarted {
            total,
            timestamp: Utc::now(),
        }
    }

    pub fn item_started(id: ItemId, index: usize, kind: OperationKind) -> Self {
        Self::ItemStarted {
            id,
            index,
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn item_progress(id: ItemId, index: usize, fraction: f64, overall: f64) -> Self {
        Self::ItemProgress {
            id,
            index,
            fraction,
            overall,
        }
    }

    pub fn item_completed(id: ItemId, index: usize, output: PathBuf) -> Self {
        Self::ItemCompleted {
            id,
            index,
            output,
            timestamp: Utc::now(),
        }
    }

    pub fn item_failed(id: ItemId, index: usize, category: ErrorCategory, error: String) -> Self {
        Self::ItemFailed {
            id,
            index,
            category,
            error,
            timestamp: Utc::now(),
        }
    }

    pub fn batch_finished(state: BatchState, succeeded: usize, failed: usize) -> Self {
        Self::BatchFinished {
            state,
            succeeded,
            failed,
            timestamp: Utc::now(),
        }
    }

    /// Index of the item the event refers to, if any.
    pub fn item_index(&self) -> Option<usize> {
        match self {
            Self::ItemStarted { index, .. }
            | Self::ItemProgress { index, .. }
            | Self::ItemCompleted { index, .. }
            | Self::ItemFailed { index, .. } => Some(*index),
            Self::BatchStarted { .. } | Self::BatchFinished { .. } => None,
        }
    }
}
