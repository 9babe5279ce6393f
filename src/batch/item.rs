//! Queue items and their outcomes.

use std::path::PathBuf;

use reelforge_av::{BuildError, ErrorCategory, OperationKind, OperationParameters, RunError};
use reelforge_common::{ItemId, SharedDescriptor};
use serde::Serialize;

/// Lifecycle of a single queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Not dispatched yet. Items left here by a cancelled run are unreported.
    Pending,
    Active,
    Done,
    Failed,
}

impl ItemStatus {
    /// Whether the item has a recorded outcome.
    pub fn is_reported(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Why an item failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemError {
    pub category: ErrorCategory,
    pub message: String,
    /// Raw tool output, when the tool ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

impl ItemError {
    /// The runner reported the invocation as cancelled.
    pub fn cancelled() -> Self {
        Self {
            category: ErrorCategory::Execution,
            message: "cancelled".to_string(),
            diagnostics: None,
        }
    }
}

impl From<BuildError> for ItemError {
    fn from(e: BuildError) -> Self {
        Self {
            category: e.category(),
            message: e.to_string(),
            diagnostics: None,
        }
    }
}

impl From<RunError> for ItemError {
    fn from(e: RunError) -> Self {
        Self {
            category: e.category(),
            message: e.to_string(),
            diagnostics: e.diagnostics().map(str::to_string),
        }
    }
}

/// One unit of work: a file, what to do with it, and how it went.
#[derive(Debug, Clone, Serialize)]
pub struct QueueItem {
    pub id: ItemId,
    pub descriptor: SharedDescriptor,
    pub kind: OperationKind,
    pub params: OperationParameters,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemError>,
}

impl QueueItem {
    pub fn new(
        descriptor: impl Into<SharedDescriptor>,
        kind: OperationKind,
        params: OperationParameters,
    ) -> Self {
        Self {
            id: ItemId::new(),
            descriptor: descriptor.into(),
            kind,
            params,
            status: ItemStatus::Pending,
            output: None,
            error: None,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.status = ItemStatus::Pending;
        self.output = None;
        self.error = None;
    }

    pub(crate) fn succeed(&mut self, output: PathBuf) {
        self.status = ItemStatus::Done;
        self.output = Some(output);
        self.error = None;
    }

    pub(crate) fn fail(&mut self, error: ItemError) {
        self.status = ItemStatus::Failed;
        self.output = None;
        self.error = Some(error);
    }
}
