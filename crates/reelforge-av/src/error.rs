//! Error types for reelforge-av.
//!
//! Building and running are kept apart: a [`BuildError`] never reaches the
//! external process, a [`RunError`] is always attributed to exactly one
//! invocation. Both map onto an [`ErrorCategory`] for reporting.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::diagnostics::FailureKind;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification used when reporting failures to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad or missing user-supplied input. Never reaches the external process.
    Configuration,
    /// Duration or size unavailable for an operation that needs it.
    Metadata,
    /// The external tool could not be resolved or started.
    Launch,
    /// The external tool ran and exited unsuccessfully.
    Execution,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Configuration => "configuration",
            Self::Metadata => "metadata",
            Self::Launch => "launch",
            Self::Execution => "execution",
        };
        f.write_str(s)
    }
}

/// Failure to turn an operation request into an invocation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// A derived parameter needs metadata the descriptor does not carry.
    #[error("missing metadata: {field} is not known for this file")]
    MissingMetadata { field: &'static str },

    /// The operation needs a second file and none was given.
    #[error("this operation requires a secondary input file")]
    MissingSecondaryInput,

    /// An auxiliary model or asset is not installed.
    #[error("missing asset: expected at {}", path.display())]
    MissingAsset { path: PathBuf },

    /// A parameter is absent or out of range.
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },
}

impl BuildError {
    pub fn missing_metadata(field: &'static str) -> Self {
        Self::MissingMetadata { field }
    }

    pub fn missing_asset(path: impl Into<PathBuf>) -> Self {
        Self::MissingAsset { path: path.into() }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// Shorthand for a required parameter that was not supplied.
    pub fn required(field: &'static str) -> Self {
        Self::invalid(field, "required for this operation")
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingMetadata { .. } => ErrorCategory::Metadata,
            Self::MissingSecondaryInput
            | Self::MissingAsset { .. }
            | Self::InvalidParameter { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Failure while supervising an external process.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunError {
    /// The process could not be started.
    #[error("failed to launch: {message}")]
    Launch { message: String },

    /// The process exited with a non-zero status.
    #[error("{} (exit code {})", kind.description(), code.map(|c| c.to_string()).unwrap_or_else(|| "none".into()))]
    Execution {
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// Best-effort classification of the diagnostic text.
        kind: FailureKind,
        /// Diagnostic output exactly as the tool printed it.
        diagnostics: String,
    },

    /// Another invocation already holds this runner's process slot.
    #[error("runner is busy with another invocation")]
    Busy,
}

impl RunError {
    pub fn launch(message: impl Into<String>) -> Self {
        Self::Launch {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Launch { .. } | Self::Busy => ErrorCategory::Launch,
            Self::Execution { .. } => ErrorCategory::Execution,
        }
    }

    /// Raw diagnostic text, when the tool produced any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::Execution { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }
}

/// Errors surfaced by the crate's non-core helpers (tool discovery, probing).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool failed to execute.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed { tool: String, message: String },

    /// Failed to parse tool output.
    #[error("failed to parse {tool} output: {message}")]
    ParseError { tool: String, message: String },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Run(#[from] RunError),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Build(e) => e.category(),
            Self::Run(e) => e.category(),
            Self::ToolNotFound { .. } | Self::ToolFailed { .. } => ErrorCategory::Launch,
            Self::ParseError { .. } | Self::Io(_) | Self::Json(_) => ErrorCategory::Execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_categories() {
        assert_eq!(
            BuildError::missing_metadata("duration").category(),
            ErrorCategory::Metadata
        );
        assert_eq!(
            BuildError::MissingSecondaryInput.category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            BuildError::missing_asset("/models/x.bin").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            BuildError::invalid("parts", "must be at least 1").category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn build_error_display_names_the_field() {
        let err = BuildError::invalid("speed", "must be positive");
        assert_eq!(err.to_string(), "invalid parameter `speed`: must be positive");

        let err = BuildError::missing_asset("/opt/models/whisper/ggml-base.bin");
        assert!(err.to_string().contains("/opt/models/whisper/ggml-base.bin"));
    }

    #[test]
    fn run_error_keeps_diagnostics() {
        let err = RunError::Execution {
            code: Some(1),
            kind: FailureKind::CorruptInput,
            diagnostics: "moov atom not found".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Execution);
        assert_eq!(err.diagnostics(), Some("moov atom not found"));
        assert!(err.to_string().contains("exit code 1"));

        assert_eq!(RunError::launch("no such binary").category(), ErrorCategory::Launch);
        assert_eq!(RunError::Busy.diagnostics(), None);
    }

    #[test]
    fn crate_error_wraps_build_and_run() {
        let err = Error::from(BuildError::MissingSecondaryInput);
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.to_string(), "this operation requires a secondary input file");

        let err = Error::tool_not_found("ffmpeg");
        assert_eq!(err.to_string(), "tool not found: ffmpeg");
        assert_eq!(err.category(), ErrorCategory::Launch);
    }
}
