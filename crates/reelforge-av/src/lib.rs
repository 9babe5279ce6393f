//! # reelforge-av
//!
//! The processing core of reelforge.
//!
//! - **Operation catalog** ([`OperationKind`]) -- the closed set of
//!   transformations and their static metadata.
//! - **Argument Builder** ([`ArgumentBuilder`]) -- turns a kind, a
//!   [`MediaDescriptor`](reelforge_common::MediaDescriptor) and
//!   [`OperationParameters`] into an [`Invocation`].
//! - **Tool discovery** ([`ToolRegistry`]) -- resolves ffmpeg and ffprobe.
//! - **Process Runner** ([`ProcessRunner`]) -- executes one invocation at a
//!   time with progress, diagnostics and cancellation.

pub mod builder;
pub mod diagnostics;
pub mod error;
pub mod operation;
pub mod params;
pub mod progress;
pub mod runner;
pub mod tools;

pub use builder::{ArgumentBuilder, BuilderSettings, EncoderSettings, Invocation, StagedFile};
pub use diagnostics::FailureKind;
pub use error::{BuildError, Error, ErrorCategory, Result, RunError};
pub use operation::{Category, OperationKind, OperationSpec};
pub use params::{AudioFormat, Container, Corner, FlipAxis, OperationParameters};
pub use runner::{InvocationRunner, ProcessRunner, ProgressSender, RunOutcome};
pub use tools::{ToolInfo, ToolRegistry, ToolsConfig};
