//! Reelforge-Common: Shared types and utilities.
//!
//! This crate provides the vocabulary shared by the argument builder, the
//! process runner and the batch sequencer:
//!
//! - **Media descriptors**: [`MediaDescriptor`] and the patchable
//!   [`SharedDescriptor`] handle
//! - **Typed IDs**: [`ItemId`] for queue items
//! - **Path Utilities**: media-kind detection by extension
//! - **Error Handling**: common error type and result alias
//!
//! # Examples
//!
//! ```
//! use reelforge_common::{MediaDescriptor, MediaKind};
//!
//! let desc = MediaDescriptor::new("/clips/intro.mp4", MediaKind::Video, 1_000_000);
//! assert!(desc.duration().is_none());
//!
//! let probed = desc.with_duration(12.5);
//! assert_eq!(probed.duration(), Some(12.5));
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
