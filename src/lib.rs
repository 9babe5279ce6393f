//! Reelforge - batch media transformations driven by ffmpeg
//!
//! This library crate exposes the batch sequencer, configuration and probing
//! for the CLI and for integration testing.

pub mod batch;
pub mod config;
pub mod probe;
