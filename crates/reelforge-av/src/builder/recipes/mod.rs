//! Per-kind argument recipes, grouped by catalog category.

pub(super) mod audio;
pub(super) mod compose;
pub(super) mod convert;
pub(super) mod export;
pub(super) mod timeline;
pub(super) mod video;

use crate::error::BuildError;

/// Unwrap a required parameter.
fn required<T>(value: Option<T>, field: &'static str) -> Result<T, BuildError> {
    value.ok_or_else(|| BuildError::required(field))
}

/// A required count of at least one.
fn count(value: Option<u32>, field: &'static str) -> Result<u32, BuildError> {
    match required(value, field)? {
        0 => Err(BuildError::invalid(field, "must be at least 1")),
        n => Ok(n),
    }
}

/// An optional count of at least one, falling back to `default`.
fn count_or(value: Option<u32>, default: u32, field: &'static str) -> Result<u32, BuildError> {
    count(value.or(Some(default)), field)
}
