//! TOML job files describing a batch.
//!
//! ```toml
//! [[items]]
//! path = "intro.mp4"
//! operation = "trim"
//!
//! [items.params]
//! start = 5.0
//! end = 12.0
//!
//! [[items]]
//! path = "talk.mp4"
//! operation = "replace-audio"
//! secondary = "voiceover.m4a"
//! ```
//!
//! Relative paths are resolved against the job file's directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reelforge_av::{OperationKind, OperationParameters};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobFile {
    #[serde(default)]
    pub items: Vec<JobItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobItem {
    pub path: PathBuf,
    /// Operation id, e.g. `split-parts` (underscores are accepted too).
    pub operation: String,
    #[serde(default)]
    pub secondary: Option<PathBuf>,
    /// Clips appended after `path` when merging.
    #[serde(default)]
    pub clips: Vec<PathBuf>,
    #[serde(default)]
    pub params: OperationParameters,
}

/// A job item with its operation resolved and paths made absolute.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedItem {
    pub path: PathBuf,
    pub kind: OperationKind,
    pub params: OperationParameters,
}

impl JobFile {
    /// Load and parse a job file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file: {}", path.display()))?;
        content
            .parse()
            .with_context(|| format!("Failed to parse job file: {}", path.display()))
    }

    /// Resolve every item against `base_dir`.
    ///
    /// Fails on the first unknown operation, naming its position.
    pub fn plan(&self, base_dir: &Path) -> Result<Vec<PlannedItem>> {
        self.items
            .iter()
            .enumerate()
            .map(|(n, item)| item.plan(base_dir).with_context(|| format!("job item {}", n + 1)))
            .collect()
    }
}

impl std::str::FromStr for JobFile {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

impl JobItem {
    fn plan(&self, base_dir: &Path) -> Result<PlannedItem> {
        let kind: OperationKind = self.operation.parse()?;
        let resolve = |p: &Path| -> PathBuf {
            let expanded = crate::config::expand(p);
            if expanded.is_absolute() {
                expanded
            } else {
                base_dir.join(expanded)
            }
        };

        let mut params = self.params.clone();
        params.secondary = self
            .secondary
            .as_deref()
            .or(params.secondary.as_deref())
            .map(resolve);
        let mut clips: Vec<PathBuf> = params.clips.iter().map(|c| resolve(c)).collect();
        clips.extend(self.clips.iter().map(|c| resolve(c)));
        params.clips = clips;

        Ok(PlannedItem {
            path: resolve(&self.path),
            kind,
            params,
        })
    }
}
