//! Core media types.
//!
//! A [`MediaDescriptor`] is created once at ingestion and never mutated. The
//! only field that may arrive late is the duration, which an external probe
//! fills in; callers that need to observe that transition hold a
//! [`SharedDescriptor`] and take a snapshot whenever they need to read it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::paths::media_kind_for;

/// Kind of media a descriptor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A file with a video stream (audio optional).
    Video,
    /// An audio-only file.
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// Immutable record describing one ingested media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    path: PathBuf,
    kind: MediaKind,
    size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
}

impl MediaDescriptor {
    /// Create a descriptor whose duration is not yet known.
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            kind,
            size_bytes,
            duration: None,
        }
    }

    /// Build a descriptor from a file on disk.
    ///
    /// The kind is derived from the extension and the size from filesystem
    /// metadata. Duration is left absent for the probe to fill in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the path does not exist and
    /// [`Error::UnsupportedMedia`] if the extension is not a known video or
    /// audio extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::file_not_found(path)
            } else {
                Error::Io(e)
            }
        })?;
        let kind = media_kind_for(path).ok_or_else(|| Error::unsupported_media(path))?;
        Ok(Self::new(path, kind, metadata.len()))
    }

    /// Return a copy of this descriptor with the probed duration attached.
    ///
    /// Non-finite or negative values are treated as "still unknown".
    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = valid_duration(seconds);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Duration in seconds, if a probe has supplied one.
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    /// File name without its extension, used as the base of output names.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string())
    }

    /// Lowercase extension of the source file, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

fn valid_duration(seconds: f64) -> Option<f64> {
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}

/// Shared handle to a descriptor whose duration may be patched by a probe
/// running concurrently with the batch.
#[derive(Debug, Clone)]
pub struct SharedDescriptor(Arc<RwLock<MediaDescriptor>>);

impl SharedDescriptor {
    pub fn new(descriptor: MediaDescriptor) -> Self {
        Self(Arc::new(RwLock::new(descriptor)))
    }

    /// Copy out the current state of the descriptor.
    pub fn snapshot(&self) -> MediaDescriptor {
        self.0.read().clone()
    }

    /// Attach a probed duration. Later reads observe the new value.
    pub fn set_duration(&self, seconds: f64) {
        let mut guard = self.0.write();
        guard.duration = valid_duration(seconds);
    }

    pub fn path(&self) -> PathBuf {
        self.0.read().path.clone()
    }
}

impl From<MediaDescriptor> for SharedDescriptor {
    fn from(descriptor: MediaDescriptor) -> Self {
        Self::new(descriptor)
    }
}

impl Serialize for SharedDescriptor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.read().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_display_and_serde() {
        assert_eq!(MediaKind::Video.to_string(), "video");
        assert_eq!(MediaKind::Audio.to_string(), "audio");
        assert_eq!(serde_json::to_string(&MediaKind::Audio).unwrap(), "\"audio\"");
    }

    #[test]
    fn test_descriptor_starts_without_duration() {
        let desc = MediaDescriptor::new("/m/clip.mp4", MediaKind::Video, 42);
        assert_eq!(desc.duration(), None);
        assert_eq!(desc.size_bytes(), 42);
        assert_eq!(desc.stem(), "clip");
        assert_eq!(desc.extension().as_deref(), Some("mp4"));
        assert!(desc.is_video());
    }

    #[test]
    fn test_with_duration_rejects_garbage() {
        let desc = MediaDescriptor::new("a.mp3", MediaKind::Audio, 1);
        assert_eq!(desc.clone().with_duration(3.5).duration(), Some(3.5));
        assert_eq!(desc.clone().with_duration(f64::NAN).duration(), None);
        assert_eq!(desc.with_duration(-1.0).duration(), None);
    }

    #[test]
    fn test_from_path_reads_size_and_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take1.wav");
        std::fs::write(&path, vec![0u8; 128]).unwrap();

        let desc = MediaDescriptor::from_path(&path).unwrap();
        assert_eq!(desc.kind(), MediaKind::Audio);
        assert_eq!(desc.size_bytes(), 128);
        assert_eq!(desc.duration(), None);
    }

    #[test]
    fn test_from_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp4");
        assert!(matches!(
            MediaDescriptor::from_path(&missing),
            Err(Error::FileNotFound { .. })
        ));

        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, b"hi").unwrap();
        assert!(matches!(
            MediaDescriptor::from_path(&notes),
            Err(Error::UnsupportedMedia { .. })
        ));
    }

    #[test]
    fn test_shared_descriptor_duration_transition() {
        let shared = SharedDescriptor::new(MediaDescriptor::new("v.mkv", MediaKind::Video, 10));
        let before = shared.snapshot();
        assert_eq!(before.duration(), None);

        shared.set_duration(90.0);
        assert_eq!(shared.snapshot().duration(), Some(90.0));
        // Earlier snapshots are unaffected.
        assert_eq!(before.duration(), None);
    }

    #[test]
    fn test_shared_descriptor_serializes_snapshot() {
        let shared = SharedDescriptor::new(
            MediaDescriptor::new("v.mkv", MediaKind::Video, 10).with_duration(2.0),
        );
        let json = serde_json::to_value(&shared).unwrap();
        assert_eq!(json["kind"], "video");
        assert_eq!(json["duration"], 2.0);
    }
}
