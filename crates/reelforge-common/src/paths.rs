//! Path utilities for detecting media kinds by extension.
//!
//! Ingestion uses these to decide whether a dropped file is a video or an
//! audio source; the argument builder uses [`is_subtitle_file`] to reject a
//! secondary input that cannot be burned in.

use std::path::Path;

use crate::types::MediaKind;

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "webm", "mov", "wmv", "flv", "mts", "m2ts",
];

/// List of supported audio file extensions.
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "aac", "wav", "flac", "ogg", "opus", "wma", "aiff", "mka",
];

/// List of supported subtitle file extensions.
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "vtt"];

fn has_extension(path: &Path, list: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| list.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use reelforge_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("clip.mkv")));
/// assert!(!is_video_file(Path::new("song.mp3")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

/// Check if a path has an audio file extension.
pub fn is_audio_file(path: &Path) -> bool {
    has_extension(path, AUDIO_EXTENSIONS)
}

/// Check if a path has a subtitle file extension.
pub fn is_subtitle_file(path: &Path) -> bool {
    has_extension(path, SUBTITLE_EXTENSIONS)
}

/// Classify a path as video or audio by its extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use reelforge_common::{paths::media_kind_for, MediaKind};
///
/// assert_eq!(media_kind_for(Path::new("a.MOV")), Some(MediaKind::Video));
/// assert_eq!(media_kind_for(Path::new("a.flac")), Some(MediaKind::Audio));
/// assert_eq!(media_kind_for(Path::new("a.txt")), None);
/// ```
pub fn media_kind_for(path: &Path) -> Option<MediaKind> {
    if is_video_file(path) {
        Some(MediaKind::Video)
    } else if is_audio_file(path) {
        Some(MediaKind::Audio)
    } else {
        None
    }
}

/// Get the list of video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

/// Get the list of audio file extensions.
#[must_use]
pub fn audio_extensions() -> &'static [&'static str] {
    AUDIO_EXTENSIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("movie.mkv")));
        assert!(is_video_file(Path::new("movie.mp4")));
        assert!(is_video_file(Path::new("movie.MOV")));
        assert!(is_video_file(Path::new("/path/to/movie.webm")));

        assert!(!is_video_file(Path::new("subtitle.srt")));
        assert!(!is_video_file(Path::new("song.mp3")));
        assert!(!is_video_file(Path::new("no_extension")));
    }

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("song.mp3")));
        assert!(is_audio_file(Path::new("song.FLAC")));
        assert!(is_audio_file(Path::new("voice.m4a")));

        assert!(!is_audio_file(Path::new("movie.mp4")));
        assert!(!is_audio_file(Path::new("")));
    }

    #[test]
    fn test_is_subtitle_file() {
        assert!(is_subtitle_file(Path::new("movie.en.srt")));
        assert!(is_subtitle_file(Path::new("movie.ASS")));
        assert!(!is_subtitle_file(Path::new("movie.mkv")));
    }

    #[test]
    fn test_media_kind_for() {
        assert_eq!(media_kind_for(Path::new("x.mp4")), Some(MediaKind::Video));
        assert_eq!(media_kind_for(Path::new("x.wav")), Some(MediaKind::Audio));
        assert_eq!(media_kind_for(Path::new("x.srt")), None);
        assert_eq!(media_kind_for(Path::new(".hidden.mkv")), Some(MediaKind::Video));
    }

    #[test]
    fn test_extension_lists_are_disjoint() {
        for ext in video_extensions() {
            assert!(!audio_extensions().contains(ext), "{ext} listed twice");
        }
    }
}
