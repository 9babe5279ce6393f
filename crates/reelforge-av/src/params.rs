//! Operation parameters.
//!
//! One flat bag of optional fields shared by every kind. Each recipe reads the
//! fields it cares about and validates them; unknown keys are rejected at
//! deserialization so typos in job files surface early.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Target container for remuxing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// Matroska container
    Mkv,
    /// MPEG-4 Part 14 container
    Mp4,
    /// MPEG transport stream
    Ts,
    /// QuickTime container
    Mov,
    /// WebM container
    Webm,
    /// AVI container
    Avi,
}

impl Container {
    /// Get the file extension for this container.
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mkv => "mkv",
            Container::Mp4 => "mp4",
            Container::Ts => "ts",
            Container::Mov => "mov",
            Container::Webm => "webm",
            Container::Avi => "avi",
        }
    }
}

impl FromStr for Container {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mkv" | "matroska" => Ok(Container::Mkv),
            "mp4" | "m4v" => Ok(Container::Mp4),
            "ts" | "mpegts" => Ok(Container::Ts),
            "mov" | "quicktime" => Ok(Container::Mov),
            "webm" => Ok(Container::Webm),
            "avi" => Ok(Container::Avi),
            _ => Err(format!("Unknown container format: {}", s)),
        }
    }
}

/// Audio output format for conversion and extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Aac,
    Wav,
    Flac,
    Opus,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Aac => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Opus => "opus",
        }
    }

    /// Encoder name passed to `-c:a`.
    pub fn encoder(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "libmp3lame",
            AudioFormat::Aac => "aac",
            AudioFormat::Wav => "pcm_s16le",
            AudioFormat::Flac => "flac",
            AudioFormat::Opus => "libopus",
        }
    }

    /// Lossless formats take no bitrate.
    pub fn is_lossless(&self) -> bool {
        matches!(self, AudioFormat::Wav | AudioFormat::Flac)
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "aac" | "m4a" => Ok(AudioFormat::Aac),
            "wav" => Ok(AudioFormat::Wav),
            "flac" => Ok(AudioFormat::Flac),
            "opus" => Ok(AudioFormat::Opus),
            _ => Err(format!("Unknown audio format: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// Overlay anchor for watermarks and picture-in-picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl fmt::Display for Corner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::Center => "center",
        };
        f.write_str(s)
    }
}

/// Parameters for a single operation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperationParameters {
    // convert
    pub container: Option<Container>,
    pub audio_format: Option<AudioFormat>,
    /// Overrides the configured CRF for this request.
    pub crf: Option<u32>,
    pub preset: Option<String>,

    // timeline
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub parts: Option<u32>,
    pub target_size_mb: Option<f64>,
    /// Clips appended after the primary input when merging.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clips: Vec<PathBuf>,
    pub loop_count: Option<u32>,
    pub speed: Option<f64>,
    pub target_duration: Option<f64>,
    pub clip_count: Option<u32>,
    pub clip_seconds: Option<f64>,

    // video
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Degrees clockwise: 90, 180 or 270 (-90 is accepted as 270).
    pub rotation: Option<i32>,
    pub flip: Option<FlipAxis>,
    pub text: Option<String>,
    pub font_size: Option<u32>,
    pub position: Option<Corner>,
    pub margin: Option<u32>,
    pub fade_seconds: Option<f64>,

    // audio
    pub volume_db: Option<f64>,
    /// Background level for mix-audio, 0.0..=1.0.
    pub mix_level: Option<f64>,

    // compose
    /// Audio track, subtitle file or overlay video depending on the kind.
    pub secondary: Option<PathBuf>,
    /// Overlay size relative to the main picture.
    pub scale: Option<f64>,

    // export
    pub fps: Option<f64>,
    pub columns: Option<u32>,
    pub rows: Option<u32>,
    pub frame_count: Option<u32>,
    pub interval_seconds: Option<f64>,
    pub timestamp: Option<f64>,

    // ai
    pub language: Option<String>,
}

impl OperationParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secondary(mut self, path: impl Into<PathBuf>) -> Self {
        self.secondary = Some(path.into());
        self
    }

    pub fn with_clip(mut self, path: impl Into<PathBuf>) -> Self {
        self.clips.push(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_from_str_accepts_aliases() {
        assert_eq!("matroska".parse::<Container>().unwrap(), Container::Mkv);
        assert_eq!("M4V".parse::<Container>().unwrap(), Container::Mp4);
        assert!("flv".parse::<Container>().is_err());
    }

    #[test]
    fn audio_format_extensions() {
        assert_eq!(AudioFormat::default().extension(), "mp3");
        assert_eq!(AudioFormat::Aac.extension(), "m4a");
        assert!(AudioFormat::Flac.is_lossless());
        assert!(!AudioFormat::Opus.is_lossless());
    }

    #[test]
    fn deserializes_from_toml_table() {
        let params: OperationParameters = toml_like(
            r#"{"container": "mkv", "start": 5, "end": 12.5, "position": "top-left"}"#,
        );
        assert_eq!(params.container, Some(Container::Mkv));
        assert_eq!(params.start, Some(5.0));
        assert_eq!(params.end, Some(12.5));
        assert_eq!(params.position, Some(Corner::TopLeft));
        assert!(params.clips.is_empty());
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = serde_json::from_str::<OperationParameters>(r#"{"sped": 2.0}"#).unwrap_err();
        assert!(err.to_string().contains("sped"));
    }

    #[test]
    fn builder_helpers() {
        let params = OperationParameters::new()
            .with_secondary("/tmp/music.mp3")
            .with_clip("/tmp/b.mp4");
        assert_eq!(params.secondary, Some(PathBuf::from("/tmp/music.mp3")));
        assert_eq!(params.clips, vec![PathBuf::from("/tmp/b.mp4")]);
    }

    fn toml_like(json: &str) -> OperationParameters {
        serde_json::from_str(json).unwrap()
    }
}
