//! The closed catalog of operation kinds and their static metadata.

use std::fmt;
use std::str::FromStr;

use reelforge_common::MediaKind;
use serde::{Deserialize, Serialize};

/// Every transformation the builder knows how to express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Remux,
    Compress,
    ConvertAudio,
    ExtractAudio,
    ExtractAudioStream,
    Trim,
    SplitParts,
    SplitSize,
    Merge,
    Loop,
    Reverse,
    Speed,
    FitDuration,
    Summary,
    Resize,
    VerticalCrop,
    Rotate,
    Flip,
    Denoise,
    Watermark,
    Fade,
    RemoveAudio,
    ReplaceAudio,
    MixAudio,
    NormalizeAudio,
    Volume,
    CleanVoice,
    BurnSubtitles,
    PictureInPicture,
    Gif,
    ContactSheet,
    FramesCount,
    FramesInterval,
    Thumbnail,
    Waveform,
    Transcribe,
}

/// Grouping used for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Convert,
    Timeline,
    Video,
    Audio,
    Compose,
    Export,
    Ai,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Convert => "convert",
            Self::Timeline => "timeline",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Compose => "compose",
            Self::Export => "export",
            Self::Ai => "ai",
        };
        f.write_str(s)
    }
}

/// Which input kinds an operation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Inputs {
    VideoOnly,
    Any,
}

impl Inputs {
    pub fn accepts(self, kind: MediaKind) -> bool {
        match self {
            Self::VideoOnly => kind == MediaKind::Video,
            Self::Any => true,
        }
    }
}

/// How the output extension is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputExt {
    /// Stream copy: keep the input's container.
    Source,
    /// Re-encode: keep the input's container when it can hold the encoder output.
    Encoded,
    /// The `container` parameter.
    Container,
    /// The `audio_format` parameter, mp3 when absent.
    AudioFormat,
    Fixed(&'static str),
}

/// Static description of one operation kind.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OperationSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub category: Category,
    pub inputs: Inputs,
    pub requires_secondary_input: bool,
    pub requires_parameters: bool,
    pub output_suffix: &'static str,
    pub output_ext: OutputExt,
    /// printf-style counter in the file name, for multi-output kinds.
    pub numbered: Option<&'static str>,
    /// Asset path relative to the models directory.
    pub asset: Option<&'static str>,
    pub stream_copy: bool,
}

const fn spec(
    id: &'static str,
    title: &'static str,
    category: Category,
    inputs: Inputs,
    output_suffix: &'static str,
    output_ext: OutputExt,
) -> OperationSpec {
    OperationSpec {
        id,
        title,
        category,
        inputs,
        requires_secondary_input: false,
        requires_parameters: false,
        output_suffix,
        output_ext,
        numbered: None,
        asset: None,
        stream_copy: false,
    }
}

impl OperationSpec {
    const fn params(mut self) -> Self {
        self.requires_parameters = true;
        self
    }

    const fn secondary(mut self) -> Self {
        self.requires_secondary_input = true;
        self
    }

    const fn copy(mut self) -> Self {
        self.stream_copy = true;
        self
    }

    const fn numbered(mut self, counter: &'static str) -> Self {
        self.numbered = Some(counter);
        self
    }

    const fn asset(mut self, path: &'static str) -> Self {
        self.asset = Some(path);
        self
    }
}

use Category::*;
use Inputs::{Any, VideoOnly};
use OutputExt::{AudioFormat as AudioExt, Container as ContainerExt, Encoded, Fixed, Source};

const REMUX: OperationSpec =
    spec("remux", "Change container", Convert, VideoOnly, "_remux", ContainerExt)
        .params()
        .copy();
const COMPRESS: OperationSpec =
    spec("compress", "Compress video", Convert, VideoOnly, "_compressed", Fixed("mp4"));
const CONVERT_AUDIO: OperationSpec =
    spec("convert-audio", "Convert audio format", Convert, Any, "_converted", AudioExt).params();
const EXTRACT_AUDIO: OperationSpec =
    spec("extract-audio", "Extract audio", Convert, VideoOnly, "_audio", AudioExt);
const EXTRACT_AUDIO_STREAM: OperationSpec = spec(
    "extract-audio-stream",
    "Extract audio stream (no re-encode)",
    Convert,
    VideoOnly,
    "_audio",
    Fixed("mka"),
)
.copy();
const TRIM: OperationSpec = spec("trim", "Trim", Timeline, Any, "_trimmed", Source)
    .params()
    .copy();
const SPLIT_PARTS: OperationSpec =
    spec("split-parts", "Split into equal parts", Timeline, Any, "_part", Source)
        .params()
        .copy()
        .numbered("%03d");
const SPLIT_SIZE: OperationSpec =
    spec("split-size", "Split by target size", Timeline, Any, "_part", Source)
        .params()
        .copy()
        .numbered("%03d");
const MERGE: OperationSpec = spec("merge", "Merge clips", Timeline, Any, "_merged", Source)
    .secondary()
    .copy();
const LOOP: OperationSpec = spec("loop", "Loop", Timeline, Any, "_looped", Source)
    .params()
    .copy();
const REVERSE: OperationSpec = spec("reverse", "Reverse", Timeline, Any, "_reversed", Encoded);
const SPEED: OperationSpec = spec("speed", "Change speed", Timeline, Any, "_speed", Encoded).params();
const FIT_DURATION: OperationSpec =
    spec("fit-duration", "Fit to duration", Timeline, Any, "_fitted", Encoded).params();
const SUMMARY: OperationSpec =
    spec("summary", "Highlight summary", Timeline, VideoOnly, "_summary", Encoded).params();
const RESIZE: OperationSpec =
    spec("resize", "Resize with letterbox", Video, VideoOnly, "_resized", Encoded).params();
const VERTICAL_CROP: OperationSpec =
    spec("vertical-crop", "Crop to 9:16", Video, VideoOnly, "_vertical", Encoded);
const ROTATE: OperationSpec =
    spec("rotate", "Rotate", Video, VideoOnly, "_rotated", Encoded).params();
const FLIP: OperationSpec = spec("flip", "Flip", Video, VideoOnly, "_flipped", Encoded).params();
const DENOISE: OperationSpec =
    spec("denoise", "Reduce video noise", Video, VideoOnly, "_denoised", Encoded);
const WATERMARK: OperationSpec =
    spec("watermark", "Text watermark", Video, VideoOnly, "_watermarked", Encoded).params();
const FADE: OperationSpec = spec("fade", "Fade in and out", Video, Any, "_faded", Encoded);
const REMOVE_AUDIO: OperationSpec =
    spec("remove-audio", "Remove audio", Audio, VideoOnly, "_muted", Source).copy();
const REPLACE_AUDIO: OperationSpec =
    spec("replace-audio", "Replace audio track", Audio, VideoOnly, "_newaudio", Encoded).secondary();
const MIX_AUDIO: OperationSpec =
    spec("mix-audio", "Mix in background audio", Audio, Any, "_mixed", Encoded).secondary();
const NORMALIZE_AUDIO: OperationSpec =
    spec("normalize-audio", "Normalize loudness", Audio, Any, "_normalized", Encoded);
const VOLUME: OperationSpec =
    spec("volume", "Adjust volume", Audio, Any, "_volume", Encoded).params();
const CLEAN_VOICE: OperationSpec =
    spec("clean-voice", "Clean up voice", Audio, Any, "_clean", Encoded).asset("rnnoise/std.rnnn");
const BURN_SUBTITLES: OperationSpec =
    spec("burn-subtitles", "Burn in subtitles", Compose, VideoOnly, "_subtitled", Encoded)
        .secondary();
const PICTURE_IN_PICTURE: OperationSpec =
    spec("picture-in-picture", "Picture in picture", Compose, VideoOnly, "_pip", Encoded)
        .secondary();
const GIF: OperationSpec = spec("gif", "Animated GIF", Export, VideoOnly, "_anim", Fixed("gif"));
const CONTACT_SHEET: OperationSpec =
    spec("contact-sheet", "Contact sheet", Export, VideoOnly, "_contact", Fixed("jpg"));
const FRAMES_COUNT: OperationSpec =
    spec("frames-count", "Extract N frames", Export, VideoOnly, "_frame", Fixed("png"))
        .params()
        .numbered("%04d");
const FRAMES_INTERVAL: OperationSpec = spec(
    "frames-interval",
    "Extract frames at interval",
    Export,
    VideoOnly,
    "_frame",
    Fixed("png"),
)
.params()
.numbered("%04d");
const THUMBNAIL: OperationSpec =
    spec("thumbnail", "Thumbnail", Export, VideoOnly, "_thumb", Fixed("jpg"));
const WAVEFORM: OperationSpec =
    spec("waveform", "Waveform image", Export, Any, "_waveform", Fixed("png"));
const TRANSCRIBE: OperationSpec =
    spec("transcribe", "Transcribe speech", Ai, Any, "_transcript", Fixed("srt"))
        .asset("whisper/ggml-base.bin");

impl OperationKind {
    /// Every kind, in listing order.
    pub const ALL: [OperationKind; 36] = [
        Self::Remux,
        Self::Compress,
        Self::ConvertAudio,
        Self::ExtractAudio,
        Self::ExtractAudioStream,
        Self::Trim,
        Self::SplitParts,
        Self::SplitSize,
        Self::Merge,
        Self::Loop,
        Self::Reverse,
        Self::Speed,
        Self::FitDuration,
        Self::Summary,
        Self::Resize,
        Self::VerticalCrop,
        Self::Rotate,
        Self::Flip,
        Self::Denoise,
        Self::Watermark,
        Self::Fade,
        Self::RemoveAudio,
        Self::ReplaceAudio,
        Self::MixAudio,
        Self::NormalizeAudio,
        Self::Volume,
        Self::CleanVoice,
        Self::BurnSubtitles,
        Self::PictureInPicture,
        Self::Gif,
        Self::ContactSheet,
        Self::FramesCount,
        Self::FramesInterval,
        Self::Thumbnail,
        Self::Waveform,
        Self::Transcribe,
    ];

    pub fn spec(self) -> &'static OperationSpec {
        match self {
            Self::Remux => &REMUX,
            Self::Compress => &COMPRESS,
            Self::ConvertAudio => &CONVERT_AUDIO,
            Self::ExtractAudio => &EXTRACT_AUDIO,
            Self::ExtractAudioStream => &EXTRACT_AUDIO_STREAM,
            Self::Trim => &TRIM,
            Self::SplitParts => &SPLIT_PARTS,
            Self::SplitSize => &SPLIT_SIZE,
            Self::Merge => &MERGE,
            Self::Loop => &LOOP,
            Self::Reverse => &REVERSE,
            Self::Speed => &SPEED,
            Self::FitDuration => &FIT_DURATION,
            Self::Summary => &SUMMARY,
            Self::Resize => &RESIZE,
            Self::VerticalCrop => &VERTICAL_CROP,
            Self::Rotate => &ROTATE,
            Self::Flip => &FLIP,
            Self::Denoise => &DENOISE,
            Self::Watermark => &WATERMARK,
            Self::Fade => &FADE,
            Self::RemoveAudio => &REMOVE_AUDIO,
            Self::ReplaceAudio => &REPLACE_AUDIO,
            Self::MixAudio => &MIX_AUDIO,
            Self::NormalizeAudio => &NORMALIZE_AUDIO,
            Self::Volume => &VOLUME,
            Self::CleanVoice => &CLEAN_VOICE,
            Self::BurnSubtitles => &BURN_SUBTITLES,
            Self::PictureInPicture => &PICTURE_IN_PICTURE,
            Self::Gif => &GIF,
            Self::ContactSheet => &CONTACT_SHEET,
            Self::FramesCount => &FRAMES_COUNT,
            Self::FramesInterval => &FRAMES_INTERVAL,
            Self::Thumbnail => &THUMBNAIL,
            Self::Waveform => &WAVEFORM,
            Self::Transcribe => &TRANSCRIBE,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.spec().id
    }

    pub fn category(self) -> Category {
        self.spec().category
    }

    pub fn requires_secondary_input(self) -> bool {
        self.spec().requires_secondary_input
    }

    pub fn requires_parameters(self) -> bool {
        self.spec().requires_parameters
    }

    pub fn is_numbered(self) -> bool {
        self.spec().numbered.is_some()
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown operation id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for OperationKind {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for kind in OperationKind::ALL {
            assert!(seen.insert(kind.as_str()), "duplicate id {}", kind);
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
        assert_eq!(seen.len(), 36);
    }

    #[test]
    fn serde_id_matches_catalog_id() {
        for kind in OperationKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn parse_is_lenient_about_case_and_underscores() {
        assert_eq!(
            "Picture_In_Picture".parse::<OperationKind>().unwrap(),
            OperationKind::PictureInPicture
        );
        assert!("explode".parse::<OperationKind>().is_err());
    }

    #[test]
    fn numbered_kinds_are_exactly_the_multi_output_ones() {
        let numbered: Vec<_> = OperationKind::ALL
            .into_iter()
            .filter(|k| k.is_numbered())
            .collect();
        assert_eq!(
            numbered,
            vec![
                OperationKind::SplitParts,
                OperationKind::SplitSize,
                OperationKind::FramesCount,
                OperationKind::FramesInterval,
            ]
        );
    }

    #[test]
    fn secondary_input_kinds() {
        for kind in [
            OperationKind::Merge,
            OperationKind::ReplaceAudio,
            OperationKind::MixAudio,
            OperationKind::BurnSubtitles,
            OperationKind::PictureInPicture,
        ] {
            assert!(kind.requires_secondary_input(), "{kind}");
        }
        assert!(!OperationKind::Trim.requires_secondary_input());
    }

    #[test]
    fn suffixes_are_never_empty() {
        for kind in OperationKind::ALL {
            assert!(kind.spec().output_suffix.starts_with('_'), "{kind}");
        }
    }

    #[test]
    fn inputs_accept() {
        assert!(Inputs::Any.accepts(MediaKind::Audio));
        assert!(!Inputs::VideoOnly.accepts(MediaKind::Audio));
        assert!(Inputs::VideoOnly.accepts(MediaKind::Video));
    }
}
