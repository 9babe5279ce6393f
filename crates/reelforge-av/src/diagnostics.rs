//! Best-effort classification of the external tool's diagnostic output.

use serde::{Deserialize, Serialize};

/// What most likely went wrong, judged from diagnostic text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    FileNotFound,
    CorruptInput,
    UnsupportedCodec,
    Generic,
}

impl FailureKind {
    pub fn description(&self) -> &'static str {
        match self {
            Self::FileNotFound => "input file not found",
            Self::CorruptInput => "input is corrupt or not a media file",
            Self::UnsupportedCodec => "codec or format not supported",
            Self::Generic => "processing failed",
        }
    }
}

const FILE_NOT_FOUND: &[&str] = &["No such file or directory"];
const CORRUPT_INPUT: &[&str] = &[
    "Invalid data found when processing input",
    "moov atom not found",
    "Invalid argument",
];
const UNSUPPORTED_CODEC: &[&str] = &[
    "Unknown encoder",
    "Encoder not found",
    "Decoder not found",
    "not currently supported in container",
    "Unsupported codec",
    "codec not currently supported",
];

/// Classify diagnostic text. The first matching family wins, checked in order.
pub fn classify(diagnostics: &str) -> FailureKind {
    let has = |needles: &[&str]| needles.iter().any(|n| diagnostics.contains(n));
    if has(FILE_NOT_FOUND) {
        FailureKind::FileNotFound
    } else if has(UNSUPPORTED_CODEC) {
        FailureKind::UnsupportedCodec
    } else if has(CORRUPT_INPUT) {
        FailureKind::CorruptInput
    } else {
        FailureKind::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found() {
        assert_eq!(
            classify("/media/missing.mp4: No such file or directory"),
            FailureKind::FileNotFound
        );
    }

    #[test]
    fn corrupt_input() {
        assert_eq!(
            classify("[mov,mp4,m4a,3gp,3g2,mj2 @ 0x1] moov atom not found\nbroken.mp4: Invalid data found when processing input"),
            FailureKind::CorruptInput
        );
    }

    #[test]
    fn unsupported_codec_beats_generic_invalid_argument() {
        assert_eq!(
            classify("Unknown encoder 'libfoo'\nError opening output file: Invalid argument"),
            FailureKind::UnsupportedCodec
        );
    }

    #[test]
    fn anything_else_is_generic() {
        assert_eq!(classify("Conversion failed!"), FailureKind::Generic);
        assert_eq!(classify(""), FailureKind::Generic);
    }
}
