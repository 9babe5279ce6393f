//! Video and audio encoder selection.

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Highest CRF accepted by the x264 family.
pub const MAX_CRF: u32 = 51;

/// Hardware acceleration backends understood by the builder.
pub const HW_ACCEL_BACKENDS: &[&str] = &["videotoolbox", "nvenc", "vaapi", "qsv"];

/// Encoding defaults applied to every re-encoding operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub crf: u32,
    pub preset: String,
    pub audio_bitrate: String,
    /// One of [`HW_ACCEL_BACKENDS`], or `None` / `"none"` for software encoding.
    pub hw_accel: Option<String>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            crf: 23,
            preset: "medium".to_string(),
            audio_bitrate: "192k".to_string(),
            hw_accel: None,
        }
    }
}

/// A resolved video encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoEncoder {
    /// Flags to pass *before* `-i`.
    pub hwaccel_args: Vec<&'static str>,
    pub encoder: &'static str,
    /// Whether the encoder supports CRF-based quality control.
    pub use_crf: bool,
}

/// Map a backend name to its decode flags and H.264 encoder.
pub fn resolve_hw_accel(hw_accel: Option<&str>) -> VideoEncoder {
    let (hwaccel_args, encoder, use_crf) = match hw_accel {
        Some("videotoolbox") => (vec!["-hwaccel", "videotoolbox"], "h264_videotoolbox", false),
        Some("nvenc") => (vec!["-hwaccel", "cuda"], "h264_nvenc", false),
        Some("vaapi") => (
            vec!["-hwaccel", "vaapi", "-hwaccel_output_format", "vaapi"],
            "h264_vaapi",
            false,
        ),
        Some("qsv") => (vec!["-hwaccel", "qsv"], "h264_qsv", false),
        _ => (vec![], "libx264", true),
    };
    VideoEncoder {
        hwaccel_args,
        encoder,
        use_crf,
    }
}

impl EncoderSettings {
    /// Encoder for a pipeline; filtered pipelines stay on the CPU for vaapi
    /// since its frames live in GPU memory.
    pub fn video_encoder(&self, filtered: bool) -> VideoEncoder {
        let backend = self.hw_accel.as_deref();
        if filtered && backend == Some("vaapi") {
            return resolve_hw_accel(None);
        }
        resolve_hw_accel(backend)
    }

    /// `-c:v ...` quality arguments, honoring a per-request CRF/preset override.
    pub fn video_args(
        &self,
        encoder: &VideoEncoder,
        crf: Option<u32>,
        preset: Option<&str>,
    ) -> Result<Vec<String>, BuildError> {
        let crf = crf.unwrap_or(self.crf);
        if crf > MAX_CRF {
            return Err(BuildError::invalid(
                "crf",
                format!("must be between 0 and {MAX_CRF}, got {crf}"),
            ));
        }

        let mut args = vec!["-c:v".to_string(), encoder.encoder.to_string()];
        if encoder.use_crf {
            args.extend([
                "-preset".to_string(),
                preset.unwrap_or(&self.preset).to_string(),
                "-crf".to_string(),
                crf.to_string(),
                "-pix_fmt".to_string(),
                "yuv420p".to_string(),
            ]);
        } else {
            args.extend(["-b:v".to_string(), "6M".to_string()]);
        }
        Ok(args)
    }

    /// AAC at the configured bitrate, for video containers.
    pub fn aac_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn resolve_hw_accel_none() {
        let enc = resolve_hw_accel(None);
        assert!(enc.hwaccel_args.is_empty());
        assert_eq!(enc.encoder, "libx264");
        assert!(enc.use_crf);
    }

    #[test]
    fn resolve_hw_accel_explicit_none() {
        assert_eq!(resolve_hw_accel(Some("none")), resolve_hw_accel(None));
    }

    #[test]
    fn resolve_hw_accel_backends() {
        let enc = resolve_hw_accel(Some("videotoolbox"));
        assert_eq!(enc.hwaccel_args, vec!["-hwaccel", "videotoolbox"]);
        assert_eq!(enc.encoder, "h264_videotoolbox");
        assert!(!enc.use_crf);

        assert_eq!(resolve_hw_accel(Some("nvenc")).hwaccel_args, vec!["-hwaccel", "cuda"]);
        assert_eq!(resolve_hw_accel(Some("qsv")).encoder, "h264_qsv");
        assert_eq!(
            resolve_hw_accel(Some("vaapi")).hwaccel_args,
            vec!["-hwaccel", "vaapi", "-hwaccel_output_format", "vaapi"]
        );
    }

    #[test]
    fn filtered_vaapi_falls_back_to_software() {
        let settings = EncoderSettings {
            hw_accel: Some("vaapi".into()),
            ..Default::default()
        };
        assert_eq!(settings.video_encoder(true).encoder, "libx264");
        assert_eq!(settings.video_encoder(false).encoder, "h264_vaapi");
    }

    #[test]
    fn software_args_use_crf_and_preset() {
        let settings = EncoderSettings::default();
        let args = settings
            .video_args(&settings.video_encoder(false), Some(28), None)
            .unwrap();
        assert_eq!(
            args,
            vec!["-c:v", "libx264", "-preset", "medium", "-crf", "28", "-pix_fmt", "yuv420p"]
        );
    }

    #[test]
    fn hardware_args_use_bitrate() {
        let settings = EncoderSettings {
            hw_accel: Some("nvenc".into()),
            ..Default::default()
        };
        let args = settings.video_args(&settings.video_encoder(true), None, None).unwrap();
        assert_eq!(args, vec!["-c:v", "h264_nvenc", "-b:v", "6M"]);
    }

    #[test]
    fn crf_above_range_is_rejected() {
        let settings = EncoderSettings::default();
        assert_matches!(
            settings.video_args(&settings.video_encoder(false), Some(52), None),
            Err(BuildError::InvalidParameter { field: "crf", .. })
        );
    }
}
