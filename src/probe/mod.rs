//! Duration probing via ffprobe.
//!
//! The descriptor is always built from the filesystem first; ffprobe only
//! fills in the duration. A probe that fails or times out leaves the
//! duration absent so duration-dependent operations report missing metadata
//! instead of working from zero.

use std::path::Path;
use std::time::Duration;

use reelforge_av::{Error, ToolRegistry};
use reelforge_common::MediaDescriptor;
use serde::Deserialize;
use tokio::process::Command;

/// Upper bound for one ffprobe call.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Extract `format.duration` from ffprobe's JSON output.
///
/// Returns `None` for unparseable JSON, a missing or non-numeric field, and
/// non-positive values.
pub fn parse_duration(json: &str) -> Option<f64> {
    let output: FfprobeOutput = serde_json::from_str(json).ok()?;
    let seconds: f64 = output.format?.duration?.trim().parse().ok()?;
    (seconds.is_finite() && seconds > 0.0).then_some(seconds)
}

/// Build a descriptor for `path`, probing its duration with ffprobe.
///
/// Errors only when the file itself is unusable (missing or not a media
/// file). Probe problems are logged and yield a descriptor without duration.
pub async fn probe_descriptor(
    tools: &ToolRegistry,
    path: &Path,
) -> reelforge_common::Result<MediaDescriptor> {
    let descriptor = MediaDescriptor::from_path(path)?;

    match probe_duration(tools, path).await {
        Ok(Some(seconds)) => {
            tracing::debug!(path = %path.display(), duration = seconds, "Probed duration");
            Ok(descriptor.with_duration(seconds))
        }
        Ok(None) => {
            tracing::warn!(path = %path.display(), "ffprobe reported no duration");
            Ok(descriptor)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Duration probe failed");
            Ok(descriptor)
        }
    }
}

async fn probe_duration(tools: &ToolRegistry, path: &Path) -> reelforge_av::Result<Option<f64>> {
    let ffprobe = tools.require("ffprobe")?;

    let mut cmd = Command::new(&ffprobe.path);
    cmd.args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .kill_on_drop(true);

    let output = tokio::time::timeout(PROBE_TIMEOUT, cmd.output())
        .await
        .map_err(|_| Error::tool_failed("ffprobe", "timed out"))??;

    if !output.status.success() {
        return Err(Error::tool_failed(
            "ffprobe",
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    Ok(parse_duration(&String::from_utf8_lossy(&output.stdout)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelforge_common::MediaKind;

    #[test]
    fn test_parse_duration() {
        let json = r#"{"format": {"filename": "a.mp4", "duration": "125.480000"}}"#;
        assert_eq!(parse_duration(json), Some(125.48));
    }

    #[test]
    fn test_parse_duration_absent() {
        assert_eq!(parse_duration(r#"{"format": {"filename": "a.mp4"}}"#), None);
        assert_eq!(parse_duration(r#"{}"#), None);
        assert_eq!(parse_duration("not json"), None);
    }

    #[test]
    fn test_parse_duration_rejects_zero_and_garbage() {
        assert_eq!(parse_duration(r#"{"format": {"duration": "0.000000"}}"#), None);
        assert_eq!(parse_duration(r#"{"format": {"duration": "N/A"}}"#), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_descriptor_with_fake_ffprobe() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("ffprobe");
        std::fs::write(
            &script,
            "#!/bin/sh\necho '{\"format\": {\"duration\": \"42.5\"}}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let media = dir.path().join("clip.mp4");
        std::fs::write(&media, b"fake").unwrap();

        let tools = ToolRegistry::default().with_tool("ffprobe", &script);
        let desc = probe_descriptor(&tools, &media).await.unwrap();
        assert_eq!(desc.kind(), MediaKind::Video);
        assert_eq!(desc.size_bytes(), 4);
        assert_eq!(desc.duration(), Some(42.5));
    }

    #[tokio::test]
    async fn test_probe_without_ffprobe_leaves_duration_absent() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("song.mp3");
        std::fs::write(&media, b"fake").unwrap();

        let desc = probe_descriptor(&ToolRegistry::default(), &media)
            .await
            .unwrap();
        assert_eq!(desc.kind(), MediaKind::Audio);
        assert!(desc.duration().is_none());
    }

    #[tokio::test]
    async fn test_probe_missing_file_is_an_error() {
        let result = probe_descriptor(&ToolRegistry::default(), Path::new("/nonexistent/a.mp4")).await;
        assert!(result.is_err());
    }
}
