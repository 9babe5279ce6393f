mod types;

pub use types::*;

use anyhow::{Context, Result};
use reelforge_av::builder::encoder::{HW_ACCEL_BACKENDS, MAX_CRF};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    for warning in validate_config(&config)? {
        tracing::warn!("{}", warning);
    }

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./reelforge.toml",
        "~/.config/reelforge/config.toml",
        "/etc/reelforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration.
///
/// Returns non-fatal warnings; fails only when no operation could succeed.
pub fn validate_config(config: &Config) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if config.encoding.preset.trim().is_empty() {
        anyhow::bail!("encoding.preset cannot be empty");
    }
    if config.encoding.audio_bitrate.trim().is_empty() {
        anyhow::bail!("encoding.audio_bitrate cannot be empty");
    }

    if config.encoding.crf > MAX_CRF {
        warnings.push(format!(
            "encoding.crf {} is above {}; re-encoding operations will be rejected",
            config.encoding.crf, MAX_CRF
        ));
    }

    if let Some(hw) = config.encoding.hw_accel.as_deref() {
        if hw != "none" && !HW_ACCEL_BACKENDS.contains(&hw) {
            warnings.push(format!(
                "Unknown hw_accel '{}', falling back to software encoding (expected one of: {})",
                hw,
                HW_ACCEL_BACKENDS.join(", ")
            ));
        }
    }

    let models_dir = expand(&config.assets.models_dir);
    if !models_dir.is_dir() {
        warnings.push(format!(
            "Models directory does not exist: {:?} (transcribe and clean-voice will fail)",
            models_dir
        ));
    }

    if let Some(dir) = &config.output.dir {
        let dir = expand(dir);
        if !dir.is_dir() {
            warnings.push(format!("Output directory does not exist: {:?}", dir));
        }
    }

    for (name, path) in [
        ("ffmpeg_path", &config.tools.ffmpeg_path),
        ("ffprobe_path", &config.tools.ffprobe_path),
    ] {
        if let Some(p) = path {
            if !expand(p).exists() {
                warnings.push(format!("tools.{} does not exist: {:?}", name, p));
            }
        }
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.encoding.crf, 23);
        assert_eq!(config.encoding.preset, "medium");
        assert_eq!(config.encoding.audio_bitrate, "192k");
        assert!(config.encoding.hw_accel.is_none());
        assert!(config.output.dir.is_none());
        assert!(config.assets.models_dir.ends_with("reelforge/models"));
    }

    #[test]
    fn sections_are_parsed() {
        let file = write_config(
            r#"
[tools]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"

[encoding]
crf = 28
preset = "fast"
hw_accel = "nvenc"

[output]
dir = "/tmp/out"

[assets]
models_dir = "/srv/models"
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(
            config.tools.ffmpeg_path.as_deref(),
            Some(Path::new("/opt/ffmpeg/bin/ffmpeg"))
        );
        assert_eq!(config.encoding.crf, 28);
        assert_eq!(config.encoding.preset, "fast");
        assert_eq!(config.encoding.audio_bitrate, "192k");
        assert_eq!(config.encoding.hw_accel.as_deref(), Some("nvenc"));

        let settings = config.builder_settings();
        assert_eq!(settings.output_dir.as_deref(), Some(Path::new("/tmp/out")));
        assert_eq!(settings.models_dir, Path::new("/srv/models"));
        assert_eq!(settings.encoder.crf, 28);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let file = write_config("[encoding\ncrf = ");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn empty_preset_is_fatal() {
        let file = write_config("[encoding]\npreset = \"\"\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn suspicious_values_are_warnings() {
        let mut config = Config::default();
        config.encoding.crf = 60;
        config.encoding.hw_accel = Some("quantum".into());
        config.assets.models_dir = "/nonexistent/models".into();

        let warnings = validate_config(&config).unwrap();
        assert!(warnings.iter().any(|w| w.contains("crf")));
        assert!(warnings.iter().any(|w| w.contains("quantum")));
        assert!(warnings.iter().any(|w| w.contains("Models directory")));
    }

    #[test]
    fn explicit_none_backend_is_accepted() {
        let mut config = Config::default();
        config.encoding.hw_accel = Some("none".into());
        let warnings = validate_config(&config).unwrap();
        assert!(!warnings.iter().any(|w| w.contains("hw_accel")));
    }

    #[test]
    fn tilde_is_expanded_in_settings() {
        let config = Config::default();
        let settings = config.builder_settings();
        assert!(!settings.models_dir.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn missing_custom_path_is_an_error() {
        assert!(load_config_or_default(Some(Path::new("/nonexistent/reelforge.toml"))).is_err());
    }
}
