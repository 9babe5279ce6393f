use reelforge_av::{BuilderSettings, EncoderSettings, ToolsConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration. Every section is optional, so an empty file is valid.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub encoding: EncoderSettings,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub assets: AssetsConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory for results (default: next to each input)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetsConfig {
    /// Root for auxiliary models (whisper, rnnoise)
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
        }
    }
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("~/.local/share/reelforge/models")
}

impl Config {
    /// Builder settings with `~` expanded in every path.
    pub fn builder_settings(&self) -> BuilderSettings {
        BuilderSettings {
            encoder: self.encoding.clone(),
            models_dir: expand(&self.assets.models_dir),
            output_dir: self.output.dir.as_deref().map(expand),
            ..Default::default()
        }
    }

    /// Tool overrides with `~` expanded.
    pub fn tools_config(&self) -> ToolsConfig {
        ToolsConfig {
            ffmpeg_path: self.tools.ffmpeg_path.as_deref().map(expand),
            ffprobe_path: self.tools.ffprobe_path.as_deref().map(expand),
        }
    }
}

pub(crate) fn expand(path: &std::path::Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}
