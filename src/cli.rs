use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use reelforge_av::OperationParameters;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reelforge")]
#[command(author, version, about = "Batch media transformations on top of ffmpeg")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the available operations
    Operations {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the ffmpeg command for an operation without running it
    Plan {
        #[command(flatten)]
        op: OperationArgs,

        /// Duration in seconds, overriding the probed value
        #[arg(long)]
        duration: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Input file
        #[arg(required = true)]
        input: PathBuf,
    },

    /// Apply one operation to each input, one file at a time
    Run {
        #[command(flatten)]
        op: OperationArgs,

        /// Input files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Run a TOML job file
    Batch {
        /// Job file with [[items]] entries
        #[arg(required = true)]
        job: PathBuf,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

/// Operation selection shared by `plan` and `run`.
#[derive(Args, Debug, Clone)]
pub struct OperationArgs {
    /// Operation id (see `reelforge operations`)
    #[arg(long = "op", value_name = "ID")]
    pub operation: String,

    /// Secondary input: audio track, subtitle file or overlay video
    #[arg(long, value_name = "PATH")]
    pub secondary: Option<PathBuf>,

    /// Additional clip for merge (repeatable)
    #[arg(long = "clip", value_name = "PATH")]
    pub clips: Vec<PathBuf>,

    /// Operation parameter, e.g. `--set start=5 --set text="Draft"` (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub set: Vec<(String, String)>,
}

impl OperationArgs {
    /// Assemble the parameter bag from `--set`, `--secondary` and `--clip`.
    pub fn parameters(&self) -> Result<OperationParameters> {
        let mut table = toml::Table::new();
        for (key, raw) in &self.set {
            table.insert(key.replace('-', "_"), parse_value(raw));
        }

        let mut params: OperationParameters = toml::Value::Table(table)
            .try_into()
            .context("Invalid --set parameter")?;

        if let Some(secondary) = &self.secondary {
            params.secondary = Some(secondary.clone());
        }
        params.clips.extend(self.clips.iter().cloned());
        Ok(params)
    }
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Numbers and booleans keep their type; anything else is a string.
fn parse_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .filter(|v| !matches!(v, toml::Value::Table(_) | toml::Value::Array(_)))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelforge_av::{Container, Corner};

    fn args(set: &[&str]) -> OperationArgs {
        OperationArgs {
            operation: "trim".into(),
            secondary: None,
            clips: Vec::new(),
            set: set.iter().map(|s| parse_key_value(s).unwrap()).collect(),
        }
    }

    #[test]
    fn test_set_values_are_typed() {
        let params = args(&["start=5", "end=12.5", "crf=20", "container=mkv", "position=top-left"])
            .parameters()
            .unwrap();
        assert_eq!(params.start, Some(5.0));
        assert_eq!(params.end, Some(12.5));
        assert_eq!(params.crf, Some(20));
        assert_eq!(params.container, Some(Container::Mkv));
        assert_eq!(params.position, Some(Corner::TopLeft));
    }

    #[test]
    fn test_text_with_spaces_and_dashed_keys() {
        let params = args(&["text=Draft copy", "font-size=48"]).parameters().unwrap();
        assert_eq!(params.text.as_deref(), Some("Draft copy"));
        assert_eq!(params.font_size, Some(48));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(args(&["strat=1"]).parameters().is_err());
    }

    #[test]
    fn test_secondary_and_clips() {
        let mut a = args(&[]);
        a.secondary = Some("voice.m4a".into());
        a.clips = vec!["b.mp4".into(), "c.mp4".into()];
        let params = a.parameters().unwrap();
        assert_eq!(params.secondary, Some(PathBuf::from("voice.m4a")));
        assert_eq!(params.clips.len(), 2);
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("text=a=b").unwrap(),
            ("text".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=1").is_err());
    }
}
