//! The builder's output: an argument list plus the resolved output path.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// A file the runner writes before spawning and removes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// A fully resolved external-tool invocation.
///
/// Arguments are kept in order; flags that must precede an input (seek,
/// stream loop, hardware decode) are pushed before that input by the recipe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    args: Vec<String>,
    output: PathBuf,
    numbered: bool,
    staged: Vec<StagedFile>,
    progress_duration: Option<f64>,
}

impl Invocation {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            args: Vec::new(),
            output: output.into(),
            numbered: false,
            staged: Vec::new(),
            progress_duration: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Append `-i <path>`.
    pub fn input(&mut self, path: &Path) -> &mut Self {
        self.arg("-i").arg(path.to_string_lossy())
    }

    /// Append the output path as the final positional argument.
    ///
    /// Single still images get `-update 1` so the image muxer writes the
    /// path literally instead of reading `%` as a sequence pattern.
    pub fn output_arg(&mut self) -> &mut Self {
        if !self.numbered && is_still_image(&self.output) {
            self.args(["-update", "1"]);
        }
        let out = self.output.to_string_lossy().into_owned();
        self.arg(out)
    }

    pub fn stage(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> &mut Self {
        self.staged.push(StagedFile {
            path: path.into(),
            contents: contents.into(),
        });
        self
    }

    pub fn set_numbered(&mut self, numbered: bool) -> &mut Self {
        self.numbered = numbered;
        self
    }

    /// Duration of the output timeline, used to turn time markers into fractions.
    pub fn set_progress_duration(&mut self, duration: Option<f64>) -> &mut Self {
        self.progress_duration = duration.filter(|d| d.is_finite() && *d > 0.0);
        self
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// The output path, or the printf-style template for numbered outputs.
    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn is_numbered(&self) -> bool {
        self.numbered
    }

    pub fn staged_files(&self) -> &[StagedFile] {
        &self.staged
    }

    pub fn progress_duration(&self) -> Option<f64> {
        self.progress_duration
    }

    /// Whether `flag` appears before the first `-i`.
    pub fn has_flag_before_input(&self, flag: &str) -> bool {
        self.args
            .iter()
            .take_while(|a| a.as_str() != "-i")
            .any(|a| a == flag)
    }

    /// The value following the first occurrence of `flag`.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Render as a single shell-quoted line for display.
    pub fn display_line(&self, program: &str) -> String {
        std::iter::once(program)
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn is_still_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            matches!(
                e.to_ascii_lowercase().as_str(),
                "jpg" | "jpeg" | "png" | "bmp" | "webp" | "tif" | "tiff"
            )
        })
}

fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=%+,@".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
