//! Argument Builder: turns an operation request into an [`Invocation`].
//!
//! Building is pure apart from two filesystem queries: asset presence and
//! output-name collisions. Checks run in a fixed order (input kind, secondary
//! input, asset, output extension) before the per-kind recipe validates its
//! own parameters.

pub mod derive;
pub mod encoder;
pub mod filters;
mod invocation;
pub mod naming;
mod recipes;
pub mod tempo;

use std::path::{Path, PathBuf};

use reelforge_common::{MediaDescriptor, MediaKind};

use crate::error::BuildError;
use crate::operation::{OperationKind, OperationSpec, OutputExt};
use crate::params::OperationParameters;

pub use encoder::{EncoderSettings, VideoEncoder};
pub use invocation::{Invocation, StagedFile};

/// Containers a re-encoded video can keep.
const ENCODABLE_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "m4v"];
/// Containers a re-encoded audio file can keep.
const ENCODABLE_AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "wav", "flac", "ogg", "opus", "mka"];

/// Settings shared by every build.
#[derive(Debug, Clone)]
pub struct BuilderSettings {
    pub encoder: EncoderSettings,
    /// Root for auxiliary model files.
    pub models_dir: PathBuf,
    /// Output directory; the input's directory when `None`.
    pub output_dir: Option<PathBuf>,
    /// Where staged files such as concat lists are written.
    pub staging_dir: PathBuf,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            encoder: EncoderSettings::default(),
            models_dir: PathBuf::from("models"),
            output_dir: None,
            staging_dir: std::env::temp_dir(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArgumentBuilder {
    settings: BuilderSettings,
}

/// Everything a recipe needs to render its arguments.
pub(crate) struct RecipeContext<'a> {
    pub kind: OperationKind,
    pub descriptor: &'a MediaDescriptor,
    pub params: &'a OperationParameters,
    pub settings: &'a BuilderSettings,
    pub asset: Option<PathBuf>,
}

impl RecipeContext<'_> {
    pub fn input(&self) -> &Path {
        self.descriptor.path()
    }

    pub fn is_video(&self) -> bool {
        self.descriptor.is_video()
    }

    pub fn secondary(&self) -> Result<&Path, BuildError> {
        self.params
            .secondary
            .as_deref()
            .ok_or(BuildError::MissingSecondaryInput)
    }

    pub fn asset(&self) -> Result<&Path, BuildError> {
        self.asset.as_deref().ok_or_else(|| {
            BuildError::invalid("asset", format!("{} has no associated asset", self.kind))
        })
    }

    /// Video encoder arguments for a re-encoding recipe.
    pub fn video_codec(&self, inv: &mut Invocation, filtered: bool) -> Result<(), BuildError> {
        let encoder = self.settings.encoder.video_encoder(filtered);
        inv.args(self.settings.encoder.video_args(
            &encoder,
            self.params.crf,
            self.params.preset.as_deref(),
        )?);
        Ok(())
    }

    /// Audio encoder arguments matching the output container.
    pub fn audio_codec(&self, inv: &mut Invocation) {
        if self.is_video() {
            inv.args(self.settings.encoder.aac_args());
        } else if !is_lossless_ext(inv.output()) {
            inv.args(["-b:a", self.settings.encoder.audio_bitrate.as_str()]);
        }
    }
}

fn is_lossless_ext(output: &Path) -> bool {
    output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "wav" | "flac"))
}

impl ArgumentBuilder {
    pub fn new(settings: BuilderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Build the invocation for `kind` applied to `descriptor`.
    pub fn build(
        &self,
        kind: OperationKind,
        descriptor: &MediaDescriptor,
        params: &OperationParameters,
    ) -> Result<Invocation, BuildError> {
        let spec = kind.spec();

        if !spec.inputs.accepts(descriptor.kind()) {
            return Err(BuildError::invalid(
                "input",
                format!("{kind} does not accept {} input", descriptor.kind()),
            ));
        }
        if spec.requires_secondary_input && !has_secondary(kind, params) {
            return Err(BuildError::MissingSecondaryInput);
        }
        let asset = spec.asset.map(|rel| self.require_asset(rel)).transpose()?;

        let ext = output_extension(spec, descriptor, params)?;
        let dir = self.output_dir_for(descriptor);
        let output =
            naming::resolve_output(&dir, &descriptor.stem(), spec.output_suffix, spec.numbered, &ext);

        let mut inv = Invocation::new(output);
        inv.args(["-hide_banner", "-nostdin", "-y"])
            .set_numbered(spec.numbered.is_some())
            .set_progress_duration(descriptor.duration());

        let ctx = RecipeContext {
            kind,
            descriptor,
            params,
            settings: &self.settings,
            asset,
        };
        dispatch(&ctx, &mut inv)?;

        tracing::debug!(
            kind = %kind,
            input = %descriptor.path().display(),
            output = %inv.output().display(),
            "built invocation"
        );
        Ok(inv)
    }

    fn require_asset(&self, relative: &str) -> Result<PathBuf, BuildError> {
        let path = self.settings.models_dir.join(relative);
        if path.is_file() {
            Ok(path)
        } else {
            Err(BuildError::missing_asset(path))
        }
    }

    fn output_dir_for(&self, descriptor: &MediaDescriptor) -> PathBuf {
        if let Some(dir) = &self.settings.output_dir {
            return dir.clone();
        }
        descriptor
            .path()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn has_secondary(kind: OperationKind, params: &OperationParameters) -> bool {
    match kind {
        OperationKind::Merge => !params.clips.is_empty(),
        _ => params.secondary.is_some(),
    }
}

fn output_extension(
    spec: &OperationSpec,
    descriptor: &MediaDescriptor,
    params: &OperationParameters,
) -> Result<String, BuildError> {
    let source = descriptor.extension();
    let ext = match spec.output_ext {
        OutputExt::Fixed(ext) => ext.to_string(),
        OutputExt::Container => params
            .container
            .ok_or_else(|| BuildError::required("container"))?
            .extension()
            .to_string(),
        OutputExt::AudioFormat => params.audio_format.unwrap_or_default().extension().to_string(),
        OutputExt::Source => source.unwrap_or_else(|| fallback_ext(descriptor.kind()).to_string()),
        OutputExt::Encoded => {
            let keep = match descriptor.kind() {
                MediaKind::Video => ENCODABLE_VIDEO_EXTENSIONS,
                MediaKind::Audio => ENCODABLE_AUDIO_EXTENSIONS,
            };
            source
                .filter(|e| keep.contains(&e.as_str()))
                .unwrap_or_else(|| fallback_ext(descriptor.kind()).to_string())
        }
    };
    Ok(ext)
}

fn fallback_ext(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Video => "mp4",
        MediaKind::Audio => "m4a",
    }
}

fn dispatch(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    use recipes::{audio, compose, convert, export, timeline, video};

    match ctx.kind {
        OperationKind::Remux => convert::remux(ctx, inv),
        OperationKind::Compress => convert::compress(ctx, inv),
        OperationKind::ConvertAudio => convert::convert_audio(ctx, inv),
        OperationKind::ExtractAudio => convert::extract_audio(ctx, inv),
        OperationKind::ExtractAudioStream => convert::extract_audio_stream(ctx, inv),
        OperationKind::Trim => timeline::trim(ctx, inv),
        OperationKind::SplitParts => timeline::split_parts(ctx, inv),
        OperationKind::SplitSize => timeline::split_size(ctx, inv),
        OperationKind::Merge => timeline::merge(ctx, inv),
        OperationKind::Loop => timeline::repeat(ctx, inv),
        OperationKind::Reverse => timeline::reverse(ctx, inv),
        OperationKind::Speed => timeline::speed(ctx, inv),
        OperationKind::FitDuration => timeline::fit_duration(ctx, inv),
        OperationKind::Summary => timeline::summary(ctx, inv),
        OperationKind::Resize => video::resize(ctx, inv),
        OperationKind::VerticalCrop => video::vertical_crop(ctx, inv),
        OperationKind::Rotate => video::rotate(ctx, inv),
        OperationKind::Flip => video::flip(ctx, inv),
        OperationKind::Denoise => video::denoise(ctx, inv),
        OperationKind::Watermark => video::watermark(ctx, inv),
        OperationKind::Fade => video::fade(ctx, inv),
        OperationKind::RemoveAudio => audio::remove(ctx, inv),
        OperationKind::ReplaceAudio => audio::replace(ctx, inv),
        OperationKind::MixAudio => audio::mix(ctx, inv),
        OperationKind::NormalizeAudio => audio::normalize(ctx, inv),
        OperationKind::Volume => audio::volume(ctx, inv),
        OperationKind::CleanVoice => audio::clean_voice(ctx, inv),
        OperationKind::BurnSubtitles => compose::burn_subtitles(ctx, inv),
        OperationKind::PictureInPicture => compose::picture_in_picture(ctx, inv),
        OperationKind::Gif => export::gif(ctx, inv),
        OperationKind::ContactSheet => export::contact_sheet(ctx, inv),
        OperationKind::FramesCount => export::frames_count(ctx, inv),
        OperationKind::FramesInterval => export::frames_interval(ctx, inv),
        OperationKind::Thumbnail => export::thumbnail(ctx, inv),
        OperationKind::Waveform => export::waveform(ctx, inv),
        OperationKind::Transcribe => export::transcribe(ctx, inv),
    }
}
