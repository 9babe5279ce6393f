use crate::builder::{Invocation, RecipeContext};
use crate::error::BuildError;
use crate::params::Container;

use super::required;

pub(crate) fn remux(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let container = required(ctx.params.container, "container")?;
    inv.input(ctx.input());
    match container {
        // No text subtitles or attachments in the ISO family.
        Container::Mp4 | Container::Mov => {
            inv.args(["-map", "0:v", "-map", "0:a?", "-c", "copy", "-movflags", "+faststart"]);
        }
        _ => {
            inv.args(["-map", "0", "-c", "copy"]);
        }
    }
    inv.output_arg();
    Ok(())
}

pub(crate) fn compress(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let encoder = ctx.settings.encoder.video_encoder(false);
    inv.args(encoder.hwaccel_args.iter().copied());
    inv.input(ctx.input());
    inv.args(ctx.settings.encoder.video_args(
        &encoder,
        ctx.params.crf,
        ctx.params.preset.as_deref(),
    )?);
    ctx.audio_codec(inv);
    inv.args(["-movflags", "+faststart"]).output_arg();
    Ok(())
}

pub(crate) fn convert_audio(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    required(ctx.params.audio_format, "audio_format")?;
    encode_audio_only(ctx, inv);
    Ok(())
}

pub(crate) fn extract_audio(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    encode_audio_only(ctx, inv);
    Ok(())
}

pub(crate) fn extract_audio_stream(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    inv.input(ctx.input())
        .args(["-vn", "-map", "0:a", "-c:a", "copy"])
        .output_arg();
    Ok(())
}

fn encode_audio_only(ctx: &RecipeContext<'_>, inv: &mut Invocation) {
    let format = ctx.params.audio_format.unwrap_or_default();
    inv.input(ctx.input()).args(["-vn", "-c:a", format.encoder()]);
    if !format.is_lossless() {
        inv.args(["-b:a", ctx.settings.encoder.audio_bitrate.as_str()]);
    }
    inv.output_arg();
}
